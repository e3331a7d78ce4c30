use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use course_scheduler::api::router;
use course_scheduler::cli::{self, StdinConfirm, StdinLines, TerminalNotifier};
use course_scheduler::client::{HttpScheduleService, ScheduleService, ServiceConfig, StubScheduleService};
use course_scheduler::error::AppError;
use course_scheduler::services::ScheduleController;
use course_scheduler::state::AppState;

const USAGE: &str = "usage: course-scheduler [run | serve-stub]";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "course_scheduler=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match std::env::args().nth(1).as_deref() {
        None | Some("run") => run_interactive().await,
        Some("serve-stub") => serve_stub().await,
        Some(other) => Err(format!("unknown command '{}'\n{}", other, USAGE).into()),
    }
}

async fn run_interactive() -> Result<(), Box<dyn std::error::Error>> {
    let config = ServiceConfig::new_from_env()?;

    let service: Arc<dyn ScheduleService> = if config.use_stub {
        info!("using stub scheduling service");
        Arc::new(StubScheduleService::new())
    } else {
        info!("using scheduling API at {}", config.base_url);
        Arc::new(HttpScheduleService::new(config)?)
    };

    let controller = ScheduleController::new(service, Arc::new(StdinConfirm), Arc::new(TerminalNotifier));
    cli::run_session(&controller, StdinLines, std::io::stdout()).await?;

    Ok(())
}

async fn serve_stub() -> Result<(), Box<dyn std::error::Error>> {
    let addr: SocketAddr = std::env::var("STUB_ADDR")
        .unwrap_or_else(|_| "127.0.0.1:5001".to_string())
        .parse()
        .map_err(|e| AppError::Config(format!("STUB_ADDR is not a socket address: {}", e)))?;

    let state = AppState {
        service: Arc::new(StubScheduleService::new()),
    };

    let app = router(state);

    info!("stub scheduling backend listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
