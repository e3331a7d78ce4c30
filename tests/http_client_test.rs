use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::post;
use chrono::NaiveDate;
use course_scheduler::api::router;
use course_scheduler::client::{
    HttpScheduleService, ScheduleService, ServiceConfig, StubScheduleService,
};
use course_scheduler::error::AppError;
use course_scheduler::models::{CalendarSubmission, DayOfWeek, Quarter, ScheduleRequest, TimeOfDay};
use course_scheduler::services::{NotificationLog, ScheduleController};
use course_scheduler::state::AppState;

async fn spawn(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Failed to read local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Test server failed");
    });
    addr
}

async fn spawn_stub_backend() -> SocketAddr {
    let state = AppState {
        service: Arc::new(StubScheduleService::with_anchor(
            NaiveDate::from_ymd_opt(2025, 1, 6).unwrap(),
        )),
    };
    spawn(router(state)).await
}

fn client_for(addr: SocketAddr) -> HttpScheduleService {
    HttpScheduleService::new(ServiceConfig::new(format!("http://{}", addr)))
        .expect("Failed to create http client")
}

fn request() -> ScheduleRequest {
    ScheduleRequest {
        courses: vec!["CS 101".to_string(), "MATH 20".to_string()],
        quarter: Quarter::Fall,
        days_of_week: vec![DayOfWeek::Mw],
        time_preference: TimeOfDay::Morning,
        teacher_preference: "Explains things slowly".to_string(),
    }
}

#[tokio::test]
async fn generates_and_submits_through_stub_backend() {
    let addr = spawn_stub_backend().await;
    let client = client_for(addr);

    let result = client.generate(&request()).await.expect("generate failed");
    assert_eq!(result.recommendations.len(), 2);
    let option = &result.recommendations[0];
    assert_eq!(option.schedule.len(), 2);
    assert_eq!(option.schedule[0].summary, "CS 101");
    assert_eq!(option.schedule[0].start.as_deref(), Some("2025-01-06T09:00:00"));
    assert!(option.pros.iter().any(|p| p.contains("Explains things slowly")));

    let submission = CalendarSubmission::new(option.schedule.clone());
    client.submit(&submission).await.expect("submit failed");
}

#[tokio::test]
async fn backend_rejection_surfaces_message() {
    let addr = spawn_stub_backend().await;
    let client = client_for(addr);

    let err = client
        .submit(&CalendarSubmission::new(Vec::new()))
        .await
        .unwrap_err();

    match err {
        AppError::Rejected(Some(message)) => assert_eq!(message, "Schedule is empty"),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn in_band_failure_is_read_regardless_of_status() {
    let app = Router::new().route(
        "/api/generate-schedule",
        post(|| async {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(serde_json::json!({ "success": false, "error": "no rooms" })),
            )
        }),
    );
    let client = client_for(spawn(app).await);

    let err = client.generate(&request()).await.unwrap_err();

    assert!(matches!(err, AppError::Rejected(Some(ref m)) if m == "no rooms"));
}

#[tokio::test]
async fn success_without_data_is_an_empty_result() {
    let app = Router::new().route(
        "/api/generate-schedule",
        post(|| async { axum::Json(serde_json::json!({ "success": true })) }),
    );
    let client = client_for(spawn(app).await);

    let result = client.generate(&request()).await.expect("generate failed");
    assert!(result.is_empty());
}

#[tokio::test]
async fn null_fields_in_recommendations_are_not_a_failure() {
    let app = Router::new().route(
        "/api/generate-schedule",
        post(|| async {
            axum::Json(serde_json::json!({
                "success": true,
                "data": { "recommendations": [{
                    "schedule": [{
                        "summary": "CS 101",
                        "description": null,
                        "location": null,
                        "start": null
                    }],
                    "pros": null,
                    "cons": null
                }] }
            }))
        }),
    );
    let addr = spawn(app).await;

    let result = client_for(addr)
        .generate(&request())
        .await
        .expect("generate failed");
    let option = &result.recommendations[0];
    assert!(option.pros.is_empty());
    assert!(option.cons.is_empty());
    assert_eq!(option.schedule[0].description, "");
    assert_eq!(option.schedule[0].location, None);

    let log = Arc::new(NotificationLog::new());
    let controller = ScheduleController::new(
        Arc::new(client_for(addr)),
        Arc::new(|_: &str| true),
        log.clone(),
    );
    controller.update_course(0, "CS 101").unwrap();
    controller.set_quarter(Some(Quarter::Fall));
    controller.set_day_of_week(Some(DayOfWeek::Mw));
    controller.set_time_of_day(Some(TimeOfDay::Morning));

    assert_eq!(controller.generate_schedule().await.unwrap(), 1);
    assert!(log.errors().is_empty());
}

#[tokio::test]
async fn non_json_body_is_a_transport_error() {
    let app = Router::new().route(
        "/api/add-to-calendar",
        post(|| async { "<html>Bad Gateway</html>" }),
    );
    let client = client_for(spawn(app).await);

    let err = client
        .submit(&CalendarSubmission::new(Vec::new()))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Decode(_)));
    assert!(err.is_transport());
}

#[tokio::test]
async fn unreachable_backend_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = client_for(addr);

    let err = client.generate(&request()).await.unwrap_err();

    assert!(matches!(err, AppError::Http(_)));
    assert!(err.is_transport());
}

#[tokio::test]
async fn controller_round_trip_over_http() {
    let addr = spawn_stub_backend().await;
    let log = Arc::new(NotificationLog::new());
    let controller = ScheduleController::new(
        Arc::new(client_for(addr)),
        Arc::new(|_: &str| true),
        log.clone(),
    );
    controller.update_course(0, "CS 101").unwrap();
    controller.update_course(3, "PHYS 7A").unwrap();
    controller.set_quarter(Some(Quarter::Winter));
    controller.set_day_of_week(Some(DayOfWeek::Tth));
    controller.set_time_of_day(Some(TimeOfDay::Evening));

    assert_eq!(controller.generate_schedule().await.unwrap(), 2);
    controller.select_option(1).unwrap();
    let confirmation = controller.submit_to_calendar().await.unwrap();

    assert_eq!(confirmation.course_names, vec!["CS 101", "PHYS 7A"]);
    assert_eq!(confirmation.day_of_week, Some(DayOfWeek::Tth));
    assert!(log.errors().is_empty());
}
