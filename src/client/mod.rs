pub mod dto;
pub mod stub;

use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info};

use crate::error::AppError;
use crate::models::{CalendarSubmission, ScheduleRequest, ScheduleResult};

pub use stub::StubScheduleService;

pub const GENERATE_PATH: &str = "/api/generate-schedule";
pub const CALENDAR_PATH: &str = "/api/add-to-calendar";

#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub base_url: String,
    pub use_stub: bool,
}

impl ServiceConfig {
    pub const DEFAULT_BASE_URL: &'static str = "http://127.0.0.1:5001";

    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            use_stub: false,
        }
    }

    pub fn new_from_env() -> Result<Self, AppError> {
        let base_url = env::var("SCHEDULER_API_URL")
            .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_string());
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::Config(format!(
                "SCHEDULER_API_URL must be an http(s) URL, got '{}'",
                base_url
            )));
        }

        let use_stub = match env::var("SCHEDULER_USE_STUB") {
            Ok(value) => parse_flag(&value).ok_or_else(|| {
                AppError::Config(format!("SCHEDULER_USE_STUB must be true or false, got '{}'", value))
            })?,
            Err(_) => false,
        };

        Ok(Self { base_url, use_stub })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "" | "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// The external scheduler: candidate generation and calendar submission.
#[async_trait]
pub trait ScheduleService: Send + Sync {
    async fn generate(&self, request: &ScheduleRequest) -> Result<ScheduleResult, AppError>;
    async fn submit(&self, submission: &CalendarSubmission) -> Result<(), AppError>;
}

pub struct HttpScheduleService {
    client: Client,
    config: ServiceConfig,
}

impl HttpScheduleService {
    pub fn new(config: ServiceConfig) -> Result<Self, AppError> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Single POST attempt. The envelope is read whatever the HTTP status,
    /// since the backend reports failures in-band.
    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<dto::ApiResponse<T>, AppError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let url = self.endpoint(path);
        info!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let body_text = response.text().await?;
        debug!("response from {}: {} - {}", url, status, body_text);

        serde_json::from_str::<dto::ApiResponse<T>>(&body_text).map_err(|e| {
            debug!("failed to parse response from {}: {}", url, e);
            AppError::Decode(format!("{} from {}: {}", status, url, e))
        })
    }
}

#[async_trait]
impl ScheduleService for HttpScheduleService {
    async fn generate(&self, request: &ScheduleRequest) -> Result<ScheduleResult, AppError> {
        let response = self
            .post_json::<_, ScheduleResult>(GENERATE_PATH, request)
            .await?;
        Ok(response.into_result()?.unwrap_or_default())
    }

    async fn submit(&self, submission: &CalendarSubmission) -> Result<(), AppError> {
        self.post_json::<_, serde_json::Value>(CALENDAR_PATH, submission)
            .await?
            .into_result()?;
        Ok(())
    }
}
