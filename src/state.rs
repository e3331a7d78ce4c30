use std::sync::Arc;

use crate::client::ScheduleService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<dyn ScheduleService>,
}
