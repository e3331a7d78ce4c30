use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use crate::client::ScheduleService;
use crate::error::AppError;
use crate::models::{
    CalendarSubmission, DayOfWeek, FormState, Placement, Quarter, ScheduleResult,
    SubmittedConfirmation, TimeOfDay,
};
use crate::services::notify::{
    CALENDAR_CHANNEL, ConfirmPrompt, GENERATE_CHANNEL, Notification, Notifier,
};

pub const REDO_PROMPT: &str = "Starting Fresh\n\n\
    This will clear all your current entries.\n\n\
    Consider:\n  \
    - Want to add a different course?\n  \
    - Need to change the schedule?\n  \
    - Want to update professor information?\n\n\
    Ready to start over?";

const GENERATE_CONNECT_MESSAGE: &str =
    "Failed to connect to backend. Make sure the API is running.";
const CALENDAR_CONNECT_MESSAGE: &str = "Failed to connect to backend.";

/// Everything the form displays: field values, held candidates and the
/// busy flags of the two remote operations.
#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub form: FormState,
    pub results: Option<ScheduleResult>,
    pub selected: Option<usize>,
    pub submitted: Option<SubmittedConfirmation>,
    pub generating: bool,
    pub submitting: bool,
}

#[derive(Debug, Clone, Copy)]
enum Operation {
    Generate,
    Submit,
}

impl Operation {
    fn flag(self, state: &mut ViewState) -> &mut bool {
        match self {
            Operation::Generate => &mut state.generating,
            Operation::Submit => &mut state.submitting,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Operation::Generate => "Schedule generation",
            Operation::Submit => "Calendar submission",
        }
    }
}

/// Clears the operation's busy flag when dropped, whichever way the
/// operation ends.
struct BusyGuard<'a> {
    state: &'a Mutex<ViewState>,
    operation: Operation,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        *self.operation.flag(&mut state) = false;
    }
}

/// Owns the scheduling form and drives the two remote round-trips.
///
/// The state lock is never held across an `.await`: remote operations
/// snapshot their input, release the lock while the service works, and apply
/// the outcome to the form as it is when the response arrives.
pub struct ScheduleController {
    service: Arc<dyn ScheduleService>,
    confirm: Arc<dyn ConfirmPrompt>,
    notifier: Arc<dyn Notifier>,
    state: Mutex<ViewState>,
}

impl ScheduleController {
    pub fn new(
        service: Arc<dyn ScheduleService>,
        confirm: Arc<dyn ConfirmPrompt>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            service,
            confirm,
            notifier,
            state: Mutex::new(ViewState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> ViewState {
        self.state().clone()
    }

    pub fn form(&self) -> FormState {
        self.state().form.clone()
    }

    pub fn results(&self) -> Option<ScheduleResult> {
        self.state().results.clone()
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.state().selected
    }

    pub fn submitted(&self) -> Option<SubmittedConfirmation> {
        self.state().submitted.clone()
    }

    pub fn is_generating(&self) -> bool {
        self.state().generating
    }

    pub fn is_submitting(&self) -> bool {
        self.state().submitting
    }

    pub fn add_course(&self) {
        self.state().form.add_course_slot();
    }

    pub fn remove_course(&self, index: usize) -> bool {
        self.state().form.remove_course_slot(index)
    }

    pub fn update_course(&self, index: usize, value: impl Into<String>) -> Result<(), AppError> {
        let result = self.state().form.set_course_name(index, value);
        result.map_err(|e| self.report_invalid(e))
    }

    pub fn set_quarter(&self, quarter: Option<Quarter>) {
        self.state().form.quarter = quarter;
    }

    pub fn set_day_of_week(&self, day: Option<DayOfWeek>) {
        self.state().form.day_of_week = day;
    }

    pub fn set_time_of_day(&self, time: Option<TimeOfDay>) {
        self.state().form.time_of_day = time;
    }

    pub fn set_professor_preferences(&self, text: impl Into<String>) {
        self.state().form.professor_preferences = text.into();
    }

    /// Asks before clearing the form, held candidates and confirmation.
    /// Returns whether the form was cleared.
    pub fn reset_form(&self) -> bool {
        if !self.confirm.confirm(REDO_PROMPT) {
            debug!("reset declined");
            return false;
        }

        {
            let mut state = self.state();
            state.form = FormState::default();
            state.results = None;
            state.selected = None;
            state.submitted = None;
        }

        info!("form cleared");
        self.notifier.notify(Notification::success(
            None,
            "Form cleared! You can now add a new course.",
        ));
        true
    }

    pub fn select_option(&self, index: usize) -> Result<(), AppError> {
        let outcome = {
            let mut state = self.state();
            let count = state.results.as_ref().map_or(0, ScheduleResult::len);
            if index < count {
                state.selected = Some(index);
                Ok(())
            } else {
                Err(AppError::Validation(format!(
                    "Schedule option {} does not exist",
                    index + 1
                )))
            }
        };
        outcome.map_err(|e| self.report_invalid(e))
    }

    /// Validates the form and asks the service for candidate schedules.
    /// On success the candidates replace any held ones and the first is
    /// selected; returns the number of candidates.
    pub async fn generate_schedule(&self) -> Result<usize, AppError> {
        let (request, _busy) = {
            let mut state = self.state();
            let request = match state.form.to_request() {
                Ok(request) => request,
                Err(e) => {
                    drop(state);
                    return Err(self.report_invalid(e));
                }
            };
            let busy = self.acquire(&mut state, Operation::Generate)?;
            (request, busy)
        };

        self.notifier.notify(Notification::loading(
            GENERATE_CHANNEL,
            "Generating your schedule...",
        ));
        info!(
            "generating schedule for {} course(s), {} quarter",
            request.courses.len(),
            request.quarter.as_str()
        );

        match self.service.generate(&request).await {
            Ok(result) => {
                let count = result.len();
                {
                    let mut state = self.state();
                    state.selected = (count > 0).then_some(0);
                    state.results = Some(result);
                }
                info!("received {} schedule option(s)", count);
                self.notifier.notify(Notification::success(
                    Some(GENERATE_CHANNEL),
                    "Schedule generated successfully!",
                ));
                Ok(count)
            }
            Err(e) => Err(self.report_failure(
                GENERATE_CHANNEL,
                "Failed to generate schedule",
                GENERATE_CONNECT_MESSAGE,
                e,
            )),
        }
    }

    /// Sends the selected candidate's placements to the calendar. On success
    /// the form as it stands when the response arrives is recorded as the
    /// submitted confirmation.
    pub async fn submit_to_calendar(&self) -> Result<SubmittedConfirmation, AppError> {
        let (submission, _busy) = {
            let mut state = self.state();
            let placements = match selected_placements(&state) {
                Ok(placements) => placements,
                Err(e) => {
                    drop(state);
                    return Err(self.report_invalid(e));
                }
            };
            let busy = self.acquire(&mut state, Operation::Submit)?;
            (CalendarSubmission::new(placements), busy)
        };

        self.notifier.notify(Notification::loading(
            CALENDAR_CHANNEL,
            "Adding to Google Calendar...",
        ));
        info!(
            "submitting {} placement(s) to calendar '{}'",
            submission.schedule.len(),
            submission.calendar_name
        );

        match self.service.submit(&submission).await {
            Ok(()) => {
                let confirmation = {
                    let mut state = self.state();
                    let confirmation = SubmittedConfirmation::from(&state.form);
                    state.submitted = Some(confirmation.clone());
                    confirmation
                };
                info!("schedule added to calendar");
                self.notifier.notify(Notification::success(
                    Some(CALENDAR_CHANNEL),
                    "Schedule added to Google Calendar!",
                ));
                Ok(confirmation)
            }
            Err(e) => Err(self.report_failure(
                CALENDAR_CHANNEL,
                "Failed to add to calendar",
                CALENDAR_CONNECT_MESSAGE,
                e,
            )),
        }
    }

    fn acquire<'a>(
        &'a self,
        state: &mut ViewState,
        operation: Operation,
    ) -> Result<BusyGuard<'a>, AppError> {
        let flag = operation.flag(state);
        if *flag {
            debug!("{} requested while pending", operation.label());
            return Err(AppError::Busy(operation.label()));
        }
        *flag = true;
        Ok(BusyGuard {
            state: &self.state,
            operation,
        })
    }

    fn report_invalid(&self, err: AppError) -> AppError {
        debug!("validation failed: {}", err);
        self.notifier.notify(Notification::error(None, err.to_string()));
        err
    }

    fn report_failure(
        &self,
        channel: &'static str,
        fallback: &str,
        connect_message: &str,
        err: AppError,
    ) -> AppError {
        let message = match &err {
            AppError::Rejected(message) => {
                warn!("{} rejected: {}", channel, err);
                message.clone().unwrap_or_else(|| fallback.to_string())
            }
            e if e.is_transport() => {
                error!("{} request failed: {}", channel, e);
                connect_message.to_string()
            }
            e => {
                warn!("{} failed: {}", channel, e);
                e.to_string()
            }
        };
        self.notifier.notify(Notification::error(Some(channel), message));
        err
    }
}

fn selected_placements(state: &ViewState) -> Result<Vec<Placement>, AppError> {
    let results = state
        .results
        .as_ref()
        .filter(|results| !results.is_empty())
        .ok_or_else(|| AppError::Validation("Please generate a schedule first.".to_string()))?;

    state
        .selected
        .and_then(|index| results.recommendations.get(index))
        .map(|option| option.schedule.clone())
        .ok_or_else(|| AppError::Validation("Please select a schedule to add.".to_string()))
}
