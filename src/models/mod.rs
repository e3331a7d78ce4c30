pub mod form;
pub mod schedule;

pub use form::{DayOfWeek, FormState, Quarter, ScheduleRequest, SubmittedConfirmation, TimeOfDay};
pub use schedule::{CalendarSubmission, Placement, ScheduleOption, ScheduleResult, CALENDAR_NAME};
