pub mod controller;
pub mod notify;

pub use controller::{ScheduleController, ViewState};
pub use notify::{ConfirmPrompt, Notification, NotificationKind, NotificationLog, Notifier};
