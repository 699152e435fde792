#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod progress_store;
pub mod reminders;
pub mod routine;
pub mod view;

pub use posture_core::Clock;

pub use app_services::AppServices;
pub use error::{AppServicesError, NotifyError};
pub use progress_store::ProgressStore;
pub use reminders::{ReminderEffects, ReminderNotifier, ReminderScheduler, trigger_reminder};
pub use routine::{CompletionReport, RoutineService};
pub use view::{DashboardView, SessionLine};
