use std::sync::Arc;

use storage::repository::Storage;

use crate::Clock;
use crate::error::AppServicesError;
use crate::reminders::ReminderNotifier;
use crate::routine::RoutineService;

/// Wires storage, the progress store, and reminders for the binary.
pub struct AppServices;

impl AppServices {
    /// Build a routine service backed by `SQLite` storage.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite(db_url: &str, clock: Clock) -> Result<RoutineService, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        Ok(RoutineService::load(clock, &storage).await)
    }

    /// Same as [`AppServices::new_sqlite`], with a running reminder timer.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if the database cannot be opened or migrated.
    pub async fn new_sqlite_with_reminders(
        db_url: &str,
        clock: Clock,
        notifier: Arc<dyn ReminderNotifier>,
    ) -> Result<RoutineService, AppServicesError> {
        Ok(Self::new_sqlite(db_url, clock).await?.with_reminders(notifier))
    }

    /// Non-persistent service for tests and demos.
    pub async fn in_memory(clock: Clock) -> RoutineService {
        RoutineService::load(clock, &Storage::in_memory()).await
    }
}
