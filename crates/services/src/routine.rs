use std::sync::Arc;

use tracing::info;

use posture_core::Clock;
use posture_core::model::{MicrobreakOutcome, ProgramDay, SessionKind, SettingsPatch};
use posture_core::policy::{DayAdvance, day_advance, is_day_complete, next_session};
use posture_core::share_code;
use storage::repository::Storage;

use crate::progress_store::ProgressStore;
use crate::reminders::{ReminderNotifier, ReminderScheduler};
use crate::view::DashboardView;

/// Outcome of a single completion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionReport {
    pub kind: SessionKind,
    /// False when the event changed nothing (micro-break cap reached).
    pub recorded: bool,
    pub day_complete: bool,
    /// Set when this event finished the day and the program moved forward.
    pub advanced_to: Option<ProgramDay>,
}

/// Presentation-facing facade over the progress store.
///
/// Records completions, advances the program day exactly once per completed
/// day, and keeps the reminder timer in step with settings changes.
pub struct RoutineService {
    store: ProgressStore,
    reminders: Option<ReminderScheduler>,
}

impl RoutineService {
    #[must_use]
    pub fn new(store: ProgressStore) -> Self {
        Self {
            store,
            reminders: None,
        }
    }

    /// Load progress from `storage` and wrap it.
    pub async fn load(clock: Clock, storage: &Storage) -> Self {
        Self::new(ProgressStore::load(clock, Arc::clone(&storage.kv)).await)
    }

    /// Attach a reminder timer and start it according to current settings.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn with_reminders(mut self, notifier: Arc<dyn ReminderNotifier>) -> Self {
        let mut scheduler = ReminderScheduler::new(notifier);
        scheduler.apply(self.store.settings());
        self.reminders = Some(scheduler);
        self
    }

    #[must_use]
    pub fn store(&self) -> &ProgressStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ProgressStore {
        &mut self.store
    }

    #[must_use]
    pub fn reminders_scheduled(&self) -> bool {
        self.reminders
            .as_ref()
            .is_some_and(ReminderScheduler::is_scheduled)
    }

    /// Record one finished session and advance the program if that
    /// completed the day.
    pub async fn complete(&mut self, kind: SessionKind) -> CompletionReport {
        self.store.ensure_today_session().await;
        let was_complete = self.store.today_session().is_some_and(is_day_complete);

        let recorded = match kind {
            SessionKind::Morning => {
                self.store.complete_morning().await;
                true
            }
            SessionKind::Microbreak => matches!(
                self.store.complete_microbreak().await,
                MicrobreakOutcome::Recorded { .. }
            ),
            SessionKind::Evening => {
                self.store.complete_evening().await;
                true
            }
        };

        let (day_complete, decision) = match self.store.today_session() {
            Some(record) => (
                is_day_complete(record),
                day_advance(self.store.current_day(), was_complete, record),
            ),
            None => (false, DayAdvance::Hold),
        };

        let advanced_to = match decision {
            DayAdvance::Advance { from, to } => {
                if self.store.advance_day().await {
                    info!(%from, %to, "day complete; program advanced");
                    Some(to)
                } else {
                    None
                }
            }
            DayAdvance::Hold => None,
        };

        CompletionReport {
            kind,
            recorded,
            day_complete,
            advanced_to,
        }
    }

    #[must_use]
    pub fn next_session(&self) -> Option<SessionKind> {
        self.store
            .today_session()
            .map_or(Some(SessionKind::Morning), next_session)
    }

    pub async fn set_day(&mut self, day: i64) -> ProgramDay {
        self.store.set_day(day).await
    }

    pub async fn reset_progress(&mut self) {
        self.store.reset_progress().await;
    }

    /// Share code for the current day and phase.
    #[must_use]
    pub fn share_code(&self) -> String {
        share_code::encode(
            self.store.current_day().value(),
            self.store.current_phase().number(),
        )
    }

    /// Apply a share code's day. The phase in the code is informational.
    ///
    /// Returns the resulting day, or `None` for an unrecognized code.
    pub async fn restore_share_code(&mut self, code: &str) -> Option<ProgramDay> {
        let decoded = share_code::decode(code)?;
        let day = self.store.set_day(i64::from(decoded.day)).await;
        info!(%day, "progress restored from share code");
        Some(day)
    }

    /// Persist a settings change and re-sync the reminder timer.
    pub async fn update_settings(&mut self, patch: SettingsPatch) {
        self.store.update_settings(patch).await;
        if let Some(reminders) = self.reminders.as_mut() {
            reminders.apply(self.store.settings());
        }
    }

    /// Erase stored progress and settings.
    pub async fn clear(&mut self) {
        self.store.clear().await;
        if let Some(reminders) = self.reminders.as_mut() {
            reminders.apply(self.store.settings());
        }
    }

    /// Current dashboard, rolling today's session over first if the date changed.
    pub async fn dashboard(&mut self) -> DashboardView {
        self.store.ensure_today_session().await;
        DashboardView::from_state(self.store.state())
    }
}
