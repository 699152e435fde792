use std::sync::Arc;

use tracing::{debug, info, warn};

use posture_core::Clock;
use posture_core::model::{
    MicrobreakOutcome, ProgramDay, ProgramState, SessionRecord, SettingsPatch, UserSettings,
};
use posture_core::program::Phase;
use posture_core::time::{completion_label, local_date};
use storage::record::{DecodeQuality, PROGRESS_KEY, ProgressRecord, decode_lenient};
use storage::repository::KeyValueStore;

/// Owner of the device's `ProgramState`.
///
/// Every mutator writes the whole state back to storage before returning.
/// Storage failures are logged and swallowed: the in-memory state stays
/// authoritative for the rest of the process.
pub struct ProgressStore {
    clock: Clock,
    kv: Arc<dyn KeyValueStore>,
    state: ProgramState,
}

impl ProgressStore {
    /// Load persisted progress, degrading to defaults on any read or decode
    /// failure, then make sure a session for today exists.
    pub async fn load(clock: Clock, kv: Arc<dyn KeyValueStore>) -> Self {
        let state = match kv.get(PROGRESS_KEY).await {
            Ok(Some(raw)) => {
                let (state, quality) = decode_lenient(&raw);
                match quality {
                    DecodeQuality::Intact => {}
                    DecodeQuality::Partial => {
                        warn!("stored progress partly unreadable; damaged fields reset");
                    }
                    DecodeQuality::Unreadable => {
                        warn!("stored progress unreadable; starting from defaults");
                    }
                }
                state
            }
            Ok(None) => ProgramState::default(),
            Err(err) => {
                warn!(error = %err, "progress storage unavailable; starting from defaults");
                ProgramState::default()
            }
        };

        let mut store = Self { clock, kv, state };
        store.ensure_today_session().await;
        store
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    pub fn set_clock(&mut self, clock: Clock) {
        self.clock = clock;
    }

    #[must_use]
    pub fn state(&self) -> &ProgramState {
        &self.state
    }

    #[must_use]
    pub fn current_day(&self) -> ProgramDay {
        self.state.current_day()
    }

    #[must_use]
    pub fn current_phase(&self) -> Phase {
        self.state.current_phase()
    }

    #[must_use]
    pub fn today_session(&self) -> Option<&SessionRecord> {
        self.state.today_session()
    }

    #[must_use]
    pub fn settings(&self) -> &UserSettings {
        self.state.settings()
    }

    /// Replace a missing or stale session with an empty one for today.
    ///
    /// Idempotent; returns true when a new record was installed.
    pub async fn ensure_today_session(&mut self) -> bool {
        let today = self.clock.today();
        if !self.state.roll_session_to(today) {
            return false;
        }
        debug!(%today, "started session record for today");
        self.persist().await;
        true
    }

    pub async fn complete_morning(&mut self) {
        let now = self.clock.now();
        self.state
            .session_for(local_date(now))
            .complete_morning(completion_label(now));
        self.persist().await;
    }

    /// Log one micro-break. At the daily cap this changes nothing.
    pub async fn complete_microbreak(&mut self) -> MicrobreakOutcome {
        let now = self.clock.now();
        let outcome = self
            .state
            .session_for(local_date(now))
            .complete_microbreak(completion_label(now));
        match outcome {
            MicrobreakOutcome::Recorded { .. } => self.persist().await,
            MicrobreakOutcome::AlreadyAtCap => debug!("micro-break ignored; daily cap reached"),
        }
        outcome
    }

    pub async fn complete_evening(&mut self) {
        let now = self.clock.now();
        self.state
            .session_for(local_date(now))
            .complete_evening(completion_label(now));
        self.persist().await;
    }

    /// Jump to `day`, clamped into the program range. Today's session is kept.
    pub async fn set_day(&mut self, day: i64) -> ProgramDay {
        let day = ProgramDay::clamped(day);
        self.state.set_current_day(day);
        self.persist().await;
        day
    }

    /// Move to the next program day. Returns false on the last day.
    pub async fn advance_day(&mut self) -> bool {
        let Some(next) = self.state.current_day().next() else {
            return false;
        };
        self.state.set_current_day(next);
        self.persist().await;
        true
    }

    /// Back to day one with an empty session for today. Settings are kept.
    pub async fn reset_progress(&mut self) {
        self.state.reset(self.clock.today());
        info!("progress reset to day 1");
        self.persist().await;
    }

    pub async fn update_settings(&mut self, patch: SettingsPatch) {
        self.state.settings_mut().apply(patch);
        self.persist().await;
    }

    /// Forget everything, settings included, and drop the stored blob.
    pub async fn clear(&mut self) {
        if let Err(err) = self.kv.remove(PROGRESS_KEY).await {
            warn!(error = %err, "failed to remove stored progress");
        }
        self.state = ProgramState::default();
        self.state.roll_session_to(self.clock.today());
        info!("stored progress cleared");
    }

    async fn persist(&self) {
        let json = match ProgressRecord::from_state(&self.state).to_json() {
            Ok(json) => json,
            Err(err) => {
                warn!(error = %err, "failed to encode progress; write dropped");
                return;
            }
        };
        if let Err(err) = self.kv.set(PROGRESS_KEY, &json).await {
            warn!(error = %err, "failed to save progress; keeping in-memory state");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::Duration;
    use posture_core::model::NotificationSettings;
    use posture_core::time::{fixed_clock, fixed_now};
    use posture_core::{REQUIRED_MICROBREAKS, TOTAL_DAYS};
    use storage::repository::InMemoryRepository;

    async fn stored_state(repo: &InMemoryRepository) -> ProgramState {
        let raw = repo.get(PROGRESS_KEY).await.unwrap().expect("persisted");
        decode_lenient(&raw).0
    }

    #[tokio::test]
    async fn first_load_creates_defaults_with_todays_session() {
        let repo = InMemoryRepository::new();
        let store = ProgressStore::load(fixed_clock(), Arc::new(repo.clone())).await;

        assert_eq!(store.current_day(), ProgramDay::FIRST);
        let session = store.today_session().expect("session for today");
        assert_eq!(session.date(), local_date(fixed_now()));
        assert_eq!(store.settings(), &UserSettings::default());
        assert_eq!(&stored_state(&repo).await, store.state());
    }

    #[tokio::test]
    async fn every_mutation_is_persisted() {
        let repo = InMemoryRepository::new();
        let mut store = ProgressStore::load(fixed_clock(), Arc::new(repo.clone())).await;

        store.complete_morning().await;
        assert!(stored_state(&repo).await.today_session().unwrap().morning().is_completed());

        store.complete_microbreak().await;
        assert_eq!(
            stored_state(&repo).await.today_session().unwrap().microbreaks().len(),
            1
        );

        store.complete_evening().await;
        assert!(stored_state(&repo).await.today_session().unwrap().evening().is_completed());

        store.set_day(12).await;
        assert_eq!(stored_state(&repo).await.current_day().value(), 12);
    }

    #[tokio::test]
    async fn completion_marks_carry_local_time() {
        let mut store =
            ProgressStore::load(fixed_clock(), Arc::new(InMemoryRepository::new())).await;
        store.complete_morning().await;

        let morning = store.today_session().unwrap().morning();
        assert_eq!(morning.time(), Some(completion_label(fixed_now()).as_str()));
    }

    #[tokio::test]
    async fn microbreaks_are_capped_in_the_store() {
        let mut store =
            ProgressStore::load(fixed_clock(), Arc::new(InMemoryRepository::new())).await;
        for _ in 0..REQUIRED_MICROBREAKS {
            assert!(matches!(
                store.complete_microbreak().await,
                MicrobreakOutcome::Recorded { .. }
            ));
        }
        assert_eq!(
            store.complete_microbreak().await,
            MicrobreakOutcome::AlreadyAtCap
        );
        assert_eq!(
            store.today_session().unwrap().microbreaks().len(),
            REQUIRED_MICROBREAKS
        );
    }

    #[tokio::test]
    async fn set_day_clamps() {
        let mut store =
            ProgressStore::load(fixed_clock(), Arc::new(InMemoryRepository::new())).await;

        assert_eq!(store.set_day(0).await.value(), 1);
        assert_eq!(store.current_day().value(), 1);

        assert_eq!(store.set_day(999).await.value(), TOTAL_DAYS);
        assert_eq!(store.current_day().value(), TOTAL_DAYS);
    }

    #[tokio::test]
    async fn set_day_keeps_todays_session() {
        let mut store =
            ProgressStore::load(fixed_clock(), Arc::new(InMemoryRepository::new())).await;
        store.complete_morning().await;
        store.set_day(20).await;
        assert!(store.today_session().unwrap().morning().is_completed());
    }

    #[tokio::test]
    async fn advance_stops_at_last_day() {
        let mut store =
            ProgressStore::load(fixed_clock(), Arc::new(InMemoryRepository::new())).await;
        store.set_day(83).await;
        assert!(store.advance_day().await);
        assert_eq!(store.current_day(), ProgramDay::LAST);
        assert!(!store.advance_day().await);
        assert_eq!(store.current_day(), ProgramDay::LAST);
    }

    #[tokio::test]
    async fn yesterdays_session_is_replaced_on_load() {
        let repo = InMemoryRepository::new();
        let mut yesterday = fixed_clock();
        yesterday.advance(-Duration::days(1));

        let mut store = ProgressStore::load(yesterday, Arc::new(repo.clone())).await;
        store.complete_morning().await;
        store.complete_microbreak().await;
        store.set_day(5).await;

        let reloaded = ProgressStore::load(fixed_clock(), Arc::new(repo.clone())).await;
        let session = reloaded.today_session().unwrap();
        assert_eq!(session.date(), local_date(fixed_now()));
        assert!(!session.morning().is_completed());
        assert!(session.microbreaks().is_empty());
        assert!(!session.evening().is_completed());
        assert_eq!(reloaded.current_day().value(), 5);
        assert_eq!(
            stored_state(&repo).await.today_session().unwrap().date(),
            local_date(fixed_now())
        );
    }

    #[tokio::test]
    async fn ensure_today_session_rolls_over_midnight() {
        let mut store =
            ProgressStore::load(fixed_clock(), Arc::new(InMemoryRepository::new())).await;
        store.complete_morning().await;
        assert!(!store.ensure_today_session().await);

        let mut tomorrow = fixed_clock();
        tomorrow.advance(Duration::days(1));
        store.set_clock(tomorrow);

        assert!(store.ensure_today_session().await);
        assert!(!store.ensure_today_session().await);
        let session = store.today_session().unwrap();
        assert_eq!(session.date(), tomorrow.today());
        assert!(!session.morning().is_completed());
    }

    #[tokio::test]
    async fn completing_after_midnight_starts_a_new_record() {
        let mut store =
            ProgressStore::load(fixed_clock(), Arc::new(InMemoryRepository::new())).await;
        store.complete_morning().await;

        let mut tomorrow = fixed_clock();
        tomorrow.advance(Duration::days(1));
        store.set_clock(tomorrow);
        store.complete_microbreak().await;

        let session = store.today_session().unwrap();
        assert_eq!(session.date(), tomorrow.today());
        assert!(!session.morning().is_completed());
        assert_eq!(session.microbreaks().len(), 1);
    }

    #[tokio::test]
    async fn reset_keeps_settings() {
        let repo = InMemoryRepository::new();
        let mut store = ProgressStore::load(fixed_clock(), Arc::new(repo.clone())).await;
        store
            .update_settings(SettingsPatch {
                reminder_enabled: Some(true),
                microbreak_interval: Some(30),
                ..SettingsPatch::default()
            })
            .await;
        store.set_day(44).await;
        store.complete_morning().await;

        store.reset_progress().await;

        assert_eq!(store.current_day(), ProgramDay::FIRST);
        assert!(!store.today_session().unwrap().morning().is_completed());
        assert!(store.settings().reminder_enabled());
        assert_eq!(store.settings().microbreak_interval(), 30);
        assert_eq!(&stored_state(&repo).await, store.state());
    }

    #[tokio::test]
    async fn update_settings_is_shallow() {
        let mut store =
            ProgressStore::load(fixed_clock(), Arc::new(InMemoryRepository::new())).await;
        let muted = NotificationSettings {
            browser: false,
            tab_indicator: false,
            sound: false,
        };
        store
            .update_settings(SettingsPatch {
                notifications: Some(muted),
                ..SettingsPatch::default()
            })
            .await;

        assert_eq!(store.settings().notifications(), muted);
        assert_eq!(store.settings().microbreak_interval(), 45);
        assert!(!store.settings().reminder_enabled());
    }

    #[tokio::test]
    async fn corrupt_blob_loads_defaults() {
        let repo = InMemoryRepository::with_entry(PROGRESS_KEY, "{{{ not json");
        let store = ProgressStore::load(fixed_clock(), Arc::new(repo)).await;
        assert_eq!(store.current_day(), ProgramDay::FIRST);
        assert_eq!(store.settings(), &UserSettings::default());
        assert!(store.today_session().is_some());
    }

    #[tokio::test]
    async fn clear_drops_everything() {
        let repo = InMemoryRepository::new();
        let mut store = ProgressStore::load(fixed_clock(), Arc::new(repo.clone())).await;
        store.set_day(30).await;
        store
            .update_settings(SettingsPatch {
                reminder_enabled: Some(true),
                ..SettingsPatch::default()
            })
            .await;

        store.clear().await;

        assert_eq!(repo.get(PROGRESS_KEY).await.unwrap(), None);
        assert_eq!(store.current_day(), ProgramDay::FIRST);
        assert!(!store.settings().reminder_enabled());
        assert!(store.today_session().is_some());
    }
}
