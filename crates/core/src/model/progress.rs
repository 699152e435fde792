use chrono::NaiveDate;

use crate::model::{ProgramDay, SessionRecord, UserSettings};
use crate::program::Phase;

/// Everything persisted for one device.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramState {
    current_day: ProgramDay,
    today_session: Option<SessionRecord>,
    settings: UserSettings,
}

impl ProgramState {
    #[must_use]
    pub fn from_persisted(
        current_day: ProgramDay,
        today_session: Option<SessionRecord>,
        settings: UserSettings,
    ) -> Self {
        Self {
            current_day,
            today_session,
            settings,
        }
    }

    #[must_use]
    pub fn current_day(&self) -> ProgramDay {
        self.current_day
    }

    #[must_use]
    pub fn current_phase(&self) -> Phase {
        crate::policy::phase_for_day(self.current_day.value())
    }

    #[must_use]
    pub fn today_session(&self) -> Option<&SessionRecord> {
        self.today_session.as_ref()
    }

    #[must_use]
    pub fn settings(&self) -> &UserSettings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut UserSettings {
        &mut self.settings
    }

    pub fn set_current_day(&mut self, day: ProgramDay) {
        self.current_day = day;
    }

    /// Replaces the session unless it already belongs to `today`.
    ///
    /// Returns true when a fresh record was installed. A stale record is
    /// dropped in full, completed or not.
    pub fn roll_session_to(&mut self, today: NaiveDate) -> bool {
        if self
            .today_session
            .as_ref()
            .is_some_and(|record| record.is_for(today))
        {
            return false;
        }
        self.today_session = Some(SessionRecord::empty(today));
        true
    }

    /// Session for `today`, created first if needed.
    pub fn session_for(&mut self, today: NaiveDate) -> &mut SessionRecord {
        self.roll_session_to(today);
        self.today_session
            .get_or_insert_with(|| SessionRecord::empty(today))
    }

    /// Back to day one with an empty session for `today`. Settings survive.
    pub fn reset(&mut self, today: NaiveDate) {
        self.current_day = ProgramDay::FIRST;
        self.today_session = Some(SessionRecord::empty(today));
    }
}
