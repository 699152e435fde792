//! Persisted JSON shape of `ProgramState`.
//!
//! The blob is versionless and always written whole. Reading is lenient:
//! each value is decoded on its own and falls back to its default, so a
//! damaged blob keeps whatever parts are still readable.

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use posture_core::model::{
    CompletionMark, NotificationSettings, ProgramDay, ProgramState, SessionRecord, UserSettings,
};

use crate::repository::StorageError;

/// Fixed key the progress blob is stored under.
pub const PROGRESS_KEY: &str = "posture-progress";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRecord {
    pub current_day: i64,
    pub today_session: Option<SessionRecordRow>,
    pub settings: SettingsRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRecordRow {
    pub date: NaiveDate,
    pub morning: MarkRecord,
    pub microbreaks: Vec<MarkRecord>,
    pub evening: MarkRecord,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MarkRecord {
    pub completed: bool,
    pub time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRecord {
    pub notifications: NotificationsRecord,
    pub microbreak_interval: u32,
    pub reminder_enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsRecord {
    pub browser: bool,
    pub tab_indicator: bool,
    pub sound: bool,
}

//
// ─── DOMAIN → RECORD ───────────────────────────────────────────────────────────
//

impl ProgressRecord {
    #[must_use]
    pub fn from_state(state: &ProgramState) -> Self {
        Self {
            current_day: i64::from(state.current_day().value()),
            today_session: state.today_session().map(SessionRecordRow::from_record),
            settings: SettingsRecord::from_settings(state.settings()),
        }
    }

    /// Serialize for storage.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if JSON encoding fails.
    pub fn to_json(&self) -> Result<String, StorageError> {
        serde_json::to_string(self).map_err(|err| StorageError::Serialization(err.to_string()))
    }
}

impl SessionRecordRow {
    #[must_use]
    pub fn from_record(record: &SessionRecord) -> Self {
        Self {
            date: record.date(),
            morning: MarkRecord::from_mark(record.morning()),
            microbreaks: record
                .microbreaks()
                .iter()
                .map(MarkRecord::from_mark)
                .collect(),
            evening: MarkRecord::from_mark(record.evening()),
        }
    }
}

impl MarkRecord {
    #[must_use]
    pub fn from_mark(mark: &CompletionMark) -> Self {
        Self {
            completed: mark.is_completed(),
            time: mark.time().map(str::to_owned),
        }
    }
}

impl SettingsRecord {
    #[must_use]
    pub fn from_settings(settings: &UserSettings) -> Self {
        let notifications = settings.notifications();
        Self {
            notifications: NotificationsRecord {
                browser: notifications.browser,
                tab_indicator: notifications.tab_indicator,
                sound: notifications.sound,
            },
            microbreak_interval: settings.microbreak_interval(),
            reminder_enabled: settings.reminder_enabled(),
        }
    }
}

//
// ─── LENIENT DECODE ────────────────────────────────────────────────────────────
//

/// How much of a stored blob survived decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeQuality {
    /// Every field decoded.
    Intact,
    /// Some fields fell back to defaults.
    Partial,
    /// Nothing usable; full defaults.
    Unreadable,
}

/// Decode a stored blob, falling back to defaults field by field.
///
/// Never fails. Every leaf value (the day, each completion mark field, each
/// setting and notification toggle) is read on its own, so one damaged value
/// only resets itself. A session whose date cannot be read is dropped, and
/// input that is not a JSON object yields the defaults.
#[must_use]
pub fn decode_lenient(raw: &str) -> (ProgramState, DecodeQuality) {
    let map = match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map,
        _ => return (ProgramState::default(), DecodeQuality::Unreadable),
    };

    let mut reader = LenientReader { intact: true };

    let current_day = reader
        .required::<i64>(&map, "currentDay")
        .map_or_else(ProgramDay::default, ProgramDay::clamped);

    let today_session = match map.get("todaySession") {
        None | Some(Value::Null) => None,
        Some(value) => reader.session(value),
    };

    let settings = match map.get("settings") {
        Some(value) => reader.settings(value),
        None => {
            reader.intact = false;
            UserSettings::default()
        }
    };

    let quality = if reader.intact {
        DecodeQuality::Intact
    } else {
        DecodeQuality::Partial
    };
    (
        ProgramState::from_persisted(current_day, today_session, settings),
        quality,
    )
}

/// Reads values one at a time and remembers whether any had to be replaced.
///
/// Missing nested keys take their default silently; a value that is present
/// but has the wrong shape counts as damage.
struct LenientReader {
    intact: bool,
}

impl LenientReader {
    fn optional<T: DeserializeOwned>(&mut self, map: &Map<String, Value>, key: &str) -> Option<T> {
        let value = map.get(key)?;
        let parsed = <T as Deserialize>::deserialize(value).ok();
        self.intact &= parsed.is_some();
        parsed
    }

    fn required<T: DeserializeOwned>(&mut self, map: &Map<String, Value>, key: &str) -> Option<T> {
        let parsed = self.optional(map, key);
        self.intact &= parsed.is_some();
        parsed
    }

    fn object<'a>(&mut self, value: &'a Value) -> Option<&'a Map<String, Value>> {
        match value {
            Value::Object(map) => Some(map),
            _ => {
                self.intact = false;
                None
            }
        }
    }

    fn session(&mut self, value: &Value) -> Option<SessionRecord> {
        let map = self.object(value)?;
        let date = self.required::<NaiveDate>(map, "date")?;
        let morning = map
            .get("morning")
            .map_or_else(CompletionMark::pending, |value| self.mark(value));
        let microbreaks = match map.get("microbreaks") {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(items)) => items.iter().map(|item| self.mark(item)).collect(),
            Some(_) => {
                self.intact = false;
                Vec::new()
            }
        };
        let evening = map
            .get("evening")
            .map_or_else(CompletionMark::pending, |value| self.mark(value));
        Some(SessionRecord::from_persisted(
            date,
            morning,
            microbreaks,
            evening,
        ))
    }

    fn mark(&mut self, value: &Value) -> CompletionMark {
        let Some(map) = self.object(value) else {
            return CompletionMark::pending();
        };
        let completed = self.optional::<bool>(map, "completed").unwrap_or(false);
        let time = self.optional::<Option<String>>(map, "time").flatten();
        CompletionMark::from_persisted(completed, time)
    }

    fn settings(&mut self, value: &Value) -> UserSettings {
        let defaults = UserSettings::default();
        let Some(map) = self.object(value) else {
            return defaults;
        };

        let fallback = defaults.notifications();
        let notifications = match map.get("notifications") {
            None => fallback,
            Some(value) => match self.object(value) {
                Some(toggles) => NotificationSettings {
                    browser: self
                        .optional(toggles, "browser")
                        .unwrap_or(fallback.browser),
                    tab_indicator: self
                        .optional(toggles, "tabIndicator")
                        .unwrap_or(fallback.tab_indicator),
                    sound: self.optional(toggles, "sound").unwrap_or(fallback.sound),
                },
                None => fallback,
            },
        };
        let microbreak_interval = self
            .optional(map, "microbreakInterval")
            .unwrap_or(defaults.microbreak_interval());
        let reminder_enabled = self
            .optional(map, "reminderEnabled")
            .unwrap_or(defaults.reminder_enabled());

        UserSettings::from_persisted(notifications, microbreak_interval, reminder_enabled)
    }
}
