/// Lowest reminder interval the settings UI offers, in minutes.
pub const MIN_MICROBREAK_INTERVAL: u32 = 15;
/// Highest reminder interval the settings UI offers, in minutes.
pub const MAX_MICROBREAK_INTERVAL: u32 = 120;
pub const DEFAULT_MICROBREAK_INTERVAL: u32 = 45;

/// Independently toggled reminder effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotificationSettings {
    pub browser: bool,
    pub tab_indicator: bool,
    pub sound: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            browser: false,
            tab_indicator: true,
            sound: false,
        }
    }
}

impl NotificationSettings {
    #[must_use]
    pub fn any_enabled(&self) -> bool {
        self.browser || self.tab_indicator || self.sound
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserSettings {
    notifications: NotificationSettings,
    microbreak_interval: u32,
    reminder_enabled: bool,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            notifications: NotificationSettings::default(),
            microbreak_interval: DEFAULT_MICROBREAK_INTERVAL,
            reminder_enabled: false,
        }
    }
}

impl UserSettings {
    /// Rehydrate settings from storage. The interval is kept as stored.
    #[must_use]
    pub fn from_persisted(
        notifications: NotificationSettings,
        microbreak_interval: u32,
        reminder_enabled: bool,
    ) -> Self {
        Self {
            notifications,
            microbreak_interval,
            reminder_enabled,
        }
    }

    #[must_use]
    pub fn notifications(&self) -> NotificationSettings {
        self.notifications
    }

    /// Reminder interval in minutes.
    #[must_use]
    pub fn microbreak_interval(&self) -> u32 {
        self.microbreak_interval
    }

    #[must_use]
    pub fn reminder_enabled(&self) -> bool {
        self.reminder_enabled
    }

    /// Top-level shallow merge: every field present in `patch` replaces the
    /// current value, including the whole `notifications` group.
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(notifications) = patch.notifications {
            self.notifications = notifications;
        }
        if let Some(interval) = patch.microbreak_interval {
            self.microbreak_interval = interval;
        }
        if let Some(enabled) = patch.reminder_enabled {
            self.reminder_enabled = enabled;
        }
    }
}

/// Partial settings update. `None` leaves the field untouched.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SettingsPatch {
    pub notifications: Option<NotificationSettings>,
    pub microbreak_interval: Option<u32>,
    pub reminder_enabled: Option<bool>,
}

impl SettingsPatch {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.notifications.is_none()
            && self.microbreak_interval.is_none()
            && self.reminder_enabled.is_none()
    }
}

/// Clamps a requested reminder interval into the offered range.
#[must_use]
pub fn clamp_interval(minutes: u32) -> u32 {
    minutes.clamp(MIN_MICROBREAK_INTERVAL, MAX_MICROBREAK_INTERVAL)
}
