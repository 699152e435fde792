//! Micro-break reminders: a best-effort notification side channel and the
//! cancellable timer that drives it.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use posture_core::model::{NotificationSettings, UserSettings};

use crate::error::NotifyError;

pub const TAB_MESSAGE: &str = "Time for a break!";
pub const NOTIFICATION_TITLE: &str = "Posture Check";
pub const NOTIFICATION_BODY: &str = "Time for a micro-break!";

/// Device-specific reminder effects.
///
/// Implementations should return an error rather than block when an effect
/// is unavailable; the caller treats every effect as optional.
pub trait ReminderNotifier: Send + Sync {
    fn flash_tab(&self, message: &str) -> Result<(), NotifyError>;
    fn show_notification(&self, title: &str, body: &str) -> Result<(), NotifyError>;
    fn play_tone(&self) -> Result<(), NotifyError>;
}

/// Which effects were delivered by one reminder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderEffects {
    pub tab_flashed: bool,
    pub notified: bool,
    pub tone_played: bool,
}

/// Fire every enabled effect once. Failures are logged and skipped.
pub fn trigger_reminder(
    notifier: &dyn ReminderNotifier,
    prefs: NotificationSettings,
) -> ReminderEffects {
    let mut effects = ReminderEffects::default();
    if prefs.tab_indicator {
        effects.tab_flashed = delivered("tab", notifier.flash_tab(TAB_MESSAGE));
    }
    if prefs.browser {
        effects.notified = delivered(
            "notification",
            notifier.show_notification(NOTIFICATION_TITLE, NOTIFICATION_BODY),
        );
    }
    if prefs.sound {
        effects.tone_played = delivered("sound", notifier.play_tone());
    }
    effects
}

fn delivered(effect: &'static str, result: Result<(), NotifyError>) -> bool {
    match result {
        Ok(()) => true,
        Err(err) => {
            debug!(effect, error = %err, "reminder effect skipped");
            false
        }
    }
}

struct ActiveTimer {
    interval_minutes: u32,
    prefs: watch::Sender<NotificationSettings>,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns at most one recurring reminder task.
///
/// The task is cancelled when reminders are disabled, when the interval
/// changes (and then rescheduled), and when the scheduler is dropped.
/// Must be used from within a tokio runtime.
pub struct ReminderScheduler {
    notifier: Arc<dyn ReminderNotifier>,
    active: Option<ActiveTimer>,
}

impl ReminderScheduler {
    #[must_use]
    pub fn new(notifier: Arc<dyn ReminderNotifier>) -> Self {
        Self {
            notifier,
            active: None,
        }
    }

    #[must_use]
    pub fn is_scheduled(&self) -> bool {
        self.active.is_some()
    }

    /// Interval of the running timer, in minutes.
    #[must_use]
    pub fn interval_minutes(&self) -> Option<u32> {
        self.active.as_ref().map(|timer| timer.interval_minutes)
    }

    /// Bring the timer in line with `settings`.
    ///
    /// Enabling or changing the interval cancels and reschedules; toggling
    /// individual effects only updates the running task.
    pub fn apply(&mut self, settings: &UserSettings) {
        let minutes = settings.microbreak_interval();
        if !settings.reminder_enabled() || minutes == 0 {
            self.cancel();
            return;
        }

        if let Some(timer) = &self.active {
            if timer.interval_minutes == minutes {
                timer.prefs.send_replace(settings.notifications());
                return;
            }
        }

        self.cancel();
        self.active = Some(self.spawn(minutes, settings.notifications()));
        debug!(minutes, "reminder scheduled");
    }

    pub fn cancel(&mut self) {
        if let Some(timer) = self.active.take() {
            timer.token.cancel();
            timer.handle.abort();
            debug!("reminder cancelled");
        }
    }

    fn spawn(&self, minutes: u32, prefs: NotificationSettings) -> ActiveTimer {
        let period = Duration::from_secs(u64::from(minutes) * 60);
        let (tx, rx) = watch::channel(prefs);
        let token = CancellationToken::new();
        let cancelled = token.clone();
        let notifier = Arc::clone(&self.notifier);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    () = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        let prefs = *rx.borrow();
                        trigger_reminder(notifier.as_ref(), prefs);
                    }
                }
            }
        });

        ActiveTimer {
            interval_minutes: minutes,
            prefs: tx,
            token,
            handle,
        }
    }
}

impl Drop for ReminderScheduler {
    fn drop(&mut self) {
        self.cancel();
    }
}
