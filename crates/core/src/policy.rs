//! Pure progression rules over a day's `SessionRecord`.
//!
//! Nothing here mutates state or touches storage; services call these to decide
//! what to show next and whether the program day should move.

use crate::model::{ProgramDay, SessionKind, SessionRecord};
use crate::program::{DAYS_PER_WEEK, Phase, REQUIRED_MICROBREAKS, TOTAL_DAYS};

//
// ─── SESSION ORDER ─────────────────────────────────────────────────────────────
//

/// The session to do next, in the fixed order morning → micro-breaks → evening.
///
/// Returns `None` once the day is complete.
///
/// # Examples
///
/// ```
/// # use chrono::NaiveDate;
/// # use posture_core::model::{SessionKind, SessionRecord};
/// # use posture_core::policy::next_session;
/// let mut record = SessionRecord::empty(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
/// assert_eq!(next_session(&record), Some(SessionKind::Morning));
///
/// record.complete_morning("07:10 AM");
/// assert_eq!(next_session(&record), Some(SessionKind::Microbreak));
/// ```
#[must_use]
pub fn next_session(record: &SessionRecord) -> Option<SessionKind> {
    if !record.morning().is_completed() {
        Some(SessionKind::Morning)
    } else if record.microbreaks().len() < REQUIRED_MICROBREAKS {
        Some(SessionKind::Microbreak)
    } else if !record.evening().is_completed() {
        Some(SessionKind::Evening)
    } else {
        None
    }
}

/// Morning done, all required micro-breaks logged, evening done.
#[must_use]
pub fn is_day_complete(record: &SessionRecord) -> bool {
    record.morning().is_completed()
        && record.microbreaks().len() >= REQUIRED_MICROBREAKS
        && record.evening().is_completed()
}

//
// ─── CALENDAR MAPPING ──────────────────────────────────────────────────────────
//

/// `ceil(day / 7)`.
#[must_use]
pub fn week_for_day(day: u32) -> u32 {
    day.div_ceil(DAYS_PER_WEEK)
}

/// Phase for a program day. Weeks 1-3 release, 4-6 activate, 7-9 strengthen,
/// everything after integrates (days past the program end stay in phase 4).
#[must_use]
pub fn phase_for_day(day: u32) -> Phase {
    match week_for_day(day) {
        0..=3 => Phase::Release,
        4..=6 => Phase::Activate,
        7..=9 => Phase::Strengthen,
        _ => Phase::Integrate,
    }
}

/// Whole-number share of the program reached, `round(day / TOTAL_DAYS * 100)`.
#[must_use]
pub fn progress_percent(day: u32) -> u32 {
    let day = u64::from(day);
    let total = u64::from(TOTAL_DAYS);
    let percent = (day * 100 + total / 2) / total;
    u32::try_from(percent).unwrap_or(u32::MAX)
}

//
// ─── DAY ADVANCE ───────────────────────────────────────────────────────────────
//

/// Decision taken after a completion event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayAdvance {
    Advance { from: ProgramDay, to: ProgramDay },
    Hold,
}

/// Decides whether a completion event should move the program forward.
///
/// Only the transition from incomplete to complete advances, so re-checking a
/// record that was already complete never advances twice. The last day never
/// advances.
#[must_use]
pub fn day_advance(current: ProgramDay, was_complete: bool, record: &SessionRecord) -> DayAdvance {
    if was_complete || !is_day_complete(record) {
        return DayAdvance::Hold;
    }
    match current.next() {
        Some(to) => DayAdvance::Advance { from: current, to },
        None => DayAdvance::Hold,
    }
}
