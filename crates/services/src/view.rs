use posture_core::model::{CompletionMark, ProgramDay, ProgramState, SessionKind};
use posture_core::policy::{is_day_complete, next_session, progress_percent, week_for_day};
use posture_core::program::{Phase, REQUIRED_MICROBREAKS, TOTAL_DAYS};
use posture_core::share_code;

/// One row of today's checklist.
///
/// `ordinal` is the one-based micro-break number and `None` for the
/// morning and evening rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionLine {
    pub kind: SessionKind,
    pub ordinal: Option<usize>,
    pub completed: bool,
    pub time: Option<String>,
}

impl SessionLine {
    fn from_mark(kind: SessionKind, ordinal: Option<usize>, mark: Option<&CompletionMark>) -> Self {
        Self {
            kind,
            ordinal,
            completed: mark.is_some_and(CompletionMark::is_completed),
            time: mark.and_then(CompletionMark::time).map(str::to_owned),
        }
    }
}

/// Presentation-agnostic snapshot of the program and today's sessions.
///
/// No localization or layout decisions are made here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardView {
    pub day: ProgramDay,
    pub total_days: u32,
    pub phase: Phase,
    pub week: u32,
    pub progress_percent: u32,
    pub sessions: Vec<SessionLine>,
    pub next: Option<SessionKind>,
    pub day_complete: bool,
    pub share_code: String,
}

impl DashboardView {
    #[must_use]
    pub fn from_state(state: &ProgramState) -> Self {
        let day = state.current_day();
        let phase = state.current_phase();
        let record = state.today_session();

        let mut sessions = Vec::with_capacity(REQUIRED_MICROBREAKS + 2);
        sessions.push(SessionLine::from_mark(
            SessionKind::Morning,
            None,
            record.map(|r| r.morning()),
        ));
        for index in 0..REQUIRED_MICROBREAKS {
            sessions.push(SessionLine::from_mark(
                SessionKind::Microbreak,
                Some(index + 1),
                record.and_then(|r| r.microbreaks().get(index)),
            ));
        }
        sessions.push(SessionLine::from_mark(
            SessionKind::Evening,
            None,
            record.map(|r| r.evening()),
        ));

        Self {
            day,
            total_days: TOTAL_DAYS,
            phase,
            week: week_for_day(day.value()),
            progress_percent: progress_percent(day.value()),
            sessions,
            next: record.map_or(Some(SessionKind::Morning), next_session),
            day_complete: record.is_some_and(is_day_complete),
            share_code: share_code::encode(day.value(), phase.number()),
        }
    }
}
