use chrono::NaiveDate;
use std::fmt;

use crate::program::REQUIRED_MICROBREAKS;

//
// ─── SESSION KINDS ─────────────────────────────────────────────────────────────
//

/// The three activity kinds that make up a program day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    Morning,
    Microbreak,
    Evening,
}

impl SessionKind {
    pub const ALL: [SessionKind; 3] = [
        SessionKind::Morning,
        SessionKind::Microbreak,
        SessionKind::Evening,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SessionKind::Morning => "morning",
            SessionKind::Microbreak => "microbreak",
            SessionKind::Evening => "evening",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(raw.trim()))
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            SessionKind::Morning => "Morning Routine",
            SessionKind::Microbreak => "Microbreak",
            SessionKind::Evening => "Evening Wind-down",
        }
    }
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── COMPLETION MARK ───────────────────────────────────────────────────────────
//

/// Records that one session instance was finished, and when.
///
/// `time` is present exactly when `completed` is true.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionMark {
    completed: bool,
    time: Option<String>,
}

impl CompletionMark {
    #[must_use]
    pub fn pending() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn done(time: impl Into<String>) -> Self {
        Self {
            completed: true,
            time: Some(time.into()),
        }
    }

    /// Rehydrate a mark from storage. A stray time on an incomplete mark is dropped.
    #[must_use]
    pub fn from_persisted(completed: bool, time: Option<String>) -> Self {
        Self {
            completed,
            time: time.filter(|_| completed),
        }
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn time(&self) -> Option<&str> {
        self.time.as_deref()
    }
}

//
// ─── SESSION RECORD ────────────────────────────────────────────────────────────
//

/// Result of logging a micro-break.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicrobreakOutcome {
    /// Appended; `count` is the number of micro-breaks now logged today.
    Recorded { count: usize },
    /// Today already holds `REQUIRED_MICROBREAKS`; nothing changed.
    AlreadyAtCap,
}

/// Completion state for a single calendar date.
///
/// Marks only move from pending to done. A record is never reset in place;
/// it is replaced wholesale when the date rolls over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    date: NaiveDate,
    morning: CompletionMark,
    microbreaks: Vec<CompletionMark>,
    evening: CompletionMark,
}

impl SessionRecord {
    /// Fresh record with nothing completed.
    #[must_use]
    pub fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            morning: CompletionMark::pending(),
            microbreaks: Vec::with_capacity(REQUIRED_MICROBREAKS),
            evening: CompletionMark::pending(),
        }
    }

    /// Rehydrate a record from storage.
    ///
    /// Micro-breaks beyond `REQUIRED_MICROBREAKS` are discarded.
    #[must_use]
    pub fn from_persisted(
        date: NaiveDate,
        morning: CompletionMark,
        mut microbreaks: Vec<CompletionMark>,
        evening: CompletionMark,
    ) -> Self {
        microbreaks.truncate(REQUIRED_MICROBREAKS);
        Self {
            date,
            morning,
            microbreaks,
            evening,
        }
    }

    #[must_use]
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub fn morning(&self) -> &CompletionMark {
        &self.morning
    }

    #[must_use]
    pub fn microbreaks(&self) -> &[CompletionMark] {
        &self.microbreaks
    }

    #[must_use]
    pub fn evening(&self) -> &CompletionMark {
        &self.evening
    }

    #[must_use]
    pub fn is_for(&self, date: NaiveDate) -> bool {
        self.date == date
    }

    /// Marks the morning routine done. Repeating overwrites the time.
    pub fn complete_morning(&mut self, time: impl Into<String>) {
        self.morning = CompletionMark::done(time);
    }

    pub fn complete_microbreak(&mut self, time: impl Into<String>) -> MicrobreakOutcome {
        if self.microbreaks.len() >= REQUIRED_MICROBREAKS {
            return MicrobreakOutcome::AlreadyAtCap;
        }
        self.microbreaks.push(CompletionMark::done(time));
        MicrobreakOutcome::Recorded {
            count: self.microbreaks.len(),
        }
    }

    /// Marks the evening routine done. Repeating overwrites the time.
    pub fn complete_evening(&mut self, time: impl Into<String>) {
        self.evening = CompletionMark::done(time);
    }
}
