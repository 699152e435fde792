//! Fixed shape of the 12-week program: length, daily requirements, and the
//! four phases the days are bucketed into.

use std::fmt;

/// Program length in days (12 weeks).
pub const TOTAL_DAYS: u32 = 84;

/// Micro-breaks that must be logged before a day counts as complete.
pub const REQUIRED_MICROBREAKS: usize = 3;

pub const DAYS_PER_WEEK: u32 = 7;

/// Named stage of the program, derived from the program day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Release,
    Activate,
    Strengthen,
    Integrate,
}

impl Phase {
    pub const ALL: [Phase; 4] = [
        Phase::Release,
        Phase::Activate,
        Phase::Strengthen,
        Phase::Integrate,
    ];

    /// One-based phase number as shown to the user and embedded in share codes.
    #[must_use]
    pub fn number(self) -> u32 {
        match self {
            Phase::Release => 1,
            Phase::Activate => 2,
            Phase::Strengthen => 3,
            Phase::Integrate => 4,
        }
    }

    #[must_use]
    pub fn from_number(number: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|phase| phase.number() == number)
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Phase::Release => "Release",
            Phase::Activate => "Activate",
            Phase::Strengthen => "Strengthen",
            Phase::Integrate => "Integrate",
        }
    }

    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            Phase::Release => "Loosen tight muscles and restore range of motion",
            Phase::Activate => "Wake up weak, inhibited muscles",
            Phase::Strengthen => "Build endurance in postural stabilizers",
            Phase::Integrate => "Functional patterns and maintenance habits",
        }
    }

    /// Inclusive week range covered by this phase.
    #[must_use]
    pub fn weeks(self) -> (u32, u32) {
        let last = self.number() * 3;
        (last - 2, last)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Phase {}: {}", self.number(), self.name())
    }
}
