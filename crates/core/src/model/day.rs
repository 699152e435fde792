use std::fmt;

use crate::program::TOTAL_DAYS;

/// Position in the program, always within `1..=TOTAL_DAYS`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProgramDay(u32);

impl ProgramDay {
    pub const FIRST: Self = Self(1);
    pub const LAST: Self = Self(TOTAL_DAYS);

    /// Clamps any integer into the valid day range.
    #[must_use]
    pub fn clamped(day: i64) -> Self {
        let day = day.clamp(1, i64::from(TOTAL_DAYS));
        Self(u32::try_from(day).unwrap_or(1))
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.0 >= TOTAL_DAYS
    }

    /// The following day, or `None` on the final day.
    #[must_use]
    pub fn next(&self) -> Option<Self> {
        if self.is_last() {
            None
        } else {
            Some(Self(self.0 + 1))
        }
    }
}

impl Default for ProgramDay {
    fn default() -> Self {
        Self::FIRST
    }
}

impl fmt::Debug for ProgramDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProgramDay({})", self.0)
    }
}

impl fmt::Display for ProgramDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_values() {
        assert_eq!(ProgramDay::clamped(0).value(), 1);
        assert_eq!(ProgramDay::clamped(-40).value(), 1);
        assert_eq!(ProgramDay::clamped(999).value(), TOTAL_DAYS);
        assert_eq!(ProgramDay::clamped(i64::MAX).value(), TOTAL_DAYS);
        assert_eq!(ProgramDay::clamped(42).value(), 42);
    }

    #[test]
    fn next_stops_at_last_day() {
        assert_eq!(ProgramDay::clamped(83).next(), Some(ProgramDay::LAST));
        assert_eq!(ProgramDay::LAST.next(), None);
    }
}
