//! Short text checkpoint of `(day, phase)`, e.g. `POSTURE-D11-P2`.
//!
//! The code carries no session detail or settings. Decoded values are not
//! range checked; callers clamp the day when applying it.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static SHARE_CODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^POSTURE-D([0-9]+)-P([0-9]+)$").expect("share code pattern is valid")
});

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ShareCodeError {
    #[error("not a share code: {raw:?}")]
    Malformed { raw: String },
}

/// Decoded share code payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShareCode {
    pub day: u32,
    pub phase: u32,
}

impl ShareCode {
    #[must_use]
    pub fn new(day: u32, phase: u32) -> Self {
        Self { day, phase }
    }
}

impl fmt::Display for ShareCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "POSTURE-D{}-P{}", self.day, self.phase)
    }
}

impl FromStr for ShareCode {
    type Err = ShareCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode(s).ok_or_else(|| ShareCodeError::Malformed { raw: s.to_owned() })
    }
}

/// Renders `POSTURE-D{day}-P{phase}` with plain decimal numbers.
///
/// # Examples
///
/// ```
/// assert_eq!(posture_core::share_code::encode(11, 2), "POSTURE-D11-P2");
/// ```
#[must_use]
pub fn encode(day: u32, phase: u32) -> String {
    ShareCode::new(day, phase).to_string()
}

/// Parses a share code, ignoring letter case.
///
/// Anything that is not exactly `POSTURE-D<digits>-P<digits>` yields `None`,
/// including surrounding whitespace. Numbers too large for `u32` saturate at
/// `u32::MAX`; the caller clamps them.
#[must_use]
pub fn decode(code: &str) -> Option<ShareCode> {
    let caps = SHARE_CODE_RE.captures(code)?;
    let day = saturating_digits(caps.get(1)?.as_str());
    let phase = saturating_digits(caps.get(2)?.as_str());
    Some(ShareCode { day, phase })
}

fn saturating_digits(digits: &str) -> u32 {
    digits.bytes().fold(0u32, |acc, digit| {
        acc.saturating_mul(10)
            .saturating_add(u32::from(digit - b'0'))
    })
}
