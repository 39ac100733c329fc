//! Gestational age value type and its `"8s 1d"` text form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{CalcResult, GestationError};

/// Largest week count accepted from typed text. Anything above is a typo.
pub const MAX_ENTERED_WEEKS: u32 = 45;

/// Completed weeks plus remainder days since the pregnancy start date.
///
/// `days` is always within `0..=6`; every constructor (including serde
/// deserialization) rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "RawGestationalAge")]
pub struct GestationalAge {
    weeks: u32,
    days: u32,
}

impl GestationalAge {
    /// Zero age, used when the reference date precedes the start date.
    pub const ZERO: GestationalAge = GestationalAge { weeks: 0, days: 0 };

    /// Create an age from weeks and days.
    pub fn new(weeks: u32, days: u32) -> CalcResult<Self> {
        if days > 6 {
            return Err(GestationError::MalformedGestationalAge(format!(
                "{}s {}d: days must be within 0..=6",
                weeks, days
            )));
        }
        Ok(Self { weeks, days })
    }

    /// Split a day count into completed weeks and remainder days.
    pub fn from_total_days(total_days: u32) -> Self {
        Self {
            weeks: total_days / 7,
            days: total_days % 7,
        }
    }

    pub fn weeks(&self) -> u32 {
        self.weeks
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    /// Total elapsed days (`weeks * 7 + days`), widened so any `u32` week
    /// count fits.
    pub fn total_days(&self) -> u64 {
        u64::from(self.weeks) * 7 + u64::from(self.days)
    }
}

impl fmt::Display for GestationalAge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}s {}d", self.weeks, self.days)
    }
}

impl FromStr for GestationalAge {
    type Err = GestationError;

    /// Parse `"<weeks>s <days>d"`, e.g. `"8s 1d"` or `"12s0d"`.
    fn from_str(s: &str) -> CalcResult<Self> {
        let malformed = || GestationError::MalformedGestationalAge(s.to_string());

        let text = s.trim();
        let (weeks_part, rest) = text
            .split_once(|c: char| c == 's' || c == 'S')
            .ok_or_else(malformed)?;
        let days_part = rest
            .trim()
            .strip_suffix(|c: char| c == 'd' || c == 'D')
            .ok_or_else(malformed)?;

        let weeks = parse_count(weeks_part.trim()).ok_or_else(malformed)?;
        let days = parse_count(days_part.trim()).ok_or_else(malformed)?;

        if weeks > MAX_ENTERED_WEEKS || days > 6 {
            return Err(malformed());
        }

        Ok(Self { weeks, days })
    }
}

/// Parse a non-empty run of ASCII digits.
fn parse_count(text: &str) -> Option<u32> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Unvalidated wire form.
#[derive(Deserialize)]
struct RawGestationalAge {
    weeks: u32,
    days: u32,
}

impl TryFrom<RawGestationalAge> for GestationalAge {
    type Error = GestationError;

    fn try_from(raw: RawGestationalAge) -> Result<Self, Self::Error> {
        GestationalAge::new(raw.weeks, raw.days)
    }
}
