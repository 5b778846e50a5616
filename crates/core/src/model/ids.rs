use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::week::WeekError;

/// Number of weeks in the curriculum.
pub const TOTAL_WEEKS: u8 = 23;

/// A curriculum week, always within `1..=TOTAL_WEEKS`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct WeekNumber(u8);

impl WeekNumber {
    /// The first week of the curriculum.
    pub const FIRST: Self = Self(1);
    /// The last week of the curriculum.
    pub const LAST: Self = Self(TOTAL_WEEKS);

    /// Creates a new `WeekNumber`.
    ///
    /// # Errors
    ///
    /// Returns `WeekError::OutOfRange` if `value` is outside `1..=23`.
    pub fn new(value: u8) -> Result<Self, WeekError> {
        if (1..=TOTAL_WEEKS).contains(&value) {
            Ok(Self(value))
        } else {
            Err(WeekError::OutOfRange(u32::from(value)))
        }
    }

    /// Returns the underlying week number.
    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }

    /// The week after this one, or `None` past the end of the curriculum.
    #[must_use]
    pub fn next(&self) -> Option<Self> {
        Self::new(self.0 + 1).ok()
    }

    /// Every week in curriculum order.
    pub fn all() -> impl Iterator<Item = Self> {
        (1..=TOTAL_WEEKS).map(Self)
    }
}

impl TryFrom<u8> for WeekNumber {
    type Error = WeekError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<WeekNumber> for u8 {
    fn from(week: WeekNumber) -> Self {
        week.0
    }
}

/// Identifier of an idea inside a week bundle.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IdeaId(u32);

impl IdeaId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }
}

/// Store-assigned identifier of an execution log entry.
///
/// Opaque to the client: it is never generated locally, only echoed back
/// to the store for deletes.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogEntryId(String);

impl LogEntryId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random id. Only store implementations should call this.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for WeekNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "WeekNumber({})", self.0)
    }
}

impl fmt::Debug for IdeaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "IdeaId({})", self.0)
    }
}

impl fmt::Debug for LogEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LogEntryId({})", self.0)
    }
}

// ─── Display Implementations ───────────────────────────────────────────────────

impl fmt::Display for WeekNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl fmt::Display for IdeaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for LogEntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─── FromStr Implementations ───────────────────────────────────────────────────

impl FromStr for WeekNumber {
    type Err = WeekError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u8 = s
            .trim()
            .parse()
            .map_err(|_| WeekError::Unparseable(s.to_owned()))?;
        Self::new(raw)
    }
}

impl FromStr for LogEntryId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
