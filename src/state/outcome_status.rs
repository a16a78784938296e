/// Outcome status definitions for scrape attempts
///
/// An outcome is keyed by item id and overwritten on every attempt, so the
/// status always describes the most recent attempt only.
use std::fmt;

/// Result of the most recent extraction attempt for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutcomeStatus {
    /// Specifications were extracted and appended to the output log
    Ok,

    /// Navigation or extraction failed; the detail is stored alongside
    Error,
}

impl OutcomeStatus {
    /// Returns true if this represents a successful attempt
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Error => "error",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "ok" => Some(Self::Ok),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for OutcomeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
