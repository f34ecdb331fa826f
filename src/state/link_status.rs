/// Link status definitions for tracking frontier progress
///
/// A link starts out unprocessed and moves exactly once to one of the two
/// terminal states.
use std::fmt;

/// Represents the lifecycle status of a link in the frontier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkStatus {
    /// Link has been discovered but not yet fetched
    Unprocessed,

    /// Link was fetched successfully and its content handed to the hooks
    Processed,

    /// Link could not be fetched after all retries
    Failed,
}

impl LinkStatus {
    /// Returns true if no further transition is allowed from this status
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Unprocessed)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    ///
    /// Only `Unprocessed -> Processed` and `Unprocessed -> Failed` are allowed.
    pub fn can_transition_to(&self, next: LinkStatus) -> bool {
        matches!(
            (self, next),
            (Self::Unprocessed, Self::Processed) | (Self::Unprocessed, Self::Failed)
        )
    }

    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Unprocessed => "UNPROCESSED",
            Self::Processed => "PROCESSED",
            Self::Failed => "FAILED",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "UNPROCESSED" => Some(Self::Unprocessed),
            "PROCESSED" => Some(Self::Processed),
            "FAILED" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Returns all possible link statuses
    pub fn all() -> [Self; 3] {
        [Self::Unprocessed, Self::Processed, Self::Failed]
    }
}

impl fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_string())
    }
}
