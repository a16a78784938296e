/// Derived lifecycle of a discovered item
///
/// Items are never updated after discovery; their position in the lifecycle
/// is computed from the latest outcome recorded for them.
use super::OutcomeStatus;

/// Where an item stands with respect to extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemState {
    /// Discovered, never attempted
    Pending,

    /// Latest attempt succeeded
    Done,

    /// Latest attempt failed
    Failed,
}

impl ItemState {
    /// Computes the state from the latest recorded outcome, if any
    pub fn from_outcome(outcome: Option<OutcomeStatus>) -> Self {
        match outcome {
            None => Self::Pending,
            Some(status) if status.is_success() => Self::Done,
            Some(_) => Self::Failed,
        }
    }

    /// Returns true if the item belongs in the next work queue
    ///
    /// Done items are never re-queued. Failed items are re-queued only when
    /// `retry_errors` is set.
    pub fn is_pending(&self, retry_errors: bool) -> bool {
        match self {
            Self::Pending => true,
            Self::Done => false,
            Self::Failed => retry_errors,
        }
    }
}
