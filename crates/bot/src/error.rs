//! Error kinds surfaced across the bot facade.

use thiserror::Error;

/// `SearchDead` and `WorkerCrash` are also surfaced through
/// [`crate::BotPollResult::Dead`] rather than returned here — callers
/// that only poll never have to match on an `Err` for those two; both
/// are surfaced through the poll result, with no recovery until reset.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BotError {
    /// Illegal field size, bag mask inconsistent with queue, or an
    /// out-of-range piece enumeration. Rejected at the facade boundary
    /// with no state change.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A piece added via `add_next_piece` is not in the current bag
    /// residue while speculation is enabled. The caller must reset.
    #[error("piece is not consistent with the current bag residue")]
    UnsatisfiableQueue,

    /// Every surviving branch tops out. No recovery until reset.
    #[error("search space is exhausted: every branch tops out")]
    SearchDead,

    /// An unexpected internal worker failure, treated identically to
    /// `SearchDead` at the facade.
    #[error("worker thread failed: {0}")]
    WorkerCrash(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_are_non_empty() {
        assert!(!BotError::UnsatisfiableQueue.to_string().is_empty());
        assert!(!BotError::SearchDead.to_string().is_empty());
    }
}
