//! The terminal/non-terminal classification every downstream client status
//! reduces to, so the orchestrator (C5) never string-matches
//! a status value itself.

/// What a poll of a downstream job means for the orchestrator's stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Keep polling; `Stage::run` should return `Retry`.
    NonTerminal,
    /// The job finished successfully.
    Success,
    /// The job finished with a failure that should end the chain.
    Failure,
}
