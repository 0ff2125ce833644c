//! What to do when a fork reaches further back than the retained history.
//!
//! The right answer is deployment specific (replay from an older height,
//! accept irreversible-only reading, page an operator), so it is injected
//! into the tailer as a strategy. The default gives up.

use crate::error::TailerError;

/// Facts handed to a [`HistoryExhaustedHandler`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExhaustedContext {
    /// Oldest block the tailer walked back to (from the abandoned branch).
    pub block_number: u64,
    pub block_hash: String,
    /// Block at which the fork was first noticed.
    pub detected_at: u64,
    pub max_history_length: usize,
}

/// How the tailer should continue after history ran out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustedRecovery {
    /// Refetch the block at `block_number` and trust it as a fresh anchor,
    /// with empty history.
    Reanchor,
    /// Like [`Reanchor`](Self::Reanchor), and only read irreversible blocks
    /// from now on.
    ReanchorIrreversible,
}

/// Strategy invoked once per exhausted fork resolution.
///
/// Returning `Err` leaves the tailer in the terminal
/// [`Exhausted`](crate::types::TailerState::Exhausted) state.
pub trait HistoryExhaustedHandler: Send + Sync {
    fn on_history_exhausted(&self, ctx: &ExhaustedContext)
        -> Result<ExhaustedRecovery, TailerError>;
}

impl<F> HistoryExhaustedHandler for F
where
    F: Fn(&ExhaustedContext) -> Result<ExhaustedRecovery, TailerError> + Send + Sync,
{
    fn on_history_exhausted(
        &self,
        ctx: &ExhaustedContext,
    ) -> Result<ExhaustedRecovery, TailerError> {
        self(ctx)
    }
}

/// Default handler: log and fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct FailOnExhausted;

impl HistoryExhaustedHandler for FailOnExhausted {
    fn on_history_exhausted(
        &self,
        ctx: &ExhaustedContext,
    ) -> Result<ExhaustedRecovery, TailerError> {
        tracing::error!(
            block_number = ctx.block_number,
            block_hash = %ctx.block_hash,
            detected_at = ctx.detected_at,
            max_history_length = ctx.max_history_length,
            "Fork resolution exhausted block history"
        );
        Err(TailerError::HistoryExhausted {
            block_number: ctx.block_number,
            max_history_length: ctx.max_history_length,
        })
    }
}
