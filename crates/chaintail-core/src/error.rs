//! Error types for the chain tailer and its adapters.

use thiserror::Error;

/// Errors a [`ChainAdapter`](crate::adapter::ChainAdapter) may return.
///
/// The tailer never retries these; they abort the in-progress call and reach
/// the caller unchanged inside [`TailerError::Adapter`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    /// The adapter has no block at the requested height.
    #[error("Block {block_number} not found")]
    NotFound { block_number: u64 },

    /// Transport or node-side failure.
    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("{0}")]
    Other(String),
}

impl AdapterError {
    /// Returns `true` if the adapter reported a missing block.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Errors that can occur while advancing or seeking the tailer.
#[derive(Debug, Error)]
pub enum TailerError {
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    #[error("Cannot seek to block {requested}: stream starts at block {start_at_block}")]
    InvalidSeek { requested: u64, start_at_block: i64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A fork reached further back than the retained history.
    #[error(
        "Fork resolution exhausted block history at block {block_number} \
         (max history length {max_history_length})"
    )]
    HistoryExhausted {
        block_number: u64,
        max_history_length: usize,
    },

    /// Nothing has been committed yet and the chain has no block at the
    /// start position: the chain is empty, or `start_at_block` lies beyond
    /// the head. Calling `advance` again once the chain grows recovers.
    #[error("No current block after advancing to block {block_number}")]
    NoCurrentBlock { block_number: i64 },

    #[error("Invariant violated: {0}")]
    Invariant(String),
}

impl TailerError {
    /// Returns `true` if the tailer cannot continue without outside help.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::HistoryExhausted { .. } | Self::Invariant(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_errors_pass_through() {
        let err: TailerError = AdapterError::NotFound { block_number: 7 }.into();
        assert_eq!(err.to_string(), "Block 7 not found");
        assert!(!err.is_fatal());
        match err {
            TailerError::Adapter(inner) => assert!(inner.is_not_found()),
            other => panic!("expected adapter error, got {other:?}"),
        }
    }

    #[test]
    fn exhausted_is_fatal() {
        let err = TailerError::HistoryExhausted {
            block_number: 40,
            max_history_length: 2,
        };
        assert!(err.is_fatal());
        assert!(err.to_string().contains("block 40"));
    }

    #[test]
    fn waiting_for_start_block_is_not_fatal() {
        let err = TailerError::NoCurrentBlock { block_number: 49 };
        assert!(!err.is_fatal());
        assert!(TailerError::Invariant("bad height".into()).is_fatal());
    }
}
