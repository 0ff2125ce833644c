//! The chain adapter seam.
//!
//! The tailer never talks to a node itself. Everything it knows about the
//! chain comes through these two calls, which an adapter implements over
//! whatever transport the chain speaks.

use async_trait::async_trait;

use crate::error::AdapterError;
use crate::types::Block;

/// Source of blocks for a [`ChainTailer`](crate::tailer::ChainTailer).
///
/// `block(n)` must return the block the adapter *currently* believes is at
/// height `n`, and must not pin or cache results per height: after a reorg
/// the same call is expected to return a different block. The tailer relies
/// on this during fork resolution.
#[async_trait]
pub trait ChainAdapter: Send + Sync {
    /// Payload carried by each block; opaque to the tailer.
    type Payload: Clone + Send + Sync;

    /// Current chain tip. With `only_irreversible` set, the last block the
    /// adapter considers irreversible.
    async fn head_block_number(&self, only_irreversible: bool) -> Result<u64, AdapterError>;

    /// Fetch the block at `number`.
    async fn block(&self, number: u64) -> Result<Block<Self::Payload>, AdapterError>;
}

#[async_trait]
impl<A: ChainAdapter + ?Sized> ChainAdapter for std::sync::Arc<A> {
    type Payload = A::Payload;

    async fn head_block_number(&self, only_irreversible: bool) -> Result<u64, AdapterError> {
        (**self).head_block_number(only_irreversible).await
    }

    async fn block(&self, number: u64) -> Result<Block<Self::Payload>, AdapterError> {
        (**self).block(number).await
    }
}
