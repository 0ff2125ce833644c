//! In-memory chain adapter.
//!
//! Holds a mutable map of blocks by height. Useful for tests, replays and
//! simulations where a deterministic, reorg-able chain is needed.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::adapter::ChainAdapter;
use crate::error::AdapterError;
use crate::types::Block;

/// A simulated chain.
///
/// Wrap it in an `Arc` to keep a handle for reorganizing the chain while a
/// tailer reads from it.
pub struct MemoryChain<P> {
    blocks: Mutex<BTreeMap<u64, Block<P>>>,
    irreversible: Mutex<u64>,
}

impl<P> Default for MemoryChain<P> {
    fn default() -> Self {
        Self {
            blocks: Mutex::new(BTreeMap::new()),
            irreversible: Mutex::new(0),
        }
    }
}

impl<P: Clone> MemoryChain<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a chain from an iterator of blocks.
    pub fn from_blocks(blocks: impl IntoIterator<Item = Block<P>>) -> Self {
        let chain = Self::new();
        chain.extend(blocks);
        chain
    }

    /// Insert or overwrite the block at its height.
    pub fn push(&self, block: Block<P>) {
        self.blocks.lock().unwrap().insert(block.number(), block);
    }

    pub fn extend(&self, blocks: impl IntoIterator<Item = Block<P>>) {
        let mut map = self.blocks.lock().unwrap();
        for block in blocks {
            map.insert(block.number(), block);
        }
    }

    /// Simulate a reorg: drop every block at or above `number`, then insert
    /// the replacement branch.
    pub fn replace_from(&self, number: u64, branch: impl IntoIterator<Item = Block<P>>) {
        let mut map = self.blocks.lock().unwrap();
        map.split_off(&number);
        for block in branch {
            map.insert(block.number(), block);
        }
    }

    /// Drop every block above `number`.
    pub fn truncate_after(&self, number: u64) {
        let Some(above) = number.checked_add(1) else {
            return;
        };
        self.blocks.lock().unwrap().split_off(&above);
    }

    pub fn set_irreversible(&self, number: u64) {
        *self.irreversible.lock().unwrap() = number;
    }

    /// Highest stored height, `0` when empty.
    pub fn tip(&self) -> u64 {
        self.blocks
            .lock()
            .unwrap()
            .keys()
            .next_back()
            .copied()
            .unwrap_or(0)
    }

    pub fn get(&self, number: u64) -> Option<Block<P>> {
        self.blocks.lock().unwrap().get(&number).cloned()
    }
}

#[async_trait]
impl<P: Clone + Send + Sync> ChainAdapter for MemoryChain<P> {
    type Payload = P;

    async fn head_block_number(&self, only_irreversible: bool) -> Result<u64, AdapterError> {
        let tip = self.tip();
        if only_irreversible {
            Ok((*self.irreversible.lock().unwrap()).min(tip))
        } else {
            Ok(tip)
        }
    }

    async fn block(&self, number: u64) -> Result<Block<P>, AdapterError> {
        self.get(number)
            .ok_or(AdapterError::NotFound { block_number: number })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockInfo;

    fn b(number: u64, branch: &str) -> Block<()> {
        let parent = if number == 1 {
            "0x0".to_string()
        } else {
            format!("0x{}{}", branch, number - 1)
        };
        Block::new(BlockInfo::new(number, format!("0x{branch}{number}"), parent), ())
    }

    #[tokio::test]
    async fn head_and_fetch() {
        let chain = MemoryChain::from_blocks((1..=5).map(|n| b(n, "a")));
        assert_eq!(chain.head_block_number(false).await.unwrap(), 5);
        assert_eq!(chain.block(3).await.unwrap().hash(), "0xa3");
        let err = chain.block(9).await.unwrap_err();
        assert_eq!(err, AdapterError::NotFound { block_number: 9 });
    }

    #[tokio::test]
    async fn irreversible_head() {
        let chain = MemoryChain::from_blocks((1..=5).map(|n| b(n, "a")));
        chain.set_irreversible(3);
        assert_eq!(chain.head_block_number(true).await.unwrap(), 3);
        chain.set_irreversible(50);
        assert_eq!(chain.head_block_number(true).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn replace_from_rewrites_branch() {
        let chain = MemoryChain::from_blocks((1..=10).map(|n| b(n, "a")));
        chain.replace_from(8, (8..=9).map(|n| b(n, "b")));
        assert_eq!(chain.tip(), 9);
        assert_eq!(chain.block(7).await.unwrap().hash(), "0xa7");
        assert_eq!(chain.block(8).await.unwrap().hash(), "0xb8");
        chain.truncate_after(8);
        assert_eq!(chain.tip(), 8);
    }

    #[test]
    fn truncate_after_max_height_keeps_everything() {
        let chain = MemoryChain::from_blocks((1..=3).map(|n| b(n, "a")));
        chain.truncate_after(u64::MAX);
        assert_eq!(chain.tip(), 3);
    }
}
