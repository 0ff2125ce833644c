//! Shared types for the tailing pipeline.

use serde::{Deserialize, Serialize};

// ─── BlockInfo ────────────────────────────────────────────────────────────────

/// Identity of a block: its height, its hash and the hash of its parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockInfo {
    /// Block number (height), starting at 1.
    pub number: u64,
    /// Block hash.
    pub hash: String,
    /// Hash of the block at `number - 1` on the same branch.
    pub parent_hash: String,
}

impl BlockInfo {
    pub fn new(number: u64, hash: impl Into<String>, parent_hash: impl Into<String>) -> Self {
        Self {
            number,
            hash: hash.into(),
            parent_hash: parent_hash.into(),
        }
    }

    /// Returns `true` if `parent` is the direct parent of `self`.
    pub fn extends(&self, parent: &BlockInfo) -> bool {
        self.number == parent.number + 1 && self.parent_hash == parent.hash
    }
}

// ─── Block ────────────────────────────────────────────────────────────────────

/// A block as handed out by the tailer.
///
/// The payload is whatever the adapter attaches (transactions, actions, raw
/// bytes); the tailer passes it through without looking at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block<P> {
    pub info: BlockInfo,
    pub payload: P,
}

impl<P> Block<P> {
    pub fn new(info: BlockInfo, payload: P) -> Self {
        Self { info, payload }
    }

    pub fn number(&self) -> u64 {
        self.info.number
    }

    pub fn hash(&self) -> &str {
        &self.info.hash
    }

    pub fn parent_hash(&self) -> &str {
        &self.info.parent_hash
    }
}

// ─── NextBlock ────────────────────────────────────────────────────────────────

/// Result of one [`ChainTailer::advance`](crate::tailer::ChainTailer::advance) call.
///
/// - `is_new_block == false`: nothing changed since the last call; the same
///   block is handed out again and the consumer should do nothing.
/// - `is_rollback == true`: a fork was reconciled; the consumer must undo
///   effects of blocks above `block.number() - 1` before applying `block`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextBlock<P> {
    pub block: Block<P>,
    pub is_rollback: bool,
    pub is_new_block: bool,
}

// ─── TailerState ──────────────────────────────────────────────────────────────

/// Lifecycle of a tailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TailerState {
    /// No block committed yet.
    Uninitialized,
    /// Advancing forward along the chain.
    Tracking,
    /// Walking back through history to find the branch point of a fork.
    ResolvingFork,
    /// A fork reached past the retained history and was not recovered.
    Exhausted,
}

impl std::fmt::Display for TailerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Tracking => write!(f, "tracking"),
            Self::ResolvingFork => write!(f, "resolving-fork"),
            Self::Exhausted => write!(f, "exhausted"),
        }
    }
}

// ─── ReaderInfo ───────────────────────────────────────────────────────────────

/// Point-in-time snapshot of a tailer's position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReaderInfo {
    pub current_block_number: i64,
    pub start_at_block: i64,
    /// Last known head; `0` while unknown.
    pub head_block_number: u64,
    pub only_irreversible: bool,
    pub history_length: usize,
    pub state: TailerState,
}

// ─── Tests ────────────────────────────────────────────────────────────────────
