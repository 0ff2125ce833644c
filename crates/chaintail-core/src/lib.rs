//! chaintail-core: reorg-aware block reader for fork-prone chains.
//!
//! # Architecture
//!
//! ```text
//! TailerBuilder → ChainTailer
//!                     ├── ChainAdapter            (head number, block by number)
//!                     ├── BlockHistory            (bounded window of committed blocks)
//!                     ├── fork resolution         (walk back, refetch, compare parent hash)
//!                     └── HistoryExhaustedHandler (what to do when a fork outruns history)
//! ```
//!
//! The consumer calls [`ChainTailer::advance`] in a loop and applies each
//! [`NextBlock`]: undo-then-apply when `is_rollback`, apply when
//! `is_new_block`, nothing otherwise.

pub mod adapter;
pub mod config;
pub mod error;
pub mod exhausted;
pub mod fork;
pub mod history;
pub mod memory;
pub mod tailer;
pub mod types;

pub use adapter::ChainAdapter;
pub use config::{TailerBuilder, TailerConfig};
pub use error::{AdapterError, TailerError};
pub use exhausted::{ExhaustedContext, ExhaustedRecovery, FailOnExhausted, HistoryExhaustedHandler};
pub use fork::ForkReport;
pub use history::BlockHistory;
pub use memory::MemoryChain;
pub use tailer::ChainTailer;
pub use types::{Block, BlockInfo, NextBlock, ReaderInfo, TailerState};
