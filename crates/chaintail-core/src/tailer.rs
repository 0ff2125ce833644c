//! The chain tailer: turns a fork-prone chain into an ordered block stream.
//!
//! Each [`advance`](ChainTailer::advance) call moves at most one block:
//!
//! 1. refresh the head when caught up (or unknown)
//! 2. fetch the block after the current one
//! 3. commit it if its parent hash matches the current block
//! 4. otherwise walk back through history, refetching the chain's present
//!    block at the current height each step, until the parent hashes line up
//!    again; the reconciled block is returned with `is_rollback = true`

use crate::adapter::ChainAdapter;
use crate::config::TailerConfig;
use crate::error::TailerError;
use crate::exhausted::{
    ExhaustedContext, ExhaustedRecovery, FailOnExhausted, HistoryExhaustedHandler,
};
use crate::fork::ForkReport;
use crate::history::BlockHistory;
use crate::types::{Block, NextBlock, ReaderInfo, TailerState};

/// Reorg-aware reader over a [`ChainAdapter`].
///
/// All state is owned by the tailer and mutated only through `&mut self`, so
/// at most one `advance`/`seek` can be in flight. An adapter error aborts the
/// call; calling `advance` again afterwards is safe.
pub struct ChainTailer<A: ChainAdapter> {
    adapter: A,
    on_exhausted: Box<dyn HistoryExhaustedHandler>,
    start_at_block: i64,
    only_irreversible: bool,
    /// Last known head; `0` = unknown.
    head_block_number: u64,
    current_block_number: i64,
    current_block: Option<Block<A::Payload>>,
    history: BlockHistory<A::Payload>,
    is_first_block: bool,
    state: TailerState,
    /// Set once fork resolution starts; cleared when a rollback result has
    /// been handed to the caller.
    pending_rollback: bool,
    exhausted_at: Option<u64>,
    last_fork: Option<ForkReport>,
}

impl<A: ChainAdapter> ChainTailer<A> {
    /// Create a tailer that fails when a fork outruns its history.
    pub fn new(config: TailerConfig, adapter: A) -> Result<Self, TailerError> {
        config.validate()?;
        Ok(Self::with_handler(config, adapter, Box::new(FailOnExhausted)))
    }

    pub(crate) fn with_handler(
        config: TailerConfig,
        adapter: A,
        on_exhausted: Box<dyn HistoryExhaustedHandler>,
    ) -> Self {
        // Heights start at 1, so a start of 0 is the same as 1.
        let start_at_block = if config.start_at_block == 0 { 1 } else { config.start_at_block };
        let current_block_number = if start_at_block > 0 {
            start_at_block - 1
        } else {
            start_at_block
        };
        Self {
            adapter,
            on_exhausted,
            start_at_block,
            only_irreversible: config.only_irreversible,
            head_block_number: 0,
            current_block_number,
            current_block: None,
            history: BlockHistory::new(config.max_history_length),
            is_first_block: false,
            state: TailerState::Uninitialized,
            pending_rollback: false,
            exhausted_at: None,
            last_fork: None,
        }
    }

    // ─── Operations ──────────────────────────────────────────────────────────

    /// Move the stream forward by at most one block.
    ///
    /// When already at the head, returns the current block again with both
    /// flags `false`.
    pub async fn advance(&mut self) -> Result<NextBlock<A::Payload>, TailerError> {
        self.ensure_not_exhausted()?;

        let mut is_rollback = false;
        let mut is_new_block = false;

        if self.head_block_number == 0 || self.current_block_number >= self.head_as_i64() {
            self.refresh_head().await?;
        }

        if self.current_block_number < 0 && self.history.is_empty() {
            let resolved = (self.head_as_i64() + self.current_block_number).max(0);
            tracing::info!(
                head = self.head_block_number,
                relative = self.current_block_number,
                first_block = resolved + 1,
                "Resolved relative start block"
            );
            self.current_block_number = resolved;
            self.start_at_block = resolved + 1;
        }

        if self.current_block_number < self.head_as_i64() {
            let next = (self.current_block_number + 1) as u64;
            let candidate = self.fetch(next).await?;

            let extends = self
                .current_block
                .as_ref()
                .is_some_and(|current| current.hash() == candidate.parent_hash());

            if extends || self.history.is_empty() {
                self.commit(candidate);
                is_new_block = true;
            } else {
                if let Some(current) = &self.current_block {
                    tracing::warn!(
                        at = next,
                        parent_hash = %candidate.parent_hash(),
                        current_number = current.number(),
                        current_hash = %current.hash(),
                        "Fork detected: parent hash does not match current block"
                    );
                }
                self.resolve_fork(next).await?;
                is_new_block = true;
                is_rollback = true;
                // The new branch may be shorter or longer than the old one.
                // A failed refresh must not swallow the rollback result: the
                // head is left unknown and refreshed on the next call.
                if let Err(err) = self.refresh_head().await {
                    tracing::warn!(
                        error = %err,
                        block_number = self.current_block_number,
                        "Head refresh after fork resolution failed, retrying on next advance"
                    );
                    self.head_block_number = 0;
                }
            }

            self.is_first_block = self.current_block_number == self.start_at_block;
        }

        let block = self
            .current_block
            .clone()
            .ok_or(TailerError::NoCurrentBlock {
                block_number: self.current_block_number,
            })?;

        // An earlier call failed part way through fork resolution.
        if self.pending_rollback {
            is_rollback = true;
            is_new_block = true;
            self.pending_rollback = false;
        }

        Ok(NextBlock {
            block,
            is_rollback,
            is_new_block,
        })
    }

    /// Position the stream so the next [`advance`](Self::advance) yields
    /// `block_number`. Does not emit the block itself.
    pub async fn seek(&mut self, block_number: u64) -> Result<(), TailerError> {
        let target = match i64::try_from(block_number) {
            Ok(target) if target > 0 && target >= self.start_at_block => target,
            _ => {
                return Err(TailerError::InvalidSeek {
                    requested: block_number,
                    start_at_block: self.start_at_block,
                })
            }
        };
        self.ensure_not_exhausted()?;

        if block_number == 1 {
            self.history.clear();
            self.current_block = None;
            self.head_block_number = 0;
            self.current_block_number = 0;
            self.state = TailerState::Uninitialized;
            tracing::debug!("Seeked to the start of the chain");
            return Ok(());
        }

        let predecessor = block_number - 1;
        if self.current_block.as_ref().map(Block::number) != Some(predecessor) {
            let block = match self.history.take_back_to(predecessor) {
                Some(block) => {
                    tracing::debug!(block_number, "Seek reused block history");
                    block
                }
                None => {
                    let block = self.fetch(predecessor).await?;
                    self.history.clear();
                    block
                }
            };
            self.current_block = Some(block);
        }

        self.head_block_number = 0;
        self.current_block_number = target - 1;
        self.state = TailerState::Tracking;
        tracing::debug!(block_number, history = self.history.len(), "Seeked");
        Ok(())
    }

    // ─── Accessors ───────────────────────────────────────────────────────────

    pub fn current_block(&self) -> Option<&Block<A::Payload>> {
        self.current_block.as_ref()
    }

    pub fn current_block_number(&self) -> i64 {
        self.current_block_number
    }

    /// Last known head, `0` while unknown.
    pub fn head_block_number(&self) -> u64 {
        self.head_block_number
    }

    pub fn start_at_block(&self) -> i64 {
        self.start_at_block
    }

    pub fn only_irreversible(&self) -> bool {
        self.only_irreversible
    }

    /// `true` if the last block handed out by `advance` was the stream's first.
    pub fn is_first_block(&self) -> bool {
        self.is_first_block
    }

    pub fn history(&self) -> &BlockHistory<A::Payload> {
        &self.history
    }

    pub fn state(&self) -> TailerState {
        self.state
    }

    pub fn last_fork(&self) -> Option<&ForkReport> {
        self.last_fork.as_ref()
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn info(&self) -> ReaderInfo {
        ReaderInfo {
            current_block_number: self.current_block_number,
            start_at_block: self.start_at_block,
            head_block_number: self.head_block_number,
            only_irreversible: self.only_irreversible,
            history_length: self.history.len(),
            state: self.state,
        }
    }

    // ─── Internals ───────────────────────────────────────────────────────────

    fn head_as_i64(&self) -> i64 {
        i64::try_from(self.head_block_number).unwrap_or(i64::MAX)
    }

    fn ensure_not_exhausted(&self) -> Result<(), TailerError> {
        match self.exhausted_at {
            Some(block_number) => Err(TailerError::HistoryExhausted {
                block_number,
                max_history_length: self.history.max_length(),
            }),
            None => Ok(()),
        }
    }

    async fn refresh_head(&mut self) -> Result<(), TailerError> {
        self.head_block_number = self.adapter.head_block_number(self.only_irreversible).await?;
        tracing::trace!(
            head = self.head_block_number,
            only_irreversible = self.only_irreversible,
            "Refreshed head block number"
        );
        Ok(())
    }

    async fn fetch(&self, number: u64) -> Result<Block<A::Payload>, TailerError> {
        let block = self.adapter.block(number).await?;
        if block.number() != number {
            return Err(TailerError::Invariant(format!(
                "adapter returned block {} when asked for block {number}",
                block.number()
            )));
        }
        Ok(block)
    }

    fn commit(&mut self, block: Block<A::Payload>) {
        if let Some(previous) = self.current_block.take() {
            self.history.push(previous);
        }
        tracing::debug!(number = block.number(), hash = %block.hash(), "Committed block");
        self.current_block_number = block.number() as i64;
        self.current_block = Some(block);
        self.state = TailerState::Tracking;
    }

    /// Walk back until the chain's present block at the current height
    /// extends the newest history entry.
    async fn resolve_fork(&mut self, detected_at: u64) -> Result<(), TailerError> {
        if self.current_block.is_none() {
            return Err(TailerError::Invariant(
                "fork resolution started without a current block".into(),
            ));
        }
        self.state = TailerState::ResolvingFork;
        self.pending_rollback = true;
        let mut depth = 0u64;

        while let Some(previous) = self.history.newest() {
            let (previous_number, previous_hash) = (previous.number(), previous.hash().to_owned());
            let current_number = self.current_number()?;

            tracing::info!(block_number = current_number, "Refetching block");
            let refetched = self.fetch(current_number).await?;

            if refetched.parent_hash() == previous_hash {
                tracing::info!(
                    block_number = refetched.number(),
                    block_hash = %refetched.hash(),
                    parent_hash = %refetched.parent_hash(),
                    previous_number,
                    previous_hash = %previous_hash,
                    depth,
                    "Fork resolved"
                );
                self.current_block = Some(refetched);
                self.current_block_number = previous_number as i64 + 1;
                self.state = TailerState::Tracking;
                self.last_fork = Some(ForkReport::new(detected_at, current_number, depth, false));
                return Ok(());
            }

            tracing::warn!(
                block_number = refetched.number(),
                block_hash = %refetched.hash(),
                parent_hash = %refetched.parent_hash(),
                previous_number,
                previous_hash = %previous_hash,
                "Fork mismatch: rolling back one block"
            );
            self.current_block = self.history.pop_newest();
            self.current_block_number = previous_number as i64;
            depth += 1;
        }

        self.history_exhausted(detected_at, depth).await
    }

    async fn history_exhausted(&mut self, detected_at: u64, depth: u64) -> Result<(), TailerError> {
        let ctx = match &self.current_block {
            Some(current) => ExhaustedContext {
                block_number: current.number(),
                block_hash: current.hash().to_owned(),
                detected_at,
                max_history_length: self.history.max_length(),
            },
            None => {
                return Err(TailerError::Invariant(
                    "history exhausted without a current block".into(),
                ))
            }
        };

        let recovery = match self.on_exhausted.on_history_exhausted(&ctx) {
            Ok(recovery) => recovery,
            Err(err) => {
                self.state = TailerState::Exhausted;
                self.exhausted_at = Some(ctx.block_number);
                return Err(err);
            }
        };

        if recovery == ExhaustedRecovery::ReanchorIrreversible {
            self.only_irreversible = true;
        }
        let anchor = self.fetch(ctx.block_number).await?;
        tracing::warn!(
            block_number = anchor.number(),
            block_hash = %anchor.hash(),
            abandoned_hash = %ctx.block_hash,
            only_irreversible = self.only_irreversible,
            "Re-anchored after exhausting block history"
        );
        self.current_block_number = anchor.number() as i64;
        self.current_block = Some(anchor);
        self.state = TailerState::Tracking;
        self.last_fork = Some(ForkReport::new(detected_at, ctx.block_number, depth, true));
        Ok(())
    }

    fn current_number(&self) -> Result<u64, TailerError> {
        self.current_block
            .as_ref()
            .map(Block::number)
            .ok_or_else(|| TailerError::Invariant("current block vanished during fork resolution".into()))
    }
}
