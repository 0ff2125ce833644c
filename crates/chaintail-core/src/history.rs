//! Block history: a bounded window of previously committed blocks, kept for
//! fork comparison and seek reuse.

use std::collections::VecDeque;

use crate::types::Block;

/// Previously committed blocks, oldest first.
///
/// This is a cache, not a source of truth: it only exists so the tailer can
/// compare parent hashes while walking back through a fork, and so a seek
/// into recent history does not refetch.
#[derive(Debug, Clone)]
pub struct BlockHistory<P> {
    window: VecDeque<Block<P>>,
    max_length: usize,
}

impl<P> BlockHistory<P> {
    pub fn new(max_length: usize) -> Self {
        Self {
            window: VecDeque::with_capacity(max_length.min(1024)),
            max_length,
        }
    }

    /// Append a block, evicting the oldest entries beyond `max_length`.
    pub fn push(&mut self, block: Block<P>) {
        self.window.push_back(block);
        while self.window.len() > self.max_length {
            self.window.pop_front();
        }
    }

    /// Newest block.
    pub fn newest(&self) -> Option<&Block<P>> {
        self.window.back()
    }

    pub fn pop_newest(&mut self) -> Option<Block<P>> {
        self.window.pop_back()
    }

    /// Scan newest to oldest for `number`.
    pub fn position_of(&self, number: u64) -> Option<usize> {
        self.window.iter().rposition(|b| b.number() == number)
    }

    /// Drop every entry committed after `number` and remove `number` itself,
    /// returning it. Leaves the history untouched if `number` is not held.
    pub fn take_back_to(&mut self, number: u64) -> Option<Block<P>> {
        let idx = self.position_of(number)?;
        self.window.truncate(idx + 1);
        self.window.pop_back()
    }

    pub fn get(&self, number: u64) -> Option<&Block<P>> {
        self.position_of(number).map(|i| &self.window[i])
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Block<P>> {
        self.window.iter()
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BlockInfo;

    fn block(number: u64) -> Block<()> {
        let parent = if number == 1 { "0x0".to_string() } else { format!("0x{}", number - 1) };
        Block::new(BlockInfo::new(number, format!("0x{number}"), parent), ())
    }

    #[test]
    fn push_keeps_commit_order() {
        let mut history = BlockHistory::new(10);
        for i in 1..=3 {
            history.push(block(i));
        }
        assert_eq!(history.newest().unwrap().number(), 3);
        assert_eq!(history.iter().next().unwrap().number(), 1);
        assert_eq!(history.len(), 3);
    }

    #[test]
    fn max_length_enforced() {
        let mut history = BlockHistory::new(5);
        for i in 1..=10 {
            history.push(block(i));
        }
        assert_eq!(history.len(), 5); // oldest blocks evicted
        assert_eq!(history.iter().next().unwrap().number(), 6);
        assert_eq!(history.newest().unwrap().number(), 10);
    }

    #[test]
    fn take_back_to_discards_newer() {
        let mut history = BlockHistory::new(20);
        for i in 100..=110 {
            history.push(block(i));
        }
        let taken = history.take_back_to(105).unwrap();
        assert_eq!(taken.number(), 105);
        assert_eq!(history.newest().unwrap().number(), 104);
        assert_eq!(history.len(), 5);
    }

    #[test]
    fn take_back_to_missing_is_noop() {
        let mut history = BlockHistory::new(20);
        for i in 1..=4 {
            history.push(block(i));
        }
        assert!(history.take_back_to(9).is_none());
        assert_eq!(history.len(), 4);
    }

    #[test]
    fn pop_and_lookup() {
        let mut history = BlockHistory::new(4);
        for i in 1..=3 {
            history.push(block(i));
        }
        assert_eq!(history.get(2).unwrap().hash(), "0x2");
        assert_eq!(history.pop_newest().unwrap().number(), 3);
        assert!(history.get(3).is_none());
        history.clear();
        assert!(history.is_empty());
    }
}
