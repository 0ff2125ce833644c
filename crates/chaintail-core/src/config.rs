//! Tailer configuration and fluent builder.
//!
//! # Example
//!
//! ```rust,no_run
//! use chaintail_core::{MemoryChain, TailerBuilder};
//!
//! let chain: MemoryChain<()> = MemoryChain::new();
//! let tailer = TailerBuilder::new()
//!     .start_at_block(-100)
//!     .max_history_length(256)
//!     .build(chain)
//!     .unwrap();
//! ```

use serde::{Deserialize, Serialize};

use crate::adapter::ChainAdapter;
use crate::error::TailerError;
use crate::exhausted::{FailOnExhausted, HistoryExhaustedHandler};
use crate::tailer::ChainTailer;

/// Configuration for a [`ChainTailer`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TailerConfig {
    /// First block to emit. Negative values are relative to the head at the
    /// first `advance`: `-5` with head 100 starts at block 96.
    pub start_at_block: i64,
    /// Ask the adapter for the last irreversible block instead of the tip.
    pub only_irreversible: bool,
    /// Blocks retained for fork resolution. Bounds the deepest reorg the
    /// tailer can heal on its own.
    pub max_history_length: usize,
}

impl Default for TailerConfig {
    fn default() -> Self {
        Self {
            start_at_block: 1,
            only_irreversible: false,
            max_history_length: 600,
        }
    }
}

impl TailerConfig {
    pub fn validate(&self) -> Result<(), TailerError> {
        if self.max_history_length == 0 {
            return Err(TailerError::InvalidConfig(
                "max_history_length must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// Fluent builder for [`ChainTailer`].
pub struct TailerBuilder {
    config: TailerConfig,
    on_exhausted: Box<dyn HistoryExhaustedHandler>,
}

impl Default for TailerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TailerBuilder {
    pub fn new() -> Self {
        Self {
            config: TailerConfig::default(),
            on_exhausted: Box::new(FailOnExhausted),
        }
    }

    /// Start from an existing configuration.
    pub fn from_config(config: TailerConfig) -> Self {
        Self {
            config,
            ..Self::new()
        }
    }

    /// Set the first block to emit (negative = relative to head).
    pub fn start_at_block(mut self, block: i64) -> Self {
        self.config.start_at_block = block;
        self
    }

    pub fn only_irreversible(mut self, only_irreversible: bool) -> Self {
        self.config.only_irreversible = only_irreversible;
        self
    }

    /// Set the number of committed blocks kept for fork resolution.
    pub fn max_history_length(mut self, length: usize) -> Self {
        self.config.max_history_length = length;
        self
    }

    /// Replace the default fail-fast history-exhausted behavior.
    pub fn on_history_exhausted(mut self, handler: impl HistoryExhaustedHandler + 'static) -> Self {
        self.on_exhausted = Box::new(handler);
        self
    }

    /// Build the `TailerConfig` without an adapter.
    pub fn build_config(self) -> TailerConfig {
        self.config
    }

    /// Validate the configuration and build a tailer over `adapter`.
    pub fn build<A: ChainAdapter>(self, adapter: A) -> Result<ChainTailer<A>, TailerError> {
        self.config.validate()?;
        Ok(ChainTailer::with_handler(self.config, adapter, self.on_exhausted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let cfg = TailerBuilder::new().build_config();
        assert_eq!(cfg.start_at_block, 1);
        assert!(!cfg.only_irreversible);
        assert_eq!(cfg.max_history_length, 600);
    }

    #[test]
    fn builder_custom() {
        let cfg = TailerBuilder::new()
            .start_at_block(-10)
            .only_irreversible(true)
            .max_history_length(32)
            .build_config();

        assert_eq!(cfg.start_at_block, -10);
        assert!(cfg.only_irreversible);
        assert_eq!(cfg.max_history_length, 32);
    }

    #[test]
    fn zero_history_rejected() {
        let cfg = TailerConfig {
            max_history_length: 0,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(TailerError::InvalidConfig(_))));
    }

    #[test]
    fn config_from_partial_json() {
        let cfg: TailerConfig = serde_json::from_str(r#"{"start_at_block": 5000}"#).unwrap();
        assert_eq!(cfg.start_at_block, 5000);
        assert_eq!(cfg.max_history_length, 600);
    }
}
