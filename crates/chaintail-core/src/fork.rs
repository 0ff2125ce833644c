//! Record of the most recent fork resolution.

use serde::{Deserialize, Serialize};

/// Describes a fork the tailer detected and reconciled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForkReport {
    /// Block whose parent hash did not match the current block.
    pub detected_at: u64,
    /// Block adopted as current once the branch point was found.
    pub resolved_at: u64,
    /// Number of committed blocks rolled back.
    pub depth: u64,
    /// `true` if history ran out and the exhausted handler re-anchored.
    pub reanchored: bool,
    /// Unix timestamp of the resolution (seconds since epoch).
    pub resolved_at_time: i64,
}

impl ForkReport {
    pub(crate) fn new(detected_at: u64, resolved_at: u64, depth: u64, reanchored: bool) -> Self {
        Self {
            detected_at,
            resolved_at,
            depth,
            reanchored,
            resolved_at_time: chrono::Utc::now().timestamp(),
        }
    }
}
