//! Stream settings: per-turn transport control.
//!
//! [`StreamSettings`] groups the parameters the
//! [`TurnController`](crate::use_cases::submit_turn::TurnController) applies
//! to every driver task it spawns.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default inactivity window, in seconds.
pub const DEFAULT_INACTIVITY_TIMEOUT_SECS: u64 = 30;

/// Transport control parameters for a streaming turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamSettings {
    /// Maximum wait for the stream to open, and between consecutive events
    /// once it is open. Expiry fails the turn with a timeout.
    pub inactivity_timeout: Duration,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            inactivity_timeout: Duration::from_secs(DEFAULT_INACTIVITY_TIMEOUT_SECS),
        }
    }
}

impl StreamSettings {
    // ==================== Builder Methods ====================

    pub fn with_inactivity_timeout(mut self, timeout: Duration) -> Self {
        self.inactivity_timeout = timeout;
        self
    }
}
