//! Engine parameters: decision-time timing control.
//!
//! [`EngineParams`] bounds how long a decision waits on its roles. These are
//! application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Decision collection timing.
///
/// | Field | Bounds |
/// |-------|--------|
/// | `judgment_timeout` | one role's judgment, retries included |
/// | `collection_window` | the whole vote collection barrier |
/// | `judgment_retries` | extra attempts after a non-timeout failure |
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineParams {
    pub judgment_timeout: Duration,
    pub collection_window: Duration,
    pub judgment_retries: usize,
}

impl Default for EngineParams {
    fn default() -> Self {
        Self {
            judgment_timeout: Duration::from_secs(10),
            collection_window: Duration::from_secs(30),
            judgment_retries: 1,
        }
    }
}

impl EngineParams {
    // ==================== Builder Methods ====================

    pub fn with_judgment_timeout(mut self, timeout: Duration) -> Self {
        self.judgment_timeout = timeout;
        self
    }

    pub fn with_collection_window(mut self, window: Duration) -> Self {
        self.collection_window = window;
        self
    }

    pub fn with_judgment_retries(mut self, retries: usize) -> Self {
        self.judgment_retries = retries;
        self
    }
}
