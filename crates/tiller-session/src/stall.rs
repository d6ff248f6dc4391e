//! Stall tracking over consecutive deferred decisions.
//!
//! The oracle deferring once is normal (a prompt split across reads, a
//! slow child). The same unresolved output being deferred over and over
//! is a stall, and the operator should hear about it.

/// Counts consecutive deferred decisions against a warning threshold.
pub struct WaitTracker {
    threshold: u32,
    consecutive: u32,
}

impl WaitTracker {
    /// A `threshold` of zero disables stall warnings.
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            consecutive: 0,
        }
    }

    /// Record one deferred decision.
    ///
    /// Returns `true` when a stall warning is due: at the threshold and at
    /// every further multiple of it, so a long stall warns periodically
    /// instead of once per iteration.
    pub fn record(&mut self) -> bool {
        self.consecutive += 1;
        self.threshold > 0 && self.consecutive % self.threshold == 0
    }

    /// A decision resolved the buffer (or input was injected); the streak
    /// is over.
    pub fn reset(&mut self) {
        self.consecutive = 0;
    }

    /// Current streak of consecutive deferred decisions.
    pub fn count(&self) -> u32 {
        self.consecutive
    }
}
