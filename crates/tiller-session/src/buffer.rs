//! Output accumulated between decisions.
//!
//! Raw PTY bytes are appended as they arrive and held until a decision
//! resolves them; the oracle sees an ANSI-stripped snapshot of everything
//! since the last resolved decision. Terminal output is full of escape
//! codes for colors and cursor movement, so stripping happens at snapshot
//! time and the raw bytes stay untouched for display.

/// Accumulator for child output awaiting a decision.
pub struct OutputBuffer {
    raw: Vec<u8>,
    /// Byte cap; the oldest bytes are dropped beyond this.
    max_bytes: usize,
}

impl OutputBuffer {
    pub fn new(max_bytes: usize) -> Self {
        Self {
            raw: Vec::new(),
            max_bytes,
        }
    }

    /// Append a chunk of raw output, evicting the oldest bytes if the cap
    /// is exceeded.
    pub fn append(&mut self, chunk: &[u8]) {
        self.raw.extend_from_slice(chunk);
        if self.raw.len() > self.max_bytes {
            let excess = self.raw.len() - self.max_bytes;
            self.raw.drain(..excess);
        }
    }

    /// ANSI-stripped, lossy-UTF-8 view of the accumulated output.
    pub fn snapshot(&self) -> String {
        let stripped = strip_ansi_escapes::strip(&self.raw);
        String::from_utf8_lossy(&stripped).into_owned()
    }

    /// True when there is nothing worth a decision: no bytes at all, or
    /// only whitespace/escape sequences.
    pub fn is_blank(&self) -> bool {
        self.raw.is_empty() || self.snapshot().trim().is_empty()
    }

    /// Drop the accumulated output. Called when a decision resolves it.
    pub fn clear(&mut self) {
        self.raw.clear();
    }

    /// Number of raw bytes currently held.
    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }
}
