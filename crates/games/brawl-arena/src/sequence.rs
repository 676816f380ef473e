//! Timed symbol-sequence recognition for special moves.
//!
//! A [`SequenceMatcher`] holds up to three time-stamped symbols. Each frame the
//! owner reports whether the ability is affordable and which symbol (if any)
//! from the matcher's alphabet arrived. An entry more than one window after
//! the previous one restarts the buffer; a full buffer that equals the pattern
//! and spans less than one window fires and clears.

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Number of symbols in every combo pattern.
pub const PATTERN_LEN: usize = 3;

/// A buffered symbol and the match-clock time it arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry<S> {
    pub symbol: S,
    pub at: u64,
}

/// Result of one frame of matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Nothing arrived this frame.
    Idle,
    /// A symbol was buffered; no match yet.
    Buffered,
    /// The pattern completed. The buffer is now empty.
    Matched,
    /// The ability is not affordable; the buffer was cleared.
    Starved,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceMatcher<S> {
    pattern: [S; PATTERN_LEN],
    window_ms: u64,
    buffer: SmallVec<[Entry<S>; PATTERN_LEN]>,
}

impl<S: Copy + Eq> SequenceMatcher<S> {
    pub fn new(pattern: [S; PATTERN_LEN], window_ms: u64) -> Self {
        Self {
            pattern,
            window_ms,
            buffer: SmallVec::new(),
        }
    }

    pub fn pattern(&self) -> &[S; PATTERN_LEN] {
        &self.pattern
    }

    pub fn buffer(&self) -> &[Entry<S>] {
        &self.buffer
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Pick this frame's sample: the first of `symbols` in the pattern's alphabet.
    pub fn sample(&self, symbols: &[S]) -> Option<S> {
        symbols.iter().copied().find(|s| self.pattern.contains(s))
    }

    /// Run one frame of the matching protocol.
    pub fn observe(&mut self, now: u64, affordable: bool, sample: Option<S>) -> Observation {
        if !affordable {
            self.buffer.clear();
            return Observation::Starved;
        }
        let Some(symbol) = sample else {
            return Observation::Idle;
        };
        self.push(symbol, now);
        if self.is_complete() {
            self.buffer.clear();
            Observation::Matched
        } else {
            Observation::Buffered
        }
    }

    fn push(&mut self, symbol: S, now: u64) {
        if let Some(last) = self.buffer.last()
            && now.saturating_sub(last.at) >= self.window_ms
        {
            self.buffer.clear();
        }
        if self.buffer.len() == PATTERN_LEN {
            self.buffer.remove(0);
        }
        self.buffer.push(Entry { symbol, at: now });
    }

    fn is_complete(&self) -> bool {
        let (Some(first), Some(last)) = (self.buffer.first(), self.buffer.last()) else {
            return false;
        };
        self.buffer.len() == PATTERN_LEN
            && last.at.saturating_sub(first.at) < self.window_ms
            && self
                .buffer
                .iter()
                .zip(self.pattern.iter())
                .all(|(e, p)| e.symbol == *p)
    }
}
