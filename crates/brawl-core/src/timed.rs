use serde::{Deserialize, Serialize};

/// A value that stays in effect until a match-clock deadline.
///
/// Deadlines are compared against the match clock in milliseconds; there is
/// no cancellation other than replacing the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timed<K> {
    pub kind: K,
    pub started_at: u64,
    pub expires_at: u64,
}

impl<K> Timed<K> {
    pub fn start(kind: K, now: u64, duration_ms: u64) -> Self {
        Self {
            kind,
            started_at: now,
            expires_at: now.saturating_add(duration_ms),
        }
    }

    pub fn is_expired(&self, now: u64) -> bool {
        now >= self.expires_at
    }

    pub fn remaining(&self, now: u64) -> u64 {
        self.expires_at.saturating_sub(now)
    }
}
