use std::collections::VecDeque;
use std::sync::Arc;

use chrono::Duration;

use crate::clock::Clock;

/// Sliding-window order budget: at most `limit` sends inside any
/// `window_seconds` span of logical time.
///
/// Reads the injected clock rather than wall time so replay runs deny and
/// permit orders at exactly the same points as live runs. A denial is a
/// normal negative result, not an error. When several limiters guard one
/// order, ask all of them before recording the send on any of them.
#[derive(Debug)]
pub struct RiskLimiter {
    clock: Arc<Clock>,
    limit: usize,
    window: Duration,
    timestamps: VecDeque<chrono::DateTime<chrono::Utc>>,
}

impl RiskLimiter {
    pub fn new(clock: Arc<Clock>, limit: usize, window_seconds: u64) -> Self {
        Self {
            clock,
            limit,
            window: Duration::seconds(window_seconds as i64),
            timestamps: VecDeque::new(),
        }
    }

    /// Whether one more order fits in the current window.
    pub fn can_send(&mut self) -> bool {
        self.prune();
        self.timestamps.len() < self.limit
    }

    /// Record an order send. Callers must have checked `can_send` first.
    pub fn do_send(&mut self) {
        assert!(self.can_send(), "do_send called while the risk window is full");
        self.timestamps.push_back(self.clock.now());
        self.prune();
    }

    fn prune(&mut self) {
        let cutoff = self.clock.now() - self.window;
        while matches!(self.timestamps.front(), Some(t) if *t < cutoff) {
            self.timestamps.pop_front();
        }
    }
}
