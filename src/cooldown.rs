use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Process-local throttle for manual "refresh now" triggers, keyed by stock
/// code. Injectable so tests can shrink or reset it; state does not persist
/// across restarts.
pub struct RefreshThrottle {
    interval: Duration,
    last: Mutex<HashMap<String, Instant>>,
}

impl RefreshThrottle {
    pub fn new(interval: Duration) -> Self {
        RefreshThrottle {
            interval,
            last: Mutex::new(HashMap::new()),
        }
    }

    /// Whether a refresh for `code` may run now. `Err` carries the whole
    /// seconds remaining until the cooldown elapses.
    pub fn check_ready(&self, code: &str) -> Result<(), u64> {
        let last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(at) = last.get(code) {
            let elapsed = at.elapsed();
            if elapsed < self.interval {
                return Err((self.interval - elapsed).as_secs());
            }
        }
        Ok(())
    }

    /// Record a completed refresh. Only successful refreshes are recorded,
    /// so a failed attempt can be retried immediately.
    pub fn mark(&self, code: &str) {
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        last.insert(code.to_string(), Instant::now());
    }

    pub fn reset(&self) {
        let mut last = match self.last.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        last.clear();
    }
}
