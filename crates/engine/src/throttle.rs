//! Cooldown gate for repeating log lines.

use std::time::Duration;
use tokio::time::Instant;

/// Lets a repeating warning through at most once per `cooldown`.
#[derive(Debug)]
pub struct LogThrottle {
    cooldown: Duration,
    last: Option<Instant>,
    suppressed: u64,
}

impl LogThrottle {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            cooldown,
            last: None,
            suppressed: 0,
        }
    }

    /// Returns `Some(suppressed)` when the caller should log now, with the
    /// number of occurrences swallowed since the previous log line.
    pub fn check(&mut self) -> Option<u64> {
        let now = Instant::now();
        match self.last {
            Some(last) if now.duration_since(last) < self.cooldown => {
                self.suppressed += 1;
                None
            }
            _ => {
                self.last = Some(now);
                Some(std::mem::take(&mut self.suppressed))
            }
        }
    }

    /// Forget the last log time, e.g. after the condition cleared.
    pub fn reset(&mut self) {
        self.last = None;
        self.suppressed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_once_per_cooldown() {
        let mut throttle = LogThrottle::new(Duration::from_secs(60));

        assert_eq!(throttle.check(), Some(0));
        assert_eq!(throttle.check(), None);
        assert_eq!(throttle.check(), None);

        tokio::time::advance(Duration::from_secs(59)).await;
        assert_eq!(throttle.check(), None);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(throttle.check(), Some(3));
        assert_eq!(throttle.check(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset() {
        let mut throttle = LogThrottle::new(Duration::from_secs(10));
        assert_eq!(throttle.check(), Some(0));
        assert_eq!(throttle.check(), None);

        throttle.reset();
        assert_eq!(throttle.check(), Some(0));
    }
}
