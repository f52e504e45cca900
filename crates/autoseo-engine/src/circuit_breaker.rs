//! System-wide circuit breaker for content generation
//!
//! Counts consecutive generation failures across all URLs. Once the count
//! reaches the threshold the breaker opens and generation is suspended until
//! the cooldown expires; on expiry the failure count resets.

use std::time::Duration;
use tokio::time::Instant;

/// Circuit breaker states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Normal operation - generation allowed
    Closed,
    /// Too many failures - generation suspended
    Open { remaining: Duration },
}

/// Result of polling the breaker before a generation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakerCheck {
    /// Generation may proceed
    Allowed,
    /// Cooldown just elapsed; the breaker reset itself and generation may proceed
    Resumed,
    /// Still cooling down
    Blocked { remaining: Duration },
}

/// Circuit breaker to stop hammering a failing generator
///
/// # Example
///
/// ```
/// use autoseo_engine::CircuitBreaker;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut cb = CircuitBreaker::new(3, Duration::from_secs(60));
///
/// cb.record_failure();
/// cb.record_failure();
/// assert!(cb.record_failure());
/// assert!(cb.is_open());
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct CircuitBreaker {
    consecutive_failures: u32,
    open_until: Option<Instant>,
    threshold: u32,
    cooldown: Duration,
}

impl CircuitBreaker {
    /// Create a new circuit breaker
    ///
    /// # Arguments
    ///
    /// * `threshold` - Consecutive failures before opening the circuit
    /// * `cooldown` - How long generation stays suspended once open
    pub fn new(threshold: u32, cooldown: Duration) -> Self {
        Self {
            consecutive_failures: 0,
            open_until: None,
            threshold: threshold.max(1),
            cooldown,
        }
    }

    /// Current state without side effects
    pub fn state(&self) -> CircuitState {
        match self.open_until {
            Some(until) => {
                let now = Instant::now();
                if now < until {
                    CircuitState::Open {
                        remaining: until - now,
                    }
                } else {
                    CircuitState::Closed
                }
            }
            None => CircuitState::Closed,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state(), CircuitState::Open { .. })
    }

    /// Check before generating; resets the breaker once its cooldown has expired
    pub fn check(&mut self) -> BreakerCheck {
        match self.open_until {
            None => BreakerCheck::Allowed,
            Some(until) => {
                let now = Instant::now();
                if now < until {
                    BreakerCheck::Blocked {
                        remaining: until - now,
                    }
                } else {
                    self.open_until = None;
                    self.consecutive_failures = 0;
                    BreakerCheck::Resumed
                }
            }
        }
    }

    /// Record a successful generation (resets the failure count)
    pub fn record_success(&mut self) {
        self.consecutive_failures = 0;
    }

    /// Record a failed generation. Returns `true` if this failure tripped the breaker.
    pub fn record_failure(&mut self) -> bool {
        self.consecutive_failures += 1;
        if self.consecutive_failures < self.threshold {
            return false;
        }

        let candidate = Instant::now() + self.cooldown;
        let was_open = self.is_open();
        // Cooldown expiry never moves backwards while open
        self.open_until = Some(match self.open_until {
            Some(existing) if existing > candidate => existing,
            _ => candidate,
        });
        !was_open
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    /// Time until generation resumes, zero if closed
    pub fn time_until_retry(&self) -> Duration {
        match self.state() {
            CircuitState::Open { remaining } => remaining,
            CircuitState::Closed => Duration::ZERO,
        }
    }

    pub fn reset(&mut self) {
        self.consecutive_failures = 0;
        self.open_until = None;
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(600))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_initial_state_closed() {
        let mut cb = CircuitBreaker::default();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.check(), BreakerCheck::Allowed);
    }

    #[tokio::test]
    async fn test_opens_after_threshold() {
        let mut cb = CircuitBreaker::new(3, Duration::from_secs(60));

        assert!(!cb.record_failure());
        assert!(!cb.record_failure());
        assert!(!cb.is_open());
        assert!(cb.record_failure());
        assert!(cb.is_open());
        assert!(matches!(cb.check(), BreakerCheck::Blocked { .. }));
    }

    #[tokio::test]
    async fn test_success_resets_failures() {
        let mut cb = CircuitBreaker::new(3, Duration::from_secs(60));

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.consecutive_failures(), 2);

        cb.record_success();
        assert_eq!(cb.consecutive_failures(), 0);
        cb.record_failure();
        cb.record_failure();
        assert!(!cb.is_open());
    }

    #[tokio::test(start_paused = true)]
    async fn test_resumes_after_cooldown() {
        let mut cb = CircuitBreaker::new(2, Duration::from_secs(30));
        cb.record_failure();
        cb.record_failure();
        assert!(cb.is_open());

        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(cb.check(), BreakerCheck::Resumed);
        assert_eq!(cb.consecutive_failures(), 0);
        assert_eq!(cb.check(), BreakerCheck::Allowed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cooldown_never_shrinks_while_open() {
        let mut cb = CircuitBreaker::new(1, Duration::from_secs(60));
        assert!(cb.record_failure());
        let first = cb.time_until_retry();

        tokio::time::advance(Duration::from_secs(10)).await;
        // A further failure while open extends, never shortens, the window
        assert!(!cb.record_failure());
        assert!(cb.time_until_retry() >= first - Duration::from_secs(10));
        assert_eq!(cb.time_until_retry(), Duration::from_secs(60));
    }

    #[tokio::test(start_paused = true)]
    async fn test_time_until_retry() {
        let mut cb = CircuitBreaker::new(2, Duration::from_secs(2));
        assert_eq!(cb.time_until_retry(), Duration::ZERO);

        cb.record_failure();
        cb.record_failure();

        let remaining = cb.time_until_retry();
        assert!(remaining > Duration::ZERO);
        assert!(remaining <= Duration::from_secs(2));
    }
}
