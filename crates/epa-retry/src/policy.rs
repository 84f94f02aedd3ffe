//! Retry budget, backoff and cancellation

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Delay schedule applied after transport failures
///
/// Quality (dirty content) failures never wait: they reflect content, not
/// infrastructure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backoff {
    /// Retry immediately
    #[default]
    None,
    /// `initial * factor^(n-1)` after the n-th transport failure, capped
    Exponential {
        /// Delay after the first transport failure
        initial: Duration,
        /// Growth factor per further failure
        factor: u32,
        /// Upper bound on any single delay
        cap: Duration,
    },
}

impl Backoff {
    /// Capped exponential backoff
    #[must_use]
    pub const fn exponential(initial: Duration, factor: u32, cap: Duration) -> Self {
        Self::Exponential {
            initial,
            factor,
            cap,
        }
    }

    /// Delay after the `failures`-th transport failure of a run (1-based)
    #[must_use]
    pub fn delay(&self, failures: u32) -> Option<Duration> {
        match *self {
            Self::None => None,
            Self::Exponential {
                initial,
                factor,
                cap,
            } => {
                let exponent = failures.saturating_sub(1);
                let scale = factor.max(1).saturating_pow(exponent);
                let delay = initial.saturating_mul(scale).min(cap);
                (!delay.is_zero()).then_some(delay)
            }
        }
    }
}

/// Retry budget for one generation call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt
    pub max_retries: u32,
    /// Delay schedule for transport failures
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: Backoff::None,
        }
    }
}

impl RetryPolicy {
    /// Policy with `max_retries` retries and no backoff
    #[inline]
    #[must_use]
    pub const fn new(max_retries: u32) -> Self {
        Self {
            max_retries,
            backoff: Backoff::None,
        }
    }

    /// With backoff schedule
    #[inline]
    #[must_use]
    pub const fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Total attempts allowed: the initial one plus every retry
    #[inline]
    #[must_use]
    pub const fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Cooperative cancellation flag shared between a caller and running loops
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create new, not yet cancelled token
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation; every clone observes it
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exponential_backoff_is_capped() {
        let backoff = Backoff::exponential(Duration::from_millis(100), 2, Duration::from_millis(500));
        assert_eq!(backoff.delay(1), Some(Duration::from_millis(100)));
        assert_eq!(backoff.delay(2), Some(Duration::from_millis(200)));
        assert_eq!(backoff.delay(3), Some(Duration::from_millis(400)));
        assert_eq!(backoff.delay(4), Some(Duration::from_millis(500)));
        assert_eq!(backoff.delay(40), Some(Duration::from_millis(500)));
    }

    #[test]
    fn no_backoff_never_waits() {
        assert_eq!(Backoff::None.delay(1), None);
        assert_eq!(Backoff::exponential(Duration::ZERO, 2, Duration::ZERO).delay(3), None);
    }

    #[test]
    fn total_attempts_includes_initial() {
        assert_eq!(RetryPolicy::new(2).total_attempts(), 3);
        assert_eq!(RetryPolicy::new(0).total_attempts(), 1);
        assert_eq!(RetryPolicy::new(u32::MAX).total_attempts(), u32::MAX);
    }

    #[test]
    fn cancellation_visible_to_clones() {
        let token = CancellationToken::new();
        let observer = token.clone();
        assert!(!observer.is_cancelled());
        token.cancel();
        assert!(observer.is_cancelled());
    }
}
