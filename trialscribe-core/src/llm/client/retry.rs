use crate::config::RetrySettings;
use crate::config::constants::retry;
use std::time::Duration;

/// Exponential backoff for transient completion failures
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_delay: Duration,
    /// Cap for exponential backoff
    pub max_delay: Duration,
    /// Backoff multiplier (delay *= multiplier each retry)
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: retry::DEFAULT_MAX_ATTEMPTS,
            initial_delay: Duration::from_millis(retry::DEFAULT_INITIAL_DELAY_MS),
            max_delay: Duration::from_millis(retry::DEFAULT_MAX_DELAY_MS),
            backoff_multiplier: retry::DEFAULT_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Attempts actually made; a zero setting still makes one call
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay before the retry that follows failed attempt `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(32) as i32;
        let multiplier = self.backoff_multiplier.max(1.0).powi(exponent);
        let delay_nanos = self.initial_delay.as_nanos() as f64 * multiplier;
        if !delay_nanos.is_finite() || delay_nanos >= self.max_delay.as_nanos() as f64 {
            return self.max_delay;
        }
        Duration::from_nanos(delay_nanos.round() as u64)
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(settings: &RetrySettings) -> Self {
        Self {
            max_attempts: settings.max_attempts,
            initial_delay: Duration::from_millis(settings.initial_delay_ms),
            max_delay: Duration::from_millis(settings.max_delay_ms),
            backoff_multiplier: settings.backoff_multiplier,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.initial_delay, Duration::from_millis(500));
        assert_eq!(policy.max_delay, Duration::from_secs(30));
    }

    #[test]
    fn test_exponential_backoff_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(20), Duration::from_secs(30));
    }

    #[test]
    fn test_none_makes_a_single_attempt() {
        assert_eq!(RetryPolicy::none().attempts(), 1);
        let zero = RetryPolicy {
            max_attempts: 0,
            ..RetryPolicy::default()
        };
        assert_eq!(zero.attempts(), 1);
    }

    #[test]
    fn test_from_settings() {
        let settings = RetrySettings {
            max_attempts: 5,
            initial_delay_ms: 10,
            max_delay_ms: 100,
            backoff_multiplier: 3.0,
        };
        let policy = RetryPolicy::from(&settings);
        assert_eq!(policy.attempts(), 5);
        assert_eq!(policy.delay_for(2), Duration::from_millis(30));
        assert_eq!(policy.delay_for(4), Duration::from_millis(100));
    }
}
