//! Retry configuration and strategies.

use crate::HttpClientError;
use rand::Rng;
use std::time::Duration;

/// Retry configuration.
///
/// Transport failures (connect errors and timeouts) are always retried;
/// responses are retried when their status is listed.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of attempts, the first one included.
    pub max_attempts: u32,
    /// Backoff strategy.
    pub backoff: BackoffStrategy,
    /// Upper bound of the random jitter added to every delay.
    pub jitter: Option<Duration>,
    /// Status codes that should trigger a retry.
    pub retry_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffStrategy::Exponential {
                initial: Duration::from_millis(100),
                max: Duration::from_secs(10),
                multiplier: 2.0,
            },
            jitter: None,
            retry_status_codes: vec![408, 429, 500, 502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// Create a retry config with exponential backoff.
    pub fn exponential(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: BackoffStrategy::Exponential {
                initial: initial_delay,
                max: Duration::from_secs(30),
                multiplier: 2.0,
            },
            ..Default::default()
        }
    }

    /// Create a retry config with constant delay.
    pub fn constant(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: BackoffStrategy::Constant(delay),
            ..Default::default()
        }
    }

    /// Create a retry config with no delay.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            backoff: BackoffStrategy::None,
            ..Default::default()
        }
    }

    /// Replace the status codes to retry on.
    pub fn with_status_codes(mut self, codes: Vec<u16>) -> Self {
        self.retry_status_codes = codes;
        self
    }

    /// Add random jitter in `0..=max` to every delay.
    pub fn with_jitter(mut self, max: Duration) -> Self {
        self.jitter = Some(max);
        self
    }

    /// Set the upper bound for a single exponential delay.
    pub fn with_max_delay(mut self, limit: Duration) -> Self {
        if let BackoffStrategy::Exponential { max, .. } = &mut self.backoff {
            *max = limit;
        }
        self
    }

    /// Delay before retry number `retry` (0-indexed), jitter included.
    pub fn delay_for_attempt(&self, retry: u32) -> Duration {
        let base = self.backoff.delay_for_attempt(retry);
        match self.jitter {
            Some(max) if !max.is_zero() => {
                let millis = rand::rng().random_range(0..=max.as_millis() as u64);
                base.saturating_add(Duration::from_millis(millis))
            }
            _ => base,
        }
    }

    /// Check if a status code should trigger a retry.
    pub fn should_retry_status(&self, status: u16) -> bool {
        self.retry_status_codes.contains(&status)
    }

    /// Check if an error is worth retrying, regardless of the attempt budget.
    pub fn is_retryable(&self, error: &HttpClientError) -> bool {
        match error {
            HttpClientError::Timeout(_) | HttpClientError::Connection(_) => true,
            HttpClientError::Http(e) => {
                e.is_timeout()
                    || e.is_connect()
                    || e.status().is_some_and(|s| self.should_retry_status(s.as_u16()))
            }
            _ => false,
        }
    }
}

/// Backoff strategy for retries.
#[derive(Debug, Clone)]
pub enum BackoffStrategy {
    /// No delay between retries.
    None,
    /// Constant delay between retries.
    Constant(Duration),
    /// Delay multiplied by `multiplier` for every further retry, capped at `max`.
    Exponential {
        initial: Duration,
        max: Duration,
        multiplier: f64,
    },
}

impl BackoffStrategy {
    /// Delay for a given retry (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        match self {
            Self::None => Duration::ZERO,
            Self::Constant(d) => *d,
            Self::Exponential {
                initial,
                max,
                multiplier,
            } => {
                let factor = multiplier.powi(attempt as i32);
                let millis = (initial.as_millis() as f64 * factor) as u64;
                Duration::from_millis(millis).min(*max)
            }
        }
    }
}
