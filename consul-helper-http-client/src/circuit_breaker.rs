//! Circuit breaker guarding calls to the registry.
//!
//! Consecutive transient failures open the breaker. While open, calls are
//! rejected without touching the network. After the reset timeout a limited
//! number of trial calls decide whether it closes again.

use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Circuit breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Circuit is closed, requests are allowed.
    Closed,
    /// Circuit is open, requests are rejected.
    Open,
    /// Circuit is half-open, limited requests are allowed for testing.
    HalfOpen,
}

/// Circuit breaker configuration.
#[derive(Debug, Clone)]
pub struct CircuitBreakerConfig {
    /// Number of consecutive failures to open the circuit.
    pub failure_threshold: u32,
    /// Number of successful requests to close the circuit.
    pub success_threshold: u32,
    /// Time to wait before attempting to close the circuit.
    pub reset_timeout: Duration,
    /// Number of requests to allow in half-open state.
    pub half_open_requests: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            success_threshold: 1,
            reset_timeout: Duration::from_secs(30),
            half_open_requests: 1,
        }
    }
}

impl CircuitBreakerConfig {
    /// Create a new circuit breaker config.
    pub fn new(failure_threshold: u32, reset_timeout: Duration) -> Self {
        Self {
            failure_threshold,
            reset_timeout,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Closed {
        failures: u32,
    },
    Open {
        since: Instant,
        failures: u32,
    },
    HalfOpen {
        trials: u32,
        successes: u32,
    },
}

impl Phase {
    const CLOSED: Phase = Phase::Closed { failures: 0 };

    fn state(&self) -> CircuitState {
        match self {
            Phase::Closed { .. } => CircuitState::Closed,
            Phase::Open { .. } => CircuitState::Open,
            Phase::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }
}

/// Circuit breaker shared by every clone of a client.
#[derive(Debug)]
pub struct CircuitBreaker {
    config: CircuitBreakerConfig,
    phase: Mutex<Phase>,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            config,
            phase: Mutex::new(Phase::CLOSED),
        }
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Current state; an open breaker whose timeout elapsed reports half-open.
    pub fn state(&self) -> CircuitState {
        let mut phase = self.phase.lock();
        self.cool_down(&mut phase);
        phase.state()
    }

    /// Whether a call may go out now. In half-open state this claims one of
    /// the trial slots.
    pub fn is_allowed(&self) -> bool {
        let mut phase = self.phase.lock();
        self.cool_down(&mut phase);

        match &mut *phase {
            Phase::Closed { .. } => true,
            Phase::Open { .. } => false,
            Phase::HalfOpen { trials, .. } => {
                if *trials < self.config.half_open_requests {
                    *trials += 1;
                    true
                } else {
                    false
                }
            }
        }
    }

    pub fn record_success(&self) {
        let mut phase = self.phase.lock();

        match &mut *phase {
            Phase::Closed { .. } => *phase = Phase::CLOSED,
            Phase::HalfOpen { successes, .. } => {
                *successes += 1;
                if *successes >= self.config.success_threshold {
                    info!("Circuit breaker closed");
                    *phase = Phase::CLOSED;
                }
            }
            Phase::Open { .. } => debug!("Ignoring success reported while circuit is open"),
        }
    }

    pub fn record_failure(&self) {
        let now = Instant::now();
        let mut phase = self.phase.lock();

        let failures = match *phase {
            Phase::Closed { failures } => failures + 1,
            // A failed trial reopens straight away
            Phase::HalfOpen { .. } => self.config.failure_threshold,
            Phase::Open { .. } => return,
        };

        if failures >= self.config.failure_threshold {
            warn!(
                failures,
                reset_timeout = ?self.config.reset_timeout,
                "Circuit breaker opened"
            );
            *phase = Phase::Open {
                since: now,
                failures,
            };
        } else {
            *phase = Phase::Closed { failures };
        }
    }

    /// Consecutive failures counted so far, or the count that opened the breaker.
    pub fn failure_count(&self) -> u32 {
        match *self.phase.lock() {
            Phase::Closed { failures, .. } | Phase::Open { failures, .. } => failures,
            Phase::HalfOpen { .. } => 0,
        }
    }

    /// Force the breaker closed.
    pub fn reset(&self) {
        *self.phase.lock() = Phase::CLOSED;
    }

    fn cool_down(&self, phase: &mut Phase) {
        if let Phase::Open { since, .. } = *phase
            && since.elapsed() >= self.config.reset_timeout
        {
            debug!("Circuit breaker half-open, allowing trial requests");
            *phase = Phase::HalfOpen {
                trials: 0,
                successes: 0,
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opens_after_consecutive_failures() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig::new(3, Duration::from_secs(30)));
        assert!(cb.is_allowed());

        cb.record_failure();
        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert_eq!(cb.failure_count(), 2);

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(cb.failure_count(), 3);
        assert!(!cb.is_allowed());
    }

    #[test]
    fn test_success_restarts_count() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig::new(3, Duration::from_secs(30)));

        cb.record_failure();
        cb.record_failure();
        cb.record_success();
        cb.record_failure();
        cb.record_failure();

        assert_eq!(cb.failure_count(), 2);
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_trial_success_closes() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig::new(1, Duration::ZERO));

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        assert!(cb.is_allowed());
        assert!(!cb.is_allowed());

        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_trial_failure_reopens() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig::new(2, Duration::from_millis(20)));

        cb.record_failure();
        cb.record_failure();
        std::thread::sleep(Duration::from_millis(30));
        assert!(cb.is_allowed());

        cb.record_failure();
        assert_eq!(cb.state(), CircuitState::Open);
        assert!(!cb.is_allowed());
    }

    #[test]
    fn test_success_threshold_needs_several_trials() {
        let config = CircuitBreakerConfig {
            success_threshold: 2,
            half_open_requests: 2,
            ..CircuitBreakerConfig::new(1, Duration::ZERO)
        };
        let cb = CircuitBreaker::new(config);

        cb.record_failure();
        assert!(cb.is_allowed());
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::HalfOpen);

        assert!(cb.is_allowed());
        cb.record_success();
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_reset_closes_open_circuit() {
        let cb = CircuitBreaker::new(CircuitBreakerConfig::new(1, Duration::from_secs(30)));

        cb.record_failure();
        assert!(!cb.is_allowed());

        cb.reset();
        assert_eq!(cb.state(), CircuitState::Closed);
        assert!(cb.is_allowed());
    }
}
