//! # Circuit Breaker Module
//!
//! Stops calling the generation service after repeated failures so a broken
//! endpoint or exhausted quota fails fast instead of making the user wait for
//! every timeout.

use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::generation_config::RecoveryConfig;

#[derive(Debug, Default)]
struct BreakerState {
    failure_count: u32,
    last_failure: Option<Instant>,
    half_open: bool,
}

/// Circuit breaker for generation requests
///
/// # State Machine
///
/// - **Closed**: Normal operation, requests pass through
/// - **Open**: Failure threshold reached, requests fail fast
/// - **Half-Open**: Reset window elapsed, requests pass again; a single
///   failure reopens the circuit and a success closes it
#[derive(Debug)]
pub struct CircuitBreaker {
    state: Mutex<BreakerState>,
    threshold: u32,
    reset_after: Duration,
}

impl CircuitBreaker {
    /// Create a closed circuit breaker from the recovery settings
    pub fn new(config: &RecoveryConfig) -> Self {
        Self {
            state: Mutex::new(BreakerState::default()),
            threshold: config.circuit_breaker_threshold.max(1),
            reset_after: Duration::from_secs(config.circuit_breaker_reset_secs),
        }
    }

    fn lock(&self) -> MutexGuard<'_, BreakerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Whether requests should currently be refused
    ///
    /// Once the reset window has elapsed the breaker turns half-open and lets
    /// requests through while keeping its failure count.
    pub fn is_open(&self) -> bool {
        let mut state = self.lock();
        if state.failure_count < self.threshold || state.half_open {
            return false;
        }

        match state.last_failure {
            Some(last) if last.elapsed() < self.reset_after => true,
            _ => {
                info!("Circuit breaker half-open after cool-down");
                state.half_open = true;
                false
            }
        }
    }

    /// Record a failed request
    pub fn record_failure(&self) {
        let mut state = self.lock();
        state.failure_count = state.failure_count.saturating_add(1);
        state.last_failure = Some(Instant::now());
        if state.half_open {
            state.half_open = false;
            warn!(failures = state.failure_count, "Trial request failed, circuit breaker reopened");
        } else if state.failure_count == self.threshold {
            warn!(failures = state.failure_count, "Circuit breaker opened");
        }
    }

    /// Record a successful request, closing the circuit
    pub fn record_success(&self) {
        *self.lock() = BreakerState::default();
    }

    pub fn failure_count(&self) -> u32 {
        self.lock().failure_count
    }

    pub fn is_half_open(&self) -> bool {
        self.lock().half_open
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(threshold: u32, reset_secs: u64) -> RecoveryConfig {
        RecoveryConfig {
            circuit_breaker_threshold: threshold,
            circuit_breaker_reset_secs: reset_secs,
            ..Default::default()
        }
    }

    #[test]
    fn test_opens_at_threshold() {
        let breaker = CircuitBreaker::new(&config(2, 60));
        breaker.record_failure();
        assert!(!breaker.is_open());
        breaker.record_failure();
        assert!(breaker.is_open());
    }

    #[test]
    fn test_success_closes() {
        let breaker = CircuitBreaker::new(&config(1, 60));
        breaker.record_failure();
        assert!(breaker.is_open());
        breaker.record_success();
        assert!(!breaker.is_open());
        assert_eq!(breaker.failure_count(), 0);
    }

    #[test]
    fn test_cool_down_turns_half_open_without_forgetting_failures() {
        let breaker = CircuitBreaker::new(&config(2, 0));
        breaker.record_failure();
        breaker.record_failure();

        assert!(!breaker.is_open());
        assert!(breaker.is_half_open());
        assert_eq!(breaker.failure_count(), 2);
    }

    #[test]
    fn test_half_open_failure_reopens_at_once() {
        let breaker = CircuitBreaker::new(&config(3, 60));
        for _ in 0..3 {
            breaker.record_failure();
        }
        assert!(breaker.is_open());

        // Force the cool-down to have elapsed
        breaker.lock().last_failure = Instant::now().checked_sub(Duration::from_secs(61));
        assert!(!breaker.is_open());
        assert!(breaker.is_half_open());

        breaker.record_failure();
        assert!(!breaker.is_half_open());
        assert!(breaker.is_open());
    }

    #[test]
    fn test_half_open_success_closes() {
        let breaker = CircuitBreaker::new(&config(1, 0));
        breaker.record_failure();
        assert!(!breaker.is_open());

        breaker.record_success();
        assert!(!breaker.is_half_open());
        assert_eq!(breaker.failure_count(), 0);
    }
}
