//! Breaker state machine states.
//!
//! Defines the three states a circuit breaker can be in:
//! - **Closed**: Normal operation, calls run
//! - **Open**: Too many failures, calls short-circuited
//! - **`HalfOpen`**: Testing recovery - only ONE probe call in flight

use std::time::Instant;

/// Circuit breaker state.
#[derive(Debug, Clone, Copy)]
pub enum BreakerState {
    /// Circuit is closed - calls run normally.
    Closed {
        /// Number of consecutive qualifying failures.
        failure_count: u32,
    },
    /// Circuit is open - calls are short-circuited to the fallback.
    Open {
        /// When the circuit was opened (monotonic clock).
        opened_at: Instant,
    },
    /// Circuit is half-open - a single recovery probe is in flight.
    /// All other calls are short-circuited until the probe settles.
    HalfOpen,
}

impl PartialEq for BreakerState {
    fn eq(&self, other: &Self) -> bool {
        matches!(
            (self, other),
            (
                BreakerState::Closed { failure_count: a },
                BreakerState::Closed { failure_count: b }
            ) if a == b
        ) || matches!(
            (self, other),
            (BreakerState::Open { .. }, BreakerState::Open { .. })
                | (BreakerState::HalfOpen, BreakerState::HalfOpen)
        )
    }
}

impl Eq for BreakerState {}

impl Default for BreakerState {
    fn default() -> Self {
        Self::Closed { failure_count: 0 }
    }
}
