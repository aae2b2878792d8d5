//! Breaker error types.
//!
//! Describes why a call was not admitted. Errors from the protected operation
//! itself are never wrapped; they propagate to the caller as-is.

use std::time::Duration;

use thiserror::Error;

/// Why the breaker refused to run a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    /// The circuit is open and the cooldown window has not elapsed.
    #[error("circuit open, {}ms of cooldown remaining", remaining.as_millis())]
    Open {
        /// Time left before a recovery probe will be admitted.
        remaining: Duration,
    },
    /// The circuit is half-open and a recovery probe is already in flight.
    #[error("circuit half-open, recovery probe in flight")]
    ProbeInFlight,
}
