// =============================================================================
// Lint Configuration
// =============================================================================

// Safety: no unsafe code anywhere in this crate
#![deny(unsafe_code)]
// Correctness: Must handle all fallible operations
#![deny(unused_must_use)]
// Quality: Pedantic but pragmatic
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(rust_2018_idioms)]
#![warn(unreachable_pub)]
#![allow(missing_debug_implementations)] // Breaker holds a caller-supplied predicate which lacks Debug
// Allowed with documented reasons
#![allow(clippy::missing_errors_doc)] // Error returns self-documenting via type
#![allow(clippy::module_name_repetitions)] // e.g., state::BreakerState is clearer
#![allow(clippy::must_use_candidate)] // Not all returned values need annotation

//! Three-state circuit breaker for synchronous and asynchronous calls.
//!
//! A [`Breaker`] guards an opaque fallible operation: it counts consecutive
//! qualifying failures while closed, short-circuits calls to a fallback once
//! the threshold is reached, and after a fixed cooldown admits exactly one
//! recovery probe. Probe success closes the circuit; probe failure restarts
//! the cooldown.
//!
//! One breaker guards one logical dependency and is an explicitly owned
//! value - clone the handle to share it between call sites. It is safe under
//! both multi-threaded and single-threaded cooperative (async) invocation.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use fusebox::{Breaker, Outcome, Policy};
//!
//! #[derive(Debug)]
//! struct Unreachable;
//!
//! let policy = Policy::new(2, Duration::from_secs(30), -1);
//! let breaker: Breaker<i32, Unreachable> = Breaker::new(policy);
//!
//! // Two consecutive failures open the circuit; each failing call still
//! // observes its own error.
//! for _ in 0..2 {
//!     let _ = breaker.call(|| Err(Unreachable));
//! }
//! assert!(breaker.is_open());
//!
//! // Calls are now short-circuited to the fallback without running.
//! let outcome = breaker.call(|| Ok(42)).unwrap();
//! assert_eq!(outcome, Outcome::ShortCircuited(-1));
//! ```

mod breaker;
mod error;
mod policy;
mod state;
mod wrap;


pub use breaker::{Breaker, Outcome};
pub use error::Rejection;
pub use policy::Policy;
pub use state::BreakerState;
pub use wrap::{Guarded, GuardedAsync};
