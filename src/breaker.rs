//! Circuit breaker core.
//!
//! The breaker is a three-state machine guarding calls to a fallible
//! operation. All state lives behind a single mutex; admission (deciding
//! whether a call may run) and settlement (recording its outcome) are two
//! separate, short critical sections, so the lock is never held while the
//! protected operation runs or suspends.
//!
//! ## State Transitions
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                                                             │
//! │  ┌──────────┐  consecutive failures >= max  ┌──────────┐    │
//! │  │  Closed  │ ─────────────────────────────▶│   Open   │    │
//! │  └──────────┘                               └──────────┘    │
//! │       ▲                                          │          │
//! │       │ probe succeeds              cooldown elapsed        │
//! │       │                                          │          │
//! │       │          ┌────────────┐                  │          │
//! │       └──────────│  HalfOpen  │◀─────────────────┘          │
//! │                  └────────────┘                             │
//! │                        │                                    │
//! │                        │ probe fails (fresh cooldown)       │
//! │                        ▼                                    │
//! │                    ┌──────────┐                             │
//! │                    │   Open   │                             │
//! │                    └──────────┘                             │
//! └─────────────────────────────────────────────────────────────┘
//! ```

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{info, warn};

use crate::error::Rejection;
use crate::policy::Policy;
use crate::state::BreakerState;

/// How a guarded call concluded.
///
/// A real result and a substituted fallback are distinct variants, so callers
/// can tell "my call ran" apart from "the breaker is protecting the
/// dependency". Callers that do not care can collapse the distinction with
/// [`into_value`](Self::into_value).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The operation ran and returned a value.
    Completed(T),
    /// The call was rejected without running; the policy fallback is
    /// substituted.
    ShortCircuited(T),
    /// The half-open recovery probe ran and failed; the circuit reopened and
    /// the policy fallback is substituted.
    ProbeFailed(T),
}

impl<T> Outcome<T> {
    /// Extract the value, whether real or substituted.
    pub fn into_value(self) -> T {
        match self {
            Self::Completed(v) | Self::ShortCircuited(v) | Self::ProbeFailed(v) => v,
        }
    }

    /// Whether the operation actually ran and succeeded.
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    /// Whether the call was rejected without running.
    pub fn is_short_circuited(&self) -> bool {
        matches!(self, Self::ShortCircuited(_))
    }
}

/// Admission decision for a single call.
enum Admitted {
    /// Circuit is closed; run the operation normally.
    Run,
    /// Cooldown elapsed; this call is the single recovery probe.
    Probe,
}

struct Shared<T, E> {
    policy: Policy<T, E>,
    state: Mutex<BreakerState>,
}

/// A circuit breaker guarding one protected dependency.
///
/// Cheap to clone; all clones share the same state, so several call sites
/// (or several wrappers) can guard the same dependency through one breaker.
/// Thread-safe and safe under cooperative (async) interleaving.
pub struct Breaker<T, E> {
    shared: Arc<Shared<T, E>>,
}

impl<T, E> Clone for Breaker<T, E> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T, E> Breaker<T, E> {
    /// Create a breaker with the given policy.
    pub fn new(policy: Policy<T, E>) -> Self {
        Self {
            shared: Arc::new(Shared {
                policy,
                state: Mutex::new(BreakerState::default()),
            }),
        }
    }

    /// The policy this breaker was built with.
    pub fn policy(&self) -> &Policy<T, E> {
        &self.shared.policy
    }

    /// Snapshot of the current state.
    ///
    /// Open -> `HalfOpen` happens lazily on the next call, so after the
    /// cooldown elapses this still reports `Open` until someone invokes.
    pub fn state(&self) -> BreakerState {
        *self.shared.state.lock()
    }

    /// Consecutive qualifying failures observed while closed; 0 in any other
    /// state.
    pub fn failure_count(&self) -> u32 {
        match *self.shared.state.lock() {
            BreakerState::Closed { failure_count } => failure_count,
            BreakerState::Open { .. } | BreakerState::HalfOpen => 0,
        }
    }

    /// Whether the circuit is in the `Open` state (without considering the
    /// cooldown).
    pub fn is_open(&self) -> bool {
        matches!(self.state(), BreakerState::Open { .. })
    }

    /// Whether a call made now would be admitted.
    ///
    /// Purely observational: unlike [`call`](Self::call), this never claims
    /// the probe slot. `Ok(())` while open means the cooldown has elapsed and
    /// the next call will become the probe.
    pub fn check(&self) -> Result<(), Rejection> {
        let cooldown = self.shared.policy.cooldown;
        match *self.shared.state.lock() {
            BreakerState::Closed { .. } => Ok(()),
            BreakerState::Open { opened_at } => {
                let elapsed = opened_at.elapsed();
                if elapsed >= cooldown {
                    Ok(())
                } else {
                    Err(Rejection::Open {
                        remaining: cooldown - elapsed,
                    })
                }
            },
            BreakerState::HalfOpen => Err(Rejection::ProbeInFlight),
        }
    }

    /// Force the circuit closed with zero failures.
    pub fn reset(&self) {
        let mut state = self.shared.state.lock();
        if *state != (BreakerState::Closed { failure_count: 0 }) {
            info!("circuit manually reset to closed");
            *state = BreakerState::Closed { failure_count: 0 };
        }
    }

    /// Decide whether a call may run, transitioning Open -> `HalfOpen` when
    /// the cooldown has elapsed. The admitted `Probe` caller owns the single
    /// probe slot until it settles.
    fn admit(&self) -> Result<Admitted, Rejection> {
        let cooldown = self.shared.policy.cooldown;
        let mut state = self.shared.state.lock();
        match *state {
            BreakerState::Closed { .. } => Ok(Admitted::Run),
            BreakerState::Open { opened_at } => {
                let elapsed = opened_at.elapsed();
                if elapsed >= cooldown {
                    info!("circuit half-open, admitting recovery probe");
                    *state = BreakerState::HalfOpen;
                    Ok(Admitted::Probe)
                } else {
                    Err(Rejection::Open {
                        remaining: cooldown - elapsed,
                    })
                }
            },
            BreakerState::HalfOpen => Err(Rejection::ProbeInFlight),
        }
    }

    /// Record the outcome of a closed-state attempt.
    ///
    /// `qualifying_failure = false` means the attempt succeeded (or is
    /// otherwise treated as success) and the counter resets.
    fn settle_attempt(&self, qualifying_failure: bool) {
        let max_failures = self.shared.policy.max_failures;
        let mut state = self.shared.state.lock();
        // A concurrent invoker may have opened the circuit or claimed a probe
        // while this attempt ran; a stale outcome no longer has a say.
        let BreakerState::Closed { failure_count } = *state else {
            return;
        };
        if qualifying_failure {
            let count = failure_count.saturating_add(1);
            if count >= max_failures {
                warn!(failures = count, "circuit opened after consecutive failures");
                *state = BreakerState::Open {
                    opened_at: Instant::now(),
                };
            } else {
                *state = BreakerState::Closed {
                    failure_count: count,
                };
            }
        } else if failure_count != 0 {
            *state = BreakerState::Closed { failure_count: 0 };
        }
    }

    /// Record the outcome of the half-open probe.
    fn settle_probe(&self, recovered: bool) {
        let mut state = self.shared.state.lock();
        // reset() may have closed the circuit while the probe was in flight;
        // the explicit reset wins.
        if !matches!(*state, BreakerState::HalfOpen) {
            return;
        }
        if recovered {
            info!("circuit closed after successful recovery probe");
            *state = BreakerState::Closed { failure_count: 0 };
        } else {
            warn!("circuit reopened after failed recovery probe");
            *state = BreakerState::Open {
                opened_at: Instant::now(),
            };
        }
    }
}

impl<T: Clone, E> Breaker<T, E> {
    /// Guard one synchronous call.
    ///
    /// - Closed: runs the operation once. A qualifying error advances the
    ///   consecutive-failure counter (opening the circuit at the threshold)
    ///   and is propagated, so the caller always observes its own failure.
    ///   Non-qualifying errors propagate with no effect on the breaker.
    /// - Open within the cooldown: returns
    ///   [`Outcome::ShortCircuited`] with the fallback; the operation is not
    ///   invoked.
    /// - Open past the cooldown: this call becomes the single recovery probe.
    ///   Probe success closes the circuit; a qualifying probe failure reopens
    ///   it with a fresh cooldown and yields [`Outcome::ProbeFailed`] with
    ///   the fallback.
    pub fn call<F>(&self, op: F) -> Result<Outcome<T>, E>
    where
        F: FnOnce() -> Result<T, E>,
    {
        match self.admit() {
            Err(_) => Ok(Outcome::ShortCircuited(self.shared.policy.fallback.clone())),
            Ok(Admitted::Run) => self.conclude_attempt(op()),
            Ok(Admitted::Probe) => {
                let guard = ProbeGuard::new(self);
                let result = op();
                self.conclude_probe(guard, result)
            },
        }
    }

    /// Guard one asynchronous call. Same contract as [`call`](Self::call).
    ///
    /// The breaker's mutex is never held across the `.await`; while the probe
    /// future is in flight the gate is held by a drop guard instead, so a
    /// cancelled (dropped) probe reopens the circuit rather than leaving it
    /// stuck half-open. Cancellation of a closed-state call has no effect on
    /// the failure counter, since its outcome was never observed.
    pub async fn call_async<F, Fut>(&self, op: F) -> Result<Outcome<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        match self.admit() {
            Err(_) => Ok(Outcome::ShortCircuited(self.shared.policy.fallback.clone())),
            Ok(Admitted::Run) => {
                let result = op().await;
                self.conclude_attempt(result)
            },
            Ok(Admitted::Probe) => {
                let guard = ProbeGuard::new(self);
                let result = op().await;
                self.conclude_probe(guard, result)
            },
        }
    }

    fn conclude_attempt(&self, result: Result<T, E>) -> Result<Outcome<T>, E> {
        match result {
            Ok(value) => {
                self.settle_attempt(false);
                Ok(Outcome::Completed(value))
            },
            Err(err) => {
                if (self.shared.policy.qualifies)(&err) {
                    self.settle_attempt(true);
                }
                Err(err)
            },
        }
    }

    fn conclude_probe(
        &self,
        guard: ProbeGuard<'_, T, E>,
        result: Result<T, E>,
    ) -> Result<Outcome<T>, E> {
        match result {
            Ok(value) => {
                guard.settle(true);
                Ok(Outcome::Completed(value))
            },
            Err(err) => {
                if (self.shared.policy.qualifies)(&err) {
                    guard.settle(false);
                    Ok(Outcome::ProbeFailed(self.shared.policy.fallback.clone()))
                } else {
                    // A non-qualifying error is not evidence against the
                    // dependency: the probe reached it, so the circuit closes
                    // and the error is the caller's to handle.
                    guard.settle(true);
                    Err(err)
                }
            },
        }
    }
}

/// Releases the half-open probe slot if the probe never reports back
/// (cancelled future, or an operation that panics).
struct ProbeGuard<'a, T, E> {
    breaker: &'a Breaker<T, E>,
    settled: bool,
}

impl<'a, T, E> ProbeGuard<'a, T, E> {
    fn new(breaker: &'a Breaker<T, E>) -> Self {
        Self {
            breaker,
            settled: false,
        }
    }

    fn settle(mut self, recovered: bool) {
        self.settled = true;
        self.breaker.settle_probe(recovered);
    }
}

impl<T, E> Drop for ProbeGuard<'_, T, E> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("recovery probe abandoned before completion");
            self.breaker.settle_probe(false);
        }
    }
}
