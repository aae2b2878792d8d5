//! Breaker policy.
//!
//! Defines the failure threshold, cooldown window, fallback value, and the
//! predicate that classifies which errors count toward the threshold.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default number of consecutive qualifying failures before opening.
pub(crate) const DEFAULT_MAX_FAILURES: u32 = 10;

/// Default duration the circuit stays open before admitting a probe.
pub(crate) const DEFAULT_COOLDOWN: Duration = Duration::from_secs(120);

/// Immutable breaker configuration.
///
/// `T` is the protected operation's success type (the fallback must be of the
/// same type), `E` its error type.
pub struct Policy<T, E> {
    /// Number of consecutive qualifying failures before the circuit opens.
    /// Always at least 1.
    pub max_failures: u32,
    /// How long the circuit stays open before a recovery probe is admitted.
    pub cooldown: Duration,
    pub(crate) fallback: T,
    pub(crate) qualifies: Arc<dyn Fn(&E) -> bool + Send + Sync>,
}

impl<T, E> Policy<T, E> {
    /// Create a policy with the given threshold, cooldown, and fallback.
    ///
    /// Every error counts toward the threshold until narrowed with
    /// [`qualifying`](Self::qualifying). A zero threshold is clamped to 1.
    pub fn new(max_failures: u32, cooldown: Duration, fallback: T) -> Self {
        Self {
            max_failures: max_failures.max(1),
            cooldown,
            fallback,
            qualifies: Arc::new(|_| true),
        }
    }

    /// Replace the failure classifier.
    ///
    /// Only errors matching the predicate count toward `max_failures`;
    /// everything else passes through the breaker with no effect on its state.
    #[must_use]
    pub fn qualifying<P>(mut self, predicate: P) -> Self
    where
        P: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.qualifies = Arc::new(predicate);
        self
    }

    /// The value substituted for short-circuited calls.
    pub fn fallback(&self) -> &T {
        &self.fallback
    }
}

impl<T: Default, E> Default for Policy<T, E> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FAILURES, DEFAULT_COOLDOWN, T::default())
    }
}

impl<T: Clone, E> Clone for Policy<T, E> {
    fn clone(&self) -> Self {
        Self {
            max_failures: self.max_failures,
            cooldown: self.cooldown,
            fallback: self.fallback.clone(),
            qualifies: Arc::clone(&self.qualifies),
        }
    }
}

impl<T: fmt::Debug, E> fmt::Debug for Policy<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Policy")
            .field("max_failures", &self.max_failures)
            .field("cooldown", &self.cooldown)
            .field("fallback", &self.fallback)
            .finish_non_exhaustive()
    }
}
