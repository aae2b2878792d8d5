//! Adapters that bind a breaker to a callable.
//!
//! The guarded callable keeps the signature of the raw one; only the return
//! type changes, to [`Outcome`], so callers can tell a real result from a
//! substituted fallback. The synchronous and asynchronous variants are
//! separate types chosen at construction, not detected at call time.

use std::future::Future;
use std::marker::PhantomData;

use crate::breaker::{Breaker, Outcome};

impl<T, E> Breaker<T, E> {
    /// Attach this breaker to a synchronous callable.
    ///
    /// The wrapper holds a clone of the breaker handle, so several wrapped
    /// callables can guard the same dependency.
    pub fn wrap<A, F>(&self, op: F) -> Guarded<A, T, E, F>
    where
        F: FnMut(A) -> Result<T, E>,
    {
        Guarded {
            breaker: self.clone(),
            op,
            _args: PhantomData,
        }
    }

    /// Attach this breaker to an asynchronous callable.
    pub fn wrap_async<A, F, Fut>(&self, op: F) -> GuardedAsync<A, T, E, F>
    where
        F: FnMut(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        GuardedAsync {
            breaker: self.clone(),
            op,
            _args: PhantomData,
        }
    }
}

/// A synchronous callable guarded by a [`Breaker`].
pub struct Guarded<A, T, E, F> {
    breaker: Breaker<T, E>,
    op: F,
    _args: PhantomData<fn(A)>,
}

impl<A, T, E, F> Guarded<A, T, E, F>
where
    T: Clone,
    F: FnMut(A) -> Result<T, E>,
{
    /// Invoke the wrapped callable through the breaker.
    pub fn call(&mut self, arg: A) -> Result<Outcome<T>, E> {
        let op = &mut self.op;
        self.breaker.call(|| op(arg))
    }

    /// The breaker guarding this callable.
    pub fn breaker(&self) -> &Breaker<T, E> {
        &self.breaker
    }
}

/// An asynchronous callable guarded by a [`Breaker`].
pub struct GuardedAsync<A, T, E, F> {
    breaker: Breaker<T, E>,
    op: F,
    _args: PhantomData<fn(A)>,
}

impl<A, T, E, F> GuardedAsync<A, T, E, F>
where
    T: Clone,
{
    /// Invoke the wrapped callable through the breaker.
    pub async fn call<Fut>(&mut self, arg: A) -> Result<Outcome<T>, E>
    where
        F: FnMut(A) -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let op = &mut self.op;
        self.breaker.call_async(|| op(arg)).await
    }

    /// The breaker guarding this callable.
    pub fn breaker(&self) -> &Breaker<T, E> {
        &self.breaker
    }
}
