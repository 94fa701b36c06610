// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Wrappers to retry flaky calls.
//!
//! Integration tests and administrative tooling often call services that are
//! only eventually consistent: a freshly created resource is not visible
//! yet, or is visible while its state is not final. The wrappers in this
//! module repeat such calls with a backoff period between attempts. They
//! sleep on the current thread, see [backoff_policy][crate::backoff_policy]
//! for how the delays are computed.
//!
//! Three wrappers cover the common cases:
//! * [RetryErrors] retries an operation while it fails with retryable
//!   errors.
//! * [RetryResult] retries an infallible operation until its result is
//!   acceptable.
//! * [RetryInstanceState] retries an operation until the state it updates is
//!   acceptable.
//!
//! Each wrapper invokes the operation at most `max_tries` times in total,
//! and never sleeps after the last attempt. The outcome of the last attempt
//! is returned unchanged.
//!
//! # Example
//! ```
//! use listax::exponential_backoff::ExponentialBackoffBuilder;
//! use listax::retry::RetryErrors;
//! use std::time::Duration;
//!
//! #[derive(Debug, thiserror::Error)]
//! enum ApiError {
//!     #[error("resource not found")]
//!     NotFound,
//!     #[error("permission denied")]
//!     PermissionDenied,
//! }
//!
//! # fn lookup(name: &str) -> Result<String, ApiError> { Ok(name.to_string()) }
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let backoff = ExponentialBackoffBuilder::new()
//!     .with_initial_delay(Duration::from_millis(250))
//!     .with_maximum_delay(Duration::from_secs(2))
//!     .build()?;
//! let retry = RetryErrors::builder()
//!     .with_max_tries(3)
//!     .with_backoff_policy(backoff)
//!     .with_error_predicate(|e| matches!(e, ApiError::NotFound))
//!     .build()?;
//! // Repeats the lookup while the service is catching up.
//! let resource = retry.call(|| lookup("projects/p/instances/i"))?;
//! # assert_eq!(resource, "projects/p/instances/i");
//! # Ok(()) }
//! ```

use crate::backoff_policy::{BackoffPolicy, BackoffPolicyArg};
use crate::exponential_backoff::ExponentialBackoff;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// The default number of invocations, including the initial one.
const DEFAULT_MAX_TRIES: u32 = 4;

/// The error type for retry wrapper creation.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("the number of tries ({0}) should be >= 1")]
    InvalidMaxTries(u32),
}

/// The configuration shared by all the retry wrappers.
#[derive(Clone, Debug)]
struct RetryOptions {
    max_tries: u32,
    backoff_policy: Arc<dyn BackoffPolicy>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_tries: DEFAULT_MAX_TRIES,
            backoff_policy: Arc::new(ExponentialBackoff::default()),
        }
    }
}

impl RetryOptions {
    fn build(self) -> Result<Self, Error> {
        if self.max_tries == 0 {
            return Err(Error::InvalidMaxTries(self.max_tries));
        }
        Ok(self)
    }

    fn backoff<S>(&self, sleep: &mut S, loop_start: Instant, attempt_count: u32)
    where
        S: FnMut(Duration),
    {
        let delay = self.backoff_policy.on_failure(loop_start, attempt_count);
        tracing::debug!(attempt_count, ?delay, "backing off before the next attempt");
        sleep(delay);
    }
}

/// Retries an operation while it fails with retryable errors.
///
/// The wrapper invokes the operation up to `max_tries` times in total. A
/// successful result propagates immediately, and so does any error rejected
/// by the error predicate. The last attempt runs without a guard, its
/// success or error is returned unchanged.
pub struct RetryErrors<E> {
    options: RetryOptions,
    predicate: Box<dyn Fn(&E) -> bool + Send + Sync>,
}

impl<E> RetryErrors<E> {
    /// Creates a builder with the default configuration: every error is
    /// retryable, at most four tries, and exponential backoff starting at
    /// one second.
    pub fn builder() -> RetryErrorsBuilder<E> {
        RetryErrorsBuilder::new()
    }

    /// Invokes `op`, retrying while it fails with retryable errors.
    pub fn call<R>(&self, op: impl FnMut() -> Result<R, E>) -> Result<R, E> {
        self.call_impl(std::thread::sleep, op)
    }

    fn call_impl<R, S>(&self, mut sleep: S, mut op: impl FnMut() -> Result<R, E>) -> Result<R, E>
    where
        S: FnMut(Duration),
    {
        let loop_start = Instant::now();
        for attempt_count in 1..self.options.max_tries {
            match op() {
                Ok(result) => return Ok(result),
                Err(e) => {
                    if !(self.predicate)(&e) {
                        return Err(e);
                    }
                    self.options.backoff(&mut sleep, loop_start, attempt_count);
                }
            }
        }
        op()
    }
}

impl<E> std::fmt::Debug for RetryErrors<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryErrors")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// A builder for [RetryErrors].
pub struct RetryErrorsBuilder<E> {
    options: RetryOptions,
    predicate: Box<dyn Fn(&E) -> bool + Send + Sync>,
}

impl<E> RetryErrorsBuilder<E> {
    fn new() -> Self {
        Self {
            options: RetryOptions::default(),
            predicate: Box::new(|_| true),
        }
    }

    /// Change the total number of invocations, including the initial one.
    pub fn with_max_tries(mut self, v: u32) -> Self {
        self.options.max_tries = v;
        self
    }

    /// Change the backoff policy.
    pub fn with_backoff_policy<V: Into<BackoffPolicyArg>>(mut self, v: V) -> Self {
        self.options.backoff_policy = v.into().0;
        self
    }

    /// Change the predicate that decides if an error is retryable.
    ///
    /// Errors rejected by the predicate propagate to the caller immediately.
    pub fn with_error_predicate(
        mut self,
        v: impl Fn(&E) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.predicate = Box::new(v);
        self
    }

    /// Creates the wrapper.
    pub fn build(self) -> Result<RetryErrors<E>, Error> {
        Ok(RetryErrors {
            options: self.options.build()?,
            predicate: self.predicate,
        })
    }
}

/// Retries an infallible operation until its result is acceptable.
///
/// Useful to poll a service until it reaches a desired state, e.g. until a
/// freshly created resource shows up in a `list()` call. The wrapper invokes
/// the operation up to `max_tries` times in total, and returns the last
/// result unchanged when every attempt produced an unacceptable value.
pub struct RetryResult<R> {
    options: RetryOptions,
    predicate: Box<dyn Fn(&R) -> bool + Send + Sync>,
}

impl<R> RetryResult<R> {
    /// Creates a builder. `predicate` returns `true` when a result is
    /// acceptable.
    ///
    /// # Example
    /// ```
    /// # use listax::retry::{Error, RetryResult};
    /// #[derive(Debug, PartialEq)]
    /// enum State {
    ///     Creating,
    ///     Active,
    /// }
    ///
    /// let poll = RetryResult::builder(|state| *state == State::Active)
    ///     .with_max_tries(5)
    ///     .build()?;
    /// let state = poll.call(|| State::Active);
    /// assert_eq!(state, State::Active);
    /// # Ok::<(), Error>(())
    /// ```
    pub fn builder(
        predicate: impl Fn(&R) -> bool + Send + Sync + 'static,
    ) -> RetryResultBuilder<R> {
        RetryResultBuilder::new(predicate)
    }

    /// Invokes `op`, retrying until its result is acceptable.
    pub fn call(&self, op: impl FnMut() -> R) -> R {
        self.call_impl(std::thread::sleep, op)
    }

    fn call_impl<S>(&self, mut sleep: S, mut op: impl FnMut() -> R) -> R
    where
        S: FnMut(Duration),
    {
        let loop_start = Instant::now();
        for attempt_count in 1..self.options.max_tries {
            let result = op();
            if (self.predicate)(&result) {
                return result;
            }
            self.options.backoff(&mut sleep, loop_start, attempt_count);
        }
        op()
    }
}

impl<R> std::fmt::Debug for RetryResult<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryResult")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// A builder for [RetryResult].
pub struct RetryResultBuilder<R> {
    options: RetryOptions,
    predicate: Box<dyn Fn(&R) -> bool + Send + Sync>,
}

impl<R> RetryResultBuilder<R> {
    fn new(predicate: impl Fn(&R) -> bool + Send + Sync + 'static) -> Self {
        Self {
            options: RetryOptions::default(),
            predicate: Box::new(predicate),
        }
    }

    /// Change the total number of invocations, including the initial one.
    pub fn with_max_tries(mut self, v: u32) -> Self {
        self.options.max_tries = v;
        self
    }

    /// Change the backoff policy.
    pub fn with_backoff_policy<V: Into<BackoffPolicyArg>>(mut self, v: V) -> Self {
        self.options.backoff_policy = v.into().0;
        self
    }

    /// Creates the wrapper.
    pub fn build(self) -> Result<RetryResult<R>, Error> {
        Ok(RetryResult {
            options: self.options.build()?,
            predicate: self.predicate,
        })
    }
}

/// Retries an operation until the state it updates is acceptable.
///
/// Some operations report their outcome through an object they mutate
/// rather than through their return value, e.g. a `reload()` that refreshes
/// a resource in place. The predicate runs against the state after every
/// attempt, and the return value of the last attempt is passed through.
///
/// # Example
/// ```
/// # use listax::retry::{Error, RetryInstanceState};
/// struct Instance {
///     state: String,
/// }
///
/// let poll = RetryInstanceState::builder(|instance: &Instance| instance.state == "RUNNING")
///     .build()?;
/// let mut instance = Instance { state: "RUNNING".into() };
/// poll.call(&mut instance, |_| ());
/// # Ok::<(), Error>(())
/// ```
pub struct RetryInstanceState<S> {
    options: RetryOptions,
    predicate: Box<dyn Fn(&S) -> bool + Send + Sync>,
}

impl<S> RetryInstanceState<S> {
    /// Creates a builder. `predicate` returns `true` when the state is
    /// acceptable.
    pub fn builder(
        predicate: impl Fn(&S) -> bool + Send + Sync + 'static,
    ) -> RetryInstanceStateBuilder<S> {
        RetryInstanceStateBuilder::new(predicate)
    }

    /// Invokes `op` on `state`, retrying until the state is acceptable.
    pub fn call<R>(&self, state: &mut S, op: impl FnMut(&mut S) -> R) -> R {
        self.call_impl(std::thread::sleep, state, op)
    }

    fn call_impl<R, F>(&self, mut sleep: F, state: &mut S, mut op: impl FnMut(&mut S) -> R) -> R
    where
        F: FnMut(Duration),
    {
        let loop_start = Instant::now();
        for attempt_count in 1..self.options.max_tries {
            let result = op(state);
            if (self.predicate)(state) {
                return result;
            }
            self.options.backoff(&mut sleep, loop_start, attempt_count);
        }
        op(state)
    }
}

impl<S> std::fmt::Debug for RetryInstanceState<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryInstanceState")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// A builder for [RetryInstanceState].
pub struct RetryInstanceStateBuilder<S> {
    options: RetryOptions,
    predicate: Box<dyn Fn(&S) -> bool + Send + Sync>,
}

impl<S> RetryInstanceStateBuilder<S> {
    fn new(predicate: impl Fn(&S) -> bool + Send + Sync + 'static) -> Self {
        Self {
            options: RetryOptions::default(),
            predicate: Box::new(predicate),
        }
    }

    /// Change the total number of invocations, including the initial one.
    pub fn with_max_tries(mut self, v: u32) -> Self {
        self.options.max_tries = v;
        self
    }

    /// Change the backoff policy.
    pub fn with_backoff_policy<V: Into<BackoffPolicyArg>>(mut self, v: V) -> Self {
        self.options.backoff_policy = v.into().0;
        self
    }

    /// Creates the wrapper.
    pub fn build(self) -> Result<RetryInstanceState<S>, Error> {
        Ok(RetryInstanceState {
            options: self.options.build()?,
            predicate: self.predicate,
        })
    }
}
