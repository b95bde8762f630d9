use std::fmt::{self, Debug};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll, Waker};
use std::time::Duration;

struct State<T> {
    value: Option<T>,
    wakers: Vec<Waker>,
}

struct Shared<T> {
    state: Mutex<State<T>>,
    settled: Condvar,
}

/// A single-assignment slot for the result of a request.
///
/// The handle is written exactly once by the worker that performs the request. Reads may happen
/// any number of times from any thread: [`Deferred::wait`] blocks until the value is available,
/// and every read after that returns a clone of the same value immediately. The handle is also a
/// [`Future`], so async code can `.await` it without blocking a thread.
///
/// Cloning the handle is cheap and every clone observes the same slot.
pub struct Deferred<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Shared<T> {
    fn lock(&self) -> MutexGuard<'_, State<T>> {
        // The state is only mutated by infallible assignments, so it stays valid across a panic.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T> Deferred<T> {
    pub(crate) fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(State {
                    value: None,
                    wakers: Vec::new(),
                }),
                settled: Condvar::new(),
            }),
        }
    }

    #[cfg(test)]
    pub(crate) fn settled(value: T) -> Self {
        let this = Self::new();
        this.set(value);
        this
    }

    /// Stores `value` and wakes every waiting reader. Returns `false` without touching the slot
    /// if it was already settled.
    pub(crate) fn set(&self, value: T) -> bool {
        let wakers = {
            let mut state = self.shared.lock();
            if state.value.is_some() {
                return false;
            }
            state.value = Some(value);
            std::mem::take(&mut state.wakers)
        };
        self.shared.settled.notify_all();
        for waker in wakers {
            waker.wake();
        }
        true
    }

    /// Whether the result is available.
    pub fn is_settled(&self) -> bool {
        self.shared.lock().value.is_some()
    }
}

impl<T: Clone> Deferred<T> {
    /// Blocks the current thread until the result is available and returns a copy of it.
    pub fn wait(&self) -> T {
        let mut state = self.shared.lock();
        loop {
            if let Some(value) = &state.value {
                return value.clone();
            }
            state = self
                .shared
                .settled
                .wait(state)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`Deferred::wait`], but gives up after `timeout` and returns `None`.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<T> {
        let state = self.shared.lock();
        let (state, _) = self
            .shared
            .settled
            .wait_timeout_while(state, timeout, |state| state.value.is_none())
            .unwrap_or_else(PoisonError::into_inner);
        state.value.clone()
    }

    /// Returns the result if it is available, without blocking.
    pub fn try_get(&self) -> Option<T> {
        self.shared.lock().value.clone()
    }
}

impl<T: Clone> Future for Deferred<T> {
    type Output = T;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<T> {
        let mut state = self.shared.lock();
        if let Some(value) = &state.value {
            return Poll::Ready(value.clone());
        }
        if !state.wakers.iter().any(|w| w.will_wake(cx.waker())) {
            state.wakers.push(cx.waker().clone());
        }
        Poll::Pending
    }
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Debug> Debug for Deferred<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("Deferred")
            .field("value", &state.value)
            .finish()
    }
}
