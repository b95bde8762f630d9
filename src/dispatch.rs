use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::thread;

use httpwrap_interface::{Backend, Method};

use crate::deferred::Deferred;
use crate::lifecycle::LifecycleGuard;
use crate::{Error, Options, Outcome, Response};

pub(crate) type Callback = Box<dyn FnOnce(&Outcome) + Send>;

/// The backend and lifecycle guard a request is executed against.
#[derive(Clone, Copy)]
pub(crate) struct Engine {
    pub(crate) backend: &'static dyn Backend,
    pub(crate) lifecycle: &'static LifecycleGuard,
}

/// The write side of one request's delivery channels.
///
/// Settling consumes the value, so the callback and the handle can fire at most once. If the
/// value is dropped unsettled, e.g. because the worker panicked or was never started, both
/// channels receive a [`Error::WORKER_LOST`] error instead.
pub(crate) struct Completion {
    callback: Option<Callback>,
    deferred: Option<Deferred<Outcome>>,
}

impl Completion {
    pub(crate) fn new(callback: Callback, deferred: Deferred<Outcome>) -> Self {
        Self {
            callback: Some(callback),
            deferred: Some(deferred),
        }
    }

    /// Invokes the callback, then settles the handle. A panicking callback is re-raised only after
    /// the handle has been settled.
    pub(crate) fn settle(mut self, outcome: Outcome) {
        if let Some(payload) = self.deliver(outcome) {
            panic::resume_unwind(payload);
        }
    }

    fn deliver(&mut self, outcome: Outcome) -> Option<Box<dyn Any + Send>> {
        let deferred = self.deferred.take()?;
        let panicked = self.callback.take().and_then(|callback| {
            panic::catch_unwind(AssertUnwindSafe(|| callback(&outcome))).err()
        });
        deferred.set(outcome);
        panicked
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if self.deferred.is_some() {
            tracing::warn!("request worker lost before producing an outcome");
            if self.deliver(Err(Error::worker_lost())).is_some() {
                tracing::warn!("callback panicked while delivering a lost-worker error");
            }
        }
    }
}

fn execute(engine: Engine, method: Method, options: Options) -> Outcome {
    let req = options.into_request(method);
    match engine.backend.perform(&req) {
        Ok(body) => {
            tracing::debug!(?method, url = %req.url, len = body.len(), "request finished");
            Ok(Response::from_bytes(body))
        }
        Err(e) => {
            tracing::warn!(?method, url = %req.url, error = %e, "request failed");
            Err(e.into())
        }
    }
}

/// Makes sure the backend is initialized, then starts one detached worker thread for the request
/// and returns the handle it will settle.
pub(crate) fn dispatch(
    engine: Engine,
    method: Method,
    options: Options,
    callback: Callback,
) -> Deferred<Outcome> {
    engine.lifecycle.ensure_initialized(engine.backend);
    let deferred = Deferred::new();
    let completion = Completion::new(callback, deferred.clone());
    tracing::debug!(?method, url = options.url(), "dispatching request");
    let spawned = thread::Builder::new()
        .name("httpwrap-worker".into())
        .spawn(move || {
            let outcome = execute(engine, method, options);
            completion.settle(outcome);
        });
    // On failure the closure, and the completion inside it, has already been dropped, which
    // settles the handle.
    if let Err(e) = spawned {
        tracing::warn!(%e, "failed to spawn request worker");
    }
    deferred
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        mpsc, Arc, Mutex,
    };
    use std::time::Duration;

    use httpwrap_interface::{Error as ErrorImpl, Request, Result as BackendResult};

    use super::*;

    /// Answers every request from memory. Requests to a URL containing `fail` fail with code 7,
    /// requests to a URL containing `panic` panic, and `block` waits for a release signal.
    #[derive(Default)]
    struct FakeBackend {
        inits: AtomicUsize,
        performs: AtomicUsize,
        release: Mutex<Option<mpsc::Receiver<()>>>,
    }

    impl Backend for FakeBackend {
        fn global_init(&self) {
            self.inits.fetch_add(1, Ordering::SeqCst);
        }

        fn global_cleanup(&self) {}

        fn perform(&self, req: &Request) -> BackendResult<Vec<u8>> {
            assert_eq!(self.inits.load(Ordering::SeqCst), 1);
            self.performs.fetch_add(1, Ordering::SeqCst);
            if req.url.contains("fail") {
                return Err(ErrorImpl::Transfer {
                    code: 7,
                    message: "couldn't connect".into(),
                });
            }
            if req.url.contains("panic") {
                panic!("backend exploded");
            }
            if req.url.contains("block") {
                let rx = self.release.lock().unwrap().take().unwrap();
                rx.recv().unwrap();
            }
            if req.method == Method::Post {
                req.form_encoding()?;
            }
            let query: Vec<_> = req.query.iter().map(|(k, v)| format!("{k}={v}")).collect();
            Ok(format!("{:?} {} {}", req.method, req.url, query.join("&")).into_bytes())
        }
    }

    fn engine() -> (&'static FakeBackend, Engine) {
        let backend: &'static FakeBackend = Box::leak(Box::default());
        let lifecycle = Box::leak(Box::new(LifecycleGuard::new(false)));
        (backend, Engine { backend, lifecycle })
    }

    fn recording_callback() -> (Callback, mpsc::Receiver<Outcome>) {
        let (tx, rx) = mpsc::channel();
        let callback: Callback = Box::new(move |outcome: &Outcome| {
            tx.send(outcome.clone()).unwrap();
        });
        (callback, rx)
    }

    #[test]
    fn test_both_channels_receive_same_outcome() {
        let (backend, engine) = engine();
        let (callback, rx) = recording_callback();
        let options = Options::new("http://fake/get").with_param("a", "1");
        let deferred = dispatch(engine, Method::Get, options, callback);
        let from_handle = deferred.wait();
        let from_callback = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(from_handle, from_callback);
        assert_eq!(from_handle.unwrap().body(), "Get http://fake/get a=1");
        assert!(rx.try_recv().is_err());
        assert_eq!(backend.performs.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_transfer_failure_reaches_both_channels() {
        let (_, engine) = engine();
        let (callback, rx) = recording_callback();
        let deferred = dispatch(engine, Method::Get, Options::new("http://fail"), callback);
        let err = deferred.wait().unwrap_err();
        assert_eq!(err.code(), 7);
        assert_eq!(rx.recv().unwrap(), Err(err));
    }

    #[test]
    fn test_missing_content_type_is_delivered() {
        let (_, engine) = engine();
        let (callback, rx) = recording_callback();
        let options = Options::new("http://fake/post").with_form_field("message", "hello");
        let deferred = dispatch(engine, Method::Post, options, callback);
        let err = deferred.wait().unwrap_err();
        assert_eq!(err.code(), Error::MISSING_CONTENT_TYPE);
        assert_eq!(rx.recv().unwrap(), Err(err));
    }

    #[test]
    fn test_dispatch_returns_before_completion() {
        let (backend, engine) = engine();
        let (tx, rx) = mpsc::channel();
        *backend.release.lock().unwrap() = Some(rx);
        let called = Arc::new(AtomicUsize::new(0));
        let callback: Callback = Box::new({
            let called = Arc::clone(&called);
            move |_: &Outcome| {
                called.fetch_add(1, Ordering::SeqCst);
            }
        });
        let deferred = dispatch(engine, Method::Get, Options::new("http://block"), callback);
        assert!(deferred.wait_timeout(Duration::from_millis(50)).is_none());
        assert_eq!(called.load(Ordering::SeqCst), 0);
        tx.send(()).unwrap();
        assert!(deferred.wait().is_ok());
        assert_eq!(called.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_init_waits_for_first_request() {
        let (backend, engine) = engine();
        assert_eq!(backend.inits.load(Ordering::SeqCst), 0);
        let deferred = dispatch(
            engine,
            Method::Get,
            Options::new("http://fake/first"),
            Box::new(|_: &Outcome| {}),
        );
        assert_eq!(backend.inits.load(Ordering::SeqCst), 1);
        assert!(deferred.wait().is_ok());
    }

    #[test]
    fn test_concurrent_requests_initialize_once() {
        let (backend, engine) = engine();
        let handles: Vec<_> = (0..16)
            .map(|i| {
                let options = Options::new(format!("http://fake/{i}"));
                dispatch(engine, Method::Get, options, Box::new(|_: &Outcome| {}))
            })
            .collect();
        for (i, handle) in handles.iter().enumerate() {
            let body = handle.wait().unwrap().into_body();
            assert_eq!(body, format!("Get http://fake/{i} "));
        }
        assert_eq!(backend.inits.load(Ordering::SeqCst), 1);
        assert_eq!(backend.performs.load(Ordering::SeqCst), 16);
    }

    #[test]
    fn test_backend_panic_settles_worker_lost() {
        let (_, engine) = engine();
        let (callback, rx) = recording_callback();
        let deferred = dispatch(engine, Method::Get, Options::new("http://panic"), callback);
        let err = deferred.wait().unwrap_err();
        assert_eq!(err.code(), Error::WORKER_LOST);
        assert_eq!(rx.recv().unwrap(), Err(err));
    }

    #[test]
    fn test_callback_panic_still_settles_handle() {
        let (_, engine) = engine();
        let callback: Callback = Box::new(|_: &Outcome| panic!("callback exploded"));
        let deferred = dispatch(engine, Method::Get, Options::new("http://fake/x"), callback);
        assert_eq!(deferred.wait().unwrap().body(), "Get http://fake/x ");
    }

    #[test]
    fn test_dropped_completion_settles_once() {
        let deferred = Deferred::new();
        let (callback, rx) = recording_callback();
        drop(Completion::new(callback, deferred.clone()));
        assert_eq!(deferred.wait().unwrap_err().code(), Error::WORKER_LOST);
        assert!(rx.recv().unwrap().is_err());
        assert!(rx.recv().is_err());
    }
}
