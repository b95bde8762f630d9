//! A small asynchronous HTTP client on top of a native transfer library.
//!
//! ## Overview
//!
//! `httpwrap` runs every request on its own detached worker thread and hands the result back
//! twice: to an optional callback, invoked on the worker as soon as the transfer finishes, and
//! through a [`Deferred`] handle that can be waited on from any thread or `.await`ed. Both
//! channels observe the very same [`Outcome`], exactly once.
//!
//! The HTTP exchange itself is delegated to a backend implementing
//! [`httpwrap_interface::Backend`]. The libcurl backend lives in `httpwrap-backend-curl`.
//!
//! ### Backends
//!
//! Before issuing requests, register a backend at the beginning of your program:
//!
//! ```ignore
//! httpwrap_backend_curl::register();
//! ```
//!
//! The first request performs the backend's process-wide initialization. At that point a watcher
//! thread is also started that cleans the library up and exits the process on SIGTERM or Ctrl+C;
//! call [`disable_terminate_hook`] beforehand if your application handles signals itself.
//!
//! ## Usage
//!
//! Fire and forget with a callback:
//!
//! ```no_run
//! use httpwrap::Options;
//!
//! httpwrap::get_with(Options::new("http://127.0.0.1:1234/get"), |outcome| {
//!     if let Ok(response) = outcome {
//!         println!("{}", response.body());
//!     }
//! });
//! ```
//!
//! Or block on the handle:
//!
//! ```no_run
//! use httpwrap::Options;
//!
//! let options = Options::new("http://127.0.0.1:1234/post")
//!     .with_header("content-type", "application/x-www-form-urlencoded")
//!     .with_form_field("message", "hello");
//! let response = httpwrap::post(options).wait()?;
//! println!("{}", response.body());
//! # Ok::<(), httpwrap::Error>(())
//! ```
//!
//! POST bodies are sent as `multipart/form-data` when the `content-type` header names that media
//! type, and urlencoded otherwise. A POST without a `content-type` header fails with
//! [`Error::MISSING_CONTENT_TYPE`].

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(missing_docs)]

mod deferred;
mod dispatch;
mod error;
mod lifecycle;
mod options;
mod response;

pub use deferred::Deferred;
pub use error::{Error, Result};
pub use httpwrap_interface::Method;
pub use lifecycle::disable_terminate_hook;
pub use options::Options;
pub use response::Response;

use httpwrap_interface::register::BACKEND;

use dispatch::{Callback, Completion, Engine};

/// What a request produces, delivered to both the callback and the [`Deferred`] handle.
pub type Outcome = Result<Response>;

/// Issues a request and invokes `callback` on the worker thread once it has completed.
///
/// The returned handle settles with the same outcome right after the callback returns. If no
/// backend has been registered, both channels receive an [`Error::NO_BACKEND`] error before this
/// function returns.
pub fn request_with<F>(method: Method, options: Options, callback: F) -> Deferred<Outcome>
where
    F: FnOnce(&Outcome) + Send + 'static,
{
    let callback: Callback = Box::new(callback);
    let Some(backend) = BACKEND.get() else {
        tracing::warn!(url = options.url(), "request issued without a registered backend");
        let deferred = Deferred::new();
        Completion::new(callback, deferred.clone()).settle(Err(Error::no_backend()));
        return deferred;
    };
    let engine = Engine {
        backend: &**backend,
        lifecycle: &lifecycle::GLOBAL,
    };
    dispatch::dispatch(engine, method, options, callback)
}

/// Issues a request without a callback. Use the returned handle to get the outcome.
pub fn request(method: Method, options: Options) -> Deferred<Outcome> {
    request_with(method, options, |_: &Outcome| {})
}

/// Shorthand for [`request`] with [`Method::Get`].
pub fn get(options: Options) -> Deferred<Outcome> {
    request(Method::Get, options)
}

/// Shorthand for [`request`] with [`Method::Post`].
pub fn post(options: Options) -> Deferred<Outcome> {
    request(Method::Post, options)
}

/// Shorthand for [`request_with`] with [`Method::Get`].
pub fn get_with<F>(options: Options, callback: F) -> Deferred<Outcome>
where
    F: FnOnce(&Outcome) + Send + 'static,
{
    request_with(Method::Get, options, callback)
}

/// Shorthand for [`request_with`] with [`Method::Post`].
pub fn post_with<F>(options: Options, callback: F) -> Deferred<Outcome>
where
    F: FnOnce(&Outcome) + Send + 'static,
{
    request_with(Method::Post, options, callback)
}
