use crate::{Request, Result};

/// A transfer engine capable of performing one HTTP exchange at a time per call.
///
/// Implementations must be thread-safe: the facade calls [`Backend::perform`] from many worker
/// threads concurrently, each with its own [`Request`].
pub trait Backend: Send + Sync + 'static {
    /// Process-wide startup of the underlying library. Called exactly once, before the first
    /// call to [`Backend::perform`].
    fn global_init(&self);

    /// Process-wide shutdown of the underlying library. Called at most once, right before the
    /// process exits on a termination signal.
    fn global_cleanup(&self);

    /// Performs the request to completion, blocking the current thread, and returns the whole
    /// response body in the order it was received.
    fn perform(&self, req: &Request) -> Result<Vec<u8>>;
}
