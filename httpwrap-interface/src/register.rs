use std::sync::OnceLock;

use crate::Backend;

/// The backend every facade request is routed to.
pub static BACKEND: OnceLock<Box<dyn Backend>> = OnceLock::new();

/// Registers the process-wide transfer backend.
///
/// # Panics
///
/// Panics if a backend has already been registered.
pub fn register_backend(backend: impl Backend) {
    if BACKEND.set(Box::new(backend)).is_err() {
        panic!("Backend already registered");
    }
}
