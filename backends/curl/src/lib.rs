//! libcurl backend for httpwrap.
//!
//! Every request runs on its own easy handle, created and released inside
//! [`Backend::perform`]. Call [`register`] once at startup to route facade requests here.

mod error;
mod handler;
mod request;
mod state;
mod url;

use curl::easy::Easy2;
use httpwrap_interface::{Backend, Request, Result as BackendResult};

use crate::error::IntoBackendResult;
use crate::handler::CurlHandler;

/// The libcurl transfer backend.
#[derive(Debug, Default, Clone, Copy)]
pub struct CurlBackend;

/// Runs libcurl's process-wide initialization. Safe to call more than once.
pub fn init() {
    curl::init();
}

/// Registers [`CurlBackend`] as the httpwrap backend.
///
/// libcurl itself is initialized lazily, by the first request.
pub fn register() {
    httpwrap_interface::register_backend(CurlBackend);
}

impl Backend for CurlBackend {
    fn global_init(&self) {
        let version = curl::Version::get();
        tracing::info!(version = version.version(), "initializing libcurl");
        init();
    }

    fn global_cleanup(&self) {
        // Safety: only called once, right before the process exits.
        unsafe { curl_sys::curl_global_cleanup() };
    }

    fn perform(&self, req: &Request) -> BackendResult<Vec<u8>> {
        let mut easy = Easy2::new(CurlHandler::default());
        request::populate_request(&mut easy, req)?;
        easy.perform().into_backend_result("perform")?;
        let state = &mut easy.get_mut().state;
        tracing::trace!(
            chunks = state.chunks_received,
            len = state.response_buffer.len(),
            "response body complete"
        );
        Ok(state.take_body())
    }
}
