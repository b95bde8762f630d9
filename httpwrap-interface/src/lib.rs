//! Interface definitions for httpwrap transfer backends.
//!
//! This crate provides the contract a transfer backend must implement to be driven by the
//! httpwrap facade. A backend performs one request synchronously on the calling thread and
//! hands back the accumulated response body; everything about threading and result delivery
//! lives in the facade.
//!
//! ## Backend Registration
//!
//! Backend implementations must register themselves using the `register_backend` function
//! before the first request is issued through the facade.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]

mod backend;
mod error;
#[doc(hidden)] // For httpwrap facade only
pub mod register;
mod request;

pub use backend::Backend;
pub use error::{Error, Result};
pub use register::register_backend;
pub use request::{FormEncoding, Method, Request};
