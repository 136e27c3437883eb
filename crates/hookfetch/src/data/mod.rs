//! Value types flowing through a dispatch.
//!
//! Requests and responses are plain owned values. Hooks never mutate the
//! request they are handed; they build a new one and return it.

pub mod body;
pub mod request;
pub mod response;

pub use body::{Body, BodyStream, BoxStream, ByteStream, SharedStream};
pub use request::{RedirectPolicy, Request, RequestInit, RequestInput, TransportHints};
pub use response::{DEFAULT_RESPONSE_TYPE, Response};
