//! Error types for hookfetch.

use std::sync::Arc;

/// Opaque error produced by a hook, a transport or a listener.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A lifecycle listener failure, shared between every error listener and the
/// fatal sink that may receive it.
pub type LifecycleError = Arc<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No hook produced a response and no upstream transport is configured.
    #[error("No hook permits access to: {url}")]
    AccessDenied { url: String },

    /// A hook returned a result with nothing in it.
    #[error("hook {hook} broke its contract: {reason}")]
    ContractViolation { hook: String, reason: &'static str },

    /// A hook vetoed the request.
    #[error(transparent)]
    Hook(BoxError),

    /// The upstream transport failed.
    #[error(transparent)]
    Upstream(BoxError),

    #[error("invalid URL {url:?}: {source}")]
    InvalidUrl {
        url:    String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Wrap any error raised inside a hook.
    pub fn hook(err: impl Into<BoxError>) -> Self { Error::Hook(err.into()) }

    /// Wrap any error raised by an upstream transport.
    pub fn upstream(err: impl Into<BoxError>) -> Self { Error::Upstream(err.into()) }

    pub fn is_access_denied(&self) -> bool { matches!(self, Error::AccessDenied { .. }) }
}
