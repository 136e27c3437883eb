//! Errors raised by the built-in hooks.
//!
//! Every variant reaches the caller of a dispatch as [`hookfetch::Error::Hook`]
//! with the same message.

use hookfetch::BoxError;

#[derive(Debug, thiserror::Error)]
pub enum HookError {
    #[error("bad protocol: {0}:")]
    BadProtocol(String),

    #[error("invalid data: URI: {0}")]
    InvalidDataUri(String),

    #[error("Can't handle file: URIs with {part}: {value:?}")]
    FileUriPart { part: &'static str, value: String },

    #[error("Can only GET or HEAD a file: URI")]
    FileMethod,

    #[error("{0} is not a usable file: URI")]
    FileUri(String),

    #[error("s3 hook: unsupported HTTP verb {0}")]
    UnsupportedVerb(String),

    #[error("s3 hook: failed to sign {operation} for {bucket}/{key}: {source}")]
    Signer {
        operation: &'static str,
        bucket:    String,
        key:       String,
        #[source]
        source:    BoxError,
    },

    #[error("syslog target {0} did not resolve to an address")]
    SyslogTarget(String),

    #[error(transparent)]
    InvalidHeader(#[from] http::header::InvalidHeaderValue),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HookError>;

impl From<HookError> for hookfetch::Error {
    fn from(err: HookError) -> Self { hookfetch::Error::hook(err) }
}
