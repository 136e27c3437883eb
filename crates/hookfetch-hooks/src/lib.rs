//! Built-in hooks for [`hookfetch`].
//!
//! | hook | does |
//! |------|------|
//! | [`DataHook`] | answers `data:` URIs |
//! | [`FileHook`] | serves `file:` URIs under a base directory |
//! | [`HttpsOnly`] | vetoes anything but HTTPS |
//! | [`CurlHook`] | dumps requests as `curl` command lines |
//! | [`CookieHook`] | keeps a cookie jar (feature `cookies`) |
//! | [`SyslogHook`] | reports dispatches to syslog over UDP |
//! | [`S3Hook`] | rewrites `s3:` URLs to presigned HTTPS URLs |
//!
//! ```
//! use hookfetch::Dispatcher;
//! use hookfetch_hooks::{DataHook, FileHook};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> hookfetch::Result<()> {
//! let dispatcher = Dispatcher::builder()
//!     .hook(DataHook)
//!     .hook(FileHook::default())
//!     .build();
//!
//! let response = dispatcher.fetch("data:,hello%20world").await?;
//! assert_eq!(response.text().await.unwrap(), "hello world");
//! # Ok(())
//! # }
//! ```

#[cfg(feature = "cookies")]
mod cookies;
mod curl;
mod data;
mod error;
mod file;
mod https_only;
pub mod s3;
pub mod syslog;

#[cfg(feature = "cookies")]
pub use cookies::CookieHook;
pub use curl::{CurlHook, curl_command};
pub use data::{DataHook, data_response};
pub use error::{HookError, Result};
pub use file::{FileHook, FileHookOptions};
pub use https_only::HttpsOnly;
pub use s3::{S3Hook, S3HookOptions, S3Operation, UrlSigner};
pub use syslog::{SyslogHook, SyslogOptions};
