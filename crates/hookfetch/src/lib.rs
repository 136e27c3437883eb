//! # hookfetch
//!
//! A `fetch`-style request function built from an ordered chain of hooks.
//!
//! Each hook sees the request in turn and may leave it alone, replace it,
//! answer it with a response, or veto it with an error. Requests nobody
//! answers go to an upstream [`Transport`]; without one they are denied.
//! Hooks can also attach lifecycle listeners that run just before and just
//! after the final step of the dispatch.
//!
//! ## Architecture
//!
//! - [`data`]: requests, responses and bodies
//! - [`core`]: pure transformations (URI fixups, response normalization)
//! - [`effects`]: hooks, listeners, transports and the dispatcher
//!
//! ## Example
//!
//! ```
//! use hookfetch::{Dispatcher, HookResult, Listeners, Response, hook_fn};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> hookfetch::Result<()> {
//! let log = hook_fn(|_| async {
//!     Ok(Some(HookResult::observe(Listeners::new().postreq(|request, response, _| {
//!         let status = response.map(|r| r.status().as_u16());
//!         println!("{} {} -> {status:?}", request.method(), request.url());
//!         Ok(())
//!     }))))
//! });
//! let hello = hook_fn(|_| async { Ok(Some(HookResult::respond(Response::new("hello")))) });
//!
//! let dispatcher = Dispatcher::builder().hook(log).hook(hello).build();
//! let response = dispatcher.fetch("https://example.com/").await?;
//! assert_eq!(response.text().await.unwrap(), "hello");
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod data;
pub mod effects;
pub mod error;

pub use crate::core::{FixupContext, UriFixups, WorkingDir, normalize};
pub use crate::data::{
    Body, RedirectPolicy, Request, RequestInit, RequestInput, Response, TransportHints,
};
#[cfg(feature = "reqwest")]
pub use crate::effects::ReqwestTransport;
pub use crate::effects::{
    Dispatcher, DispatcherBuilder, FatalSink, Hook, HookResult, Listeners, LogSink, Outcome,
    Transport, hook_fn, transport_fn,
};
pub use crate::error::{BoxError, Error, LifecycleError, Result};

pub use http;
pub use url::Url;
