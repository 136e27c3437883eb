//! Everything that runs during a dispatch: hooks, lifecycle listeners, the
//! upstream transport and the dispatcher tying them together.

mod dispatcher;
mod hook;
mod http;
mod lifecycle;

pub use dispatcher::{Dispatcher, DispatcherBuilder};
pub use hook::{FnHook, Hook, HookResult, Outcome, hook_fn};
#[cfg(feature = "reqwest")]
pub use http::ReqwestTransport;
pub use http::{FnTransport, Transport, transport_fn};
pub use lifecycle::{
    ErrorListener, FatalSink, ListenerResult, Listeners, LogSink, PostreqListener, PrereqListener,
};
