//! Lifecycle listeners gathered from hook results.
//!
//! A dispatch collects the listeners of every hook that returned a result and
//! calls them around the final step: `prereq` just before it, `postreq` just
//! after it. A failing listener never changes what the dispatch returns. Its
//! error is handed to the `error` listeners, or to the [`FatalSink`] when there
//! are none or when an `error` listener fails as well.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, warn};

use crate::data::{Request, Response};
use crate::error::{BoxError, Error, LifecycleError};

pub type ListenerResult = std::result::Result<(), BoxError>;

/// Called with the request about to be settled and the time it started.
pub type PrereqListener = Arc<dyn Fn(&Request, DateTime<Utc>) -> ListenerResult + Send + Sync>;

/// Called with the settled request and exactly one of a response or an error.
pub type PostreqListener =
    Arc<dyn Fn(&Request, Option<&Response>, Option<&Error>) -> ListenerResult + Send + Sync>;

/// Called with the error of a failed `prereq` or `postreq` listener.
pub type ErrorListener = Arc<dyn Fn(&LifecycleError) -> ListenerResult + Send + Sync>;

/// The listeners one hook result carries.
#[derive(Clone, Default)]
pub struct Listeners {
    pub prereq:  Option<PrereqListener>,
    pub postreq: Option<PostreqListener>,
    pub error:   Option<ErrorListener>,
}

impl Listeners {
    pub fn new() -> Self { Self::default() }

    pub fn prereq<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request, DateTime<Utc>) -> ListenerResult + Send + Sync + 'static,
    {
        self.prereq = Some(Arc::new(f));
        self
    }

    pub fn postreq<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request, Option<&Response>, Option<&Error>) -> ListenerResult + Send + Sync + 'static,
    {
        self.postreq = Some(Arc::new(f));
        self
    }

    pub fn error<F>(mut self, f: F) -> Self
    where
        F: Fn(&LifecycleError) -> ListenerResult + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(f));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.prereq.is_none() && self.postreq.is_none() && self.error.is_none()
    }
}

impl fmt::Debug for Listeners {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listeners")
            .field("prereq", &self.prereq.is_some())
            .field("postreq", &self.postreq.is_some())
            .field("error", &self.error.is_some())
            .finish()
    }
}

/// Last stop for listener failures nobody handled.
///
/// Any `Fn(LifecycleError)` closure is a sink, which is what tests use to
/// capture escalations.
pub trait FatalSink: Send + Sync {
    fn escalate(&self, error: LifecycleError);
}

impl<F> FatalSink for F
where
    F: Fn(LifecycleError) + Send + Sync,
{
    fn escalate(&self, error: LifecycleError) { self(error) }
}

/// Default sink: report through `tracing` at error level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl FatalSink for LogSink {
    fn escalate(&self, err: LifecycleError) {
        error!(error = %err, "unhandled lifecycle listener failure");
    }
}

/// Listeners collected during one dispatch, in the order their hooks ran.
#[derive(Default)]
pub(crate) struct ListenerSet {
    prereqs:  Vec<PrereqListener>,
    postreqs: Vec<PostreqListener>,
    errors:   Vec<ErrorListener>,
}

impl ListenerSet {
    pub(crate) fn harvest(&mut self, listeners: Listeners) {
        let Listeners {
            prereq,
            postreq,
            error,
        } = listeners;
        self.prereqs.extend(prereq);
        self.postreqs.extend(postreq);
        self.errors.extend(error);
    }

    pub(crate) fn before(&self, request: &Request, started: DateTime<Utc>, sink: &dyn FatalSink) {
        for listener in &self.prereqs {
            if let Err(err) = listener(request, started) {
                warn!(url = %request.url(), error = %err, "prereq listener failed");
                self.fan_out(LifecycleError::from(err), sink);
            }
        }
    }

    pub(crate) fn after(
        &self,
        request: &Request,
        response: Option<&Response>,
        failure: Option<&Error>,
        sink: &dyn FatalSink,
    ) {
        for listener in &self.postreqs {
            if let Err(err) = listener(request, response, failure) {
                warn!(url = %request.url(), error = %err, "postreq listener failed");
                self.fan_out(LifecycleError::from(err), sink);
            }
        }
    }

    /// Every `error` listener sees `err`, whatever the others do. One that
    /// fails escalates `err` and then its own error.
    fn fan_out(&self, err: LifecycleError, sink: &dyn FatalSink) {
        if self.errors.is_empty() {
            sink.escalate(err);
            return;
        }

        for listener in &self.errors {
            if let Err(handler_err) = listener(&err) {
                sink.escalate(Arc::clone(&err));
                sink.escalate(LifecycleError::from(handler_err));
            }
        }
    }
}
