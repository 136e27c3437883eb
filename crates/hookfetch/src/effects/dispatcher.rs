use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use super::hook::{Hook, Outcome};
use super::http::Transport;
use super::lifecycle::{FatalSink, ListenerSet, LogSink};
use crate::core::{Fixer, FixupContext, UriFixups, WorkingDir, normalize};
use crate::data::{Request, RequestInit, RequestInput, Response};
use crate::error::{Error, Result};

/// Runs requests through an ordered chain of hooks and, when none of them
/// answers, through the upstream transport.
///
/// A dispatcher is read-only once built. Clones share their hooks and
/// upstream, and concurrent dispatches do not interact.
///
/// # Examples
///
/// ```
/// use hookfetch::{Dispatcher, HookResult, Response, hook_fn};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let dispatcher = Dispatcher::builder()
///     .hook(hook_fn(|_| async { Ok(Some(HookResult::respond(Response::new("hi")))) }))
///     .build();
///
/// let response = dispatcher.fetch("https://example.com").await.unwrap();
/// assert_eq!(response.kind(), Some("default"));
/// assert_eq!(response.text().await.unwrap(), "hi");
/// # }
/// ```
#[derive(Clone)]
pub struct Dispatcher {
    upstream:    Option<Arc<dyn Transport>>,
    hooks:       Arc<[Arc<dyn Hook>]>,
    fixups:      UriFixups,
    working_dir: WorkingDir,
    sink:        Arc<dyn FatalSink>,
}

impl Dispatcher {
    /// A dispatcher with default fixups, the process working directory and
    /// failures of unhandled listeners logged.
    pub fn new(upstream: Option<Arc<dyn Transport>>, hooks: Vec<Arc<dyn Hook>>) -> Self {
        Self {
            upstream,
            hooks: hooks.into(),
            fixups: UriFixups::default(),
            working_dir: WorkingDir::default(),
            sink: Arc::new(LogSink),
        }
    }

    pub fn builder() -> DispatcherBuilder { DispatcherBuilder::default() }

    pub fn hooks(&self) -> &[Arc<dyn Hook>] { &self.hooks }

    pub fn has_upstream(&self) -> bool { self.upstream.is_some() }

    /// `dispatch(input, RequestInit::default())`.
    pub async fn fetch(&self, input: impl Into<RequestInput>) -> Result<Response> {
        self.dispatch(input, RequestInit::default()).await
    }

    /// Run one request through the chain.
    ///
    /// Hooks see the request in registration order, each one the latest
    /// replacement. The first hook to respond ends the chain; without one the
    /// upstream transport is called, and without an upstream the request is
    /// denied. Listeners gathered on the way run around that final step and
    /// their failures never change the result.
    pub async fn dispatch(&self, input: impl Into<RequestInput>, init: RequestInit) -> Result<Response> {
        let mut request = self.build_request(input.into(), init)?;
        let mut listeners = ListenerSet::default();
        let mut answer = None;

        for hook in self.hooks.iter() {
            let name = hook.name();
            debug!(hook = name, method = %request.method(), url = %request.url(), "calling hook");

            let result = match hook.call(&request).await {
                Ok(Some(result)) => result,
                Ok(None) => continue,
                Err(err) => return Err(self.abort(&listeners, &request, err)),
            };

            let (outcome, hook_listeners) = result.into_parts();
            let observing = !hook_listeners.is_empty();
            listeners.harvest(hook_listeners);

            match outcome {
                Outcome::Respond(response) => {
                    debug!(hook = name, status = %response.status(), "hook responded");
                    answer = Some(response);
                    break;
                }
                Outcome::Replace(replacement) => {
                    debug!(hook = name, url = %replacement.url(), "hook replaced request");
                    request = replacement;
                }
                Outcome::Observe if observing => {}
                Outcome::Observe => {
                    let err = Error::ContractViolation {
                        hook:   name.to_owned(),
                        reason: "observed without listeners",
                    };
                    return Err(self.abort(&listeners, &request, err));
                }
            }
        }

        listeners.before(&request, Utc::now(), &*self.sink);

        let result = match (answer, &self.upstream) {
            (Some(response), _) => Ok(normalize(response)),
            (None, Some(upstream)) => upstream.send(request.clone()).await.map(normalize),
            (None, None) => Err(Error::AccessDenied {
                url: request.url().to_string(),
            }),
        };

        match &result {
            Ok(response) => listeners.after(&request, Some(response), None, &*self.sink),
            Err(err) => {
                debug!(url = %request.url(), error = %err, "dispatch failed");
                listeners.after(&request, None, Some(err), &*self.sink)
            }
        }
        result
    }

    fn build_request(&self, input: RequestInput, init: RequestInit) -> Result<Request> {
        let request = match input {
            RequestInput::Url(url) => {
                let ctx = FixupContext::from_working_dir(&self.working_dir);
                Request::get(&self.fixups.apply(&url, &ctx))?
            }
            RequestInput::Request(request) => request,
        };
        request.with_init(init)
    }

    /// Settle the listeners gathered so far with `err` and hand it back.
    fn abort(&self, listeners: &ListenerSet, request: &Request, err: Error) -> Error {
        warn!(url = %request.url(), error = %err, "hook chain aborted");
        listeners.before(request, Utc::now(), &*self.sink);
        listeners.after(request, None, Some(&err), &*self.sink);
        err
    }
}

#[async_trait]
impl Transport for Dispatcher {
    async fn send(&self, request: Request) -> Result<Response> {
        self.dispatch(request, RequestInit::default()).await
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks: Vec<&str> = self.hooks.iter().map(|hook| hook.name()).collect();
        f.debug_struct("Dispatcher")
            .field("hooks", &hooks)
            .field("upstream", &self.upstream.is_some())
            .field("fixups", &self.fixups)
            .field("working_dir", &self.working_dir)
            .finish()
    }
}

/// Builder for [`Dispatcher`].
#[derive(Default)]
pub struct DispatcherBuilder {
    upstream:    Option<Arc<dyn Transport>>,
    hooks:       Vec<Arc<dyn Hook>>,
    fixups:      UriFixups,
    working_dir: WorkingDir,
    sink:        Option<Arc<dyn FatalSink>>,
}

impl DispatcherBuilder {
    pub fn upstream(mut self, upstream: impl Transport + 'static) -> Self {
        self.upstream = Some(Arc::new(upstream));
        self
    }

    pub fn shared_upstream(mut self, upstream: Arc<dyn Transport>) -> Self {
        self.upstream = Some(upstream);
        self
    }

    /// Append a hook; hooks run in the order they are added.
    pub fn hook(mut self, hook: impl Hook + 'static) -> Self {
        self.hooks.push(Arc::new(hook));
        self
    }

    pub fn shared_hook(mut self, hook: Arc<dyn Hook>) -> Self {
        self.hooks.push(hook);
        self
    }

    pub fn hooks(mut self, hooks: impl IntoIterator<Item = Arc<dyn Hook>>) -> Self {
        self.hooks.extend(hooks);
        self
    }

    pub fn working_dir(mut self, working_dir: WorkingDir) -> Self {
        self.working_dir = working_dir;
        self
    }

    /// Append a fixer after the built-in ones.
    pub fn fixer(mut self, fixer: Fixer) -> Self {
        self.fixups = self.fixups.with(fixer);
        self
    }

    /// Replace the whole fixup list.
    pub fn fixups(mut self, fixups: UriFixups) -> Self {
        self.fixups = fixups;
        self
    }

    pub fn fatal_sink(mut self, sink: impl FatalSink + 'static) -> Self {
        self.sink = Some(Arc::new(sink));
        self
    }

    pub fn build(self) -> Dispatcher {
        Dispatcher {
            upstream:    self.upstream,
            hooks:       self.hooks.into(),
            fixups:      self.fixups,
            working_dir: self.working_dir,
            sink:        self.sink.unwrap_or_else(|| Arc::new(LogSink)),
        }
    }
}
