use std::borrow::Cow;
use std::future::Future;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::lifecycle::{ListenerResult, Listeners};
use crate::data::{Request, Response};
use crate::error::{Error, LifecycleError, Result};

/// What a hook decided about the request it was shown.
#[derive(Debug)]
pub enum Outcome {
    /// Let the request through as is; only the listeners matter.
    Observe,
    /// Continue the chain with this request instead.
    Replace(Request),
    /// Stop the chain; this is the response.
    Respond(Response),
}

/// A hook's answer: an outcome plus the listeners it wants to run around the
/// final step of the dispatch.
#[derive(Debug)]
pub struct HookResult {
    outcome:   Outcome,
    listeners: Listeners,
}

impl HookResult {
    pub fn new(outcome: Outcome) -> Self {
        Self {
            outcome,
            listeners: Listeners::default(),
        }
    }

    pub fn respond(response: Response) -> Self { Self::new(Outcome::Respond(response)) }

    pub fn replace(request: Request) -> Self { Self::new(Outcome::Replace(request)) }

    /// Observe the dispatch through `listeners` without touching the request.
    pub fn observe(listeners: Listeners) -> Self { Self::new(Outcome::Observe).with_listeners(listeners) }

    pub fn with_listeners(mut self, listeners: Listeners) -> Self {
        self.listeners = listeners;
        self
    }

    pub fn on_prereq<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request, DateTime<Utc>) -> ListenerResult + Send + Sync + 'static,
    {
        self.listeners = self.listeners.prereq(f);
        self
    }

    pub fn on_postreq<F>(mut self, f: F) -> Self
    where
        F: Fn(&Request, Option<&Response>, Option<&Error>) -> ListenerResult + Send + Sync + 'static,
    {
        self.listeners = self.listeners.postreq(f);
        self
    }

    pub fn on_error<F>(mut self, f: F) -> Self
    where
        F: Fn(&LifecycleError) -> ListenerResult + Send + Sync + 'static,
    {
        self.listeners = self.listeners.error(f);
        self
    }

    pub fn outcome(&self) -> &Outcome { &self.outcome }

    pub fn listeners(&self) -> &Listeners { &self.listeners }

    pub fn into_parts(self) -> (Outcome, Listeners) { (self.outcome, self.listeners) }
}

/// One link of the chain.
///
/// Return `Ok(None)` for requests the hook has nothing to say about, and an
/// error to veto the request outright.
#[async_trait]
pub trait Hook: Send + Sync {
    /// Name used in logs and contract violations.
    fn name(&self) -> &str { std::any::type_name::<Self>() }

    async fn call(&self, request: &Request) -> Result<Option<HookResult>>;
}

/// A [`Hook`] made from an async closure. See [`hook_fn`].
pub struct FnHook<F> {
    name: Cow<'static, str>,
    f:    F,
}

impl<F> FnHook<F> {
    pub fn named(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.name = name.into();
        self
    }
}

/// Build a hook from a closure taking the request by value.
///
/// ```
/// use hookfetch::{HookResult, Response, hook_fn};
///
/// let teapot = hook_fn(|request| async move {
///     if request.url().path() == "/teapot" {
///         Ok(Some(HookResult::respond(Response::new("I'm a teapot"))))
///     } else {
///         Ok(None)
///     }
/// })
/// .named("teapot");
/// # let _ = teapot;
/// ```
pub fn hook_fn<F, Fut>(f: F) -> FnHook<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<HookResult>>> + Send + 'static,
{
    FnHook {
        name: Cow::Borrowed("hook_fn"),
        f,
    }
}

#[async_trait]
impl<F, Fut> Hook for FnHook<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Option<HookResult>>> + Send + 'static,
{
    fn name(&self) -> &str { &self.name }

    async fn call(&self, request: &Request) -> Result<Option<HookResult>> { (self.f)(request.clone()).await }
}
