use std::fmt;
use std::time::Duration;

use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::Method;
use url::Url;

use super::body::Body;
use crate::error::{Error, Result};

/// How redirects should be treated by the upstream transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RedirectPolicy {
    /// Follow redirects up to [`TransportHints::max_redirects`].
    #[default]
    Follow,
    /// Fail on the first redirect.
    Error,
    /// Hand the redirect response back to the caller.
    Manual,
}

/// Transport settings carried by a request but never read by the dispatcher.
///
/// # Examples
///
/// ```
/// use hookfetch::TransportHints;
/// use std::time::Duration;
///
/// let hints = TransportHints::default()
///     .timeout(Duration::from_secs(5))
///     .compress(false);
/// assert_eq!(hints.max_redirects, 20);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportHints {
    /// Overall deadline for the transport call.
    ///
    /// Default: None
    pub timeout: Option<Duration>,

    /// Default: [`RedirectPolicy::Follow`]
    pub redirect: RedirectPolicy,

    /// Default: 20
    pub max_redirects: u32,

    /// Whether the transport may negotiate compressed responses.
    ///
    /// Default: true
    pub compress: bool,
}

impl Default for TransportHints {
    fn default() -> Self {
        Self {
            timeout:       None,
            redirect:      RedirectPolicy::Follow,
            max_redirects: 20,
            compress:      true,
        }
    }
}

impl TransportHints {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn redirect(mut self, redirect: RedirectPolicy) -> Self {
        self.redirect = redirect;
        self
    }

    pub fn max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }
}

/// Per-call overrides applied on top of the dispatch input.
#[derive(Debug, Clone, Default)]
pub struct RequestInit {
    pub method:  Option<Method>,
    pub headers: Option<HeaderMap>,
    pub body:    Option<Body>,
    pub hints:   Option<TransportHints>,
}

impl RequestInit {
    pub fn new() -> Self { Self::default() }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Append one header, creating the header map if needed.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.get_or_insert_with(HeaderMap::new).append(name, value);
        self
    }

    pub fn body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn hints(mut self, hints: TransportHints) -> Self {
        self.hints = Some(hints);
        self
    }
}

/// What a dispatch can be called with: a URL string that still needs fixing
/// up and parsing, or a ready request.
#[derive(Debug, Clone)]
pub enum RequestInput {
    Url(String),
    Request(Request),
}

impl From<&str> for RequestInput {
    fn from(url: &str) -> Self { RequestInput::Url(url.to_owned()) }
}

impl From<String> for RequestInput {
    fn from(url: String) -> Self { RequestInput::Url(url) }
}

impl From<&String> for RequestInput {
    fn from(url: &String) -> Self { RequestInput::Url(url.clone()) }
}

impl From<Url> for RequestInput {
    fn from(url: Url) -> Self { RequestInput::Request(Request::new(url)) }
}

impl From<Request> for RequestInput {
    fn from(request: Request) -> Self { RequestInput::Request(request) }
}

/// An outgoing request.
///
/// Requests are values: every `with_*` method returns a new request and
/// leaves the receiver alone, so a hook that wants a different request builds
/// one from a clone of the request it was given.
#[derive(Clone)]
pub struct Request {
    method:  Method,
    url:     Url,
    headers: HeaderMap,
    body:    Option<Body>,
    hints:   TransportHints,
}

impl Request {
    /// A bodiless GET for `url`.
    pub fn new(url: Url) -> Self {
        Self {
            method: Method::GET,
            url,
            headers: HeaderMap::new(),
            body: None,
            hints: TransportHints::default(),
        }
    }

    /// Parse `url` as an absolute URL and build a GET for it.
    pub fn get(url: &str) -> Result<Self> { Ok(Self::new(parse_url(url)?)) }

    /// Apply `init` on top of `self`.
    ///
    /// Fails when the resulting method cannot carry the body.
    pub fn with_init(mut self, init: RequestInit) -> Result<Self> {
        if let Some(method) = init.method {
            self.method = method;
        }
        if let Some(headers) = init.headers {
            self.headers = headers;
        }
        if let Some(body) = init.body {
            self.body = Some(body);
        }
        if let Some(hints) = init.hints {
            self.hints = hints;
        }
        if self.body.is_some() && !self.body_matters() {
            return Err(Error::InvalidRequest(format!(
                "{} request cannot have a body",
                self.method
            )));
        }
        Ok(self)
    }

    pub fn method(&self) -> &Method { &self.method }

    pub fn url(&self) -> &Url { &self.url }

    pub fn headers(&self) -> &HeaderMap { &self.headers }

    pub fn body(&self) -> Option<&Body> { self.body.as_ref() }

    pub fn hints(&self) -> &TransportHints { &self.hints }

    /// Whether the method can carry a body: anything but GET and HEAD.
    pub fn body_matters(&self) -> bool { self.method != Method::GET && self.method != Method::HEAD }

    /// The same request for a different URL.
    ///
    /// The body comes along only when [`body_matters`](Self::body_matters);
    /// a stream body is shared, not read.
    pub fn with_url(&self, url: Url) -> Self {
        Self {
            method: self.method.clone(),
            url,
            headers: self.headers.clone(),
            body: if self.body_matters() { self.body.clone() } else { None },
            hints: self.hints.clone(),
        }
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        if !self.body_matters() {
            self.body = None;
        }
        self
    }

    /// Replace every value of `name` with `value`.
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    pub fn with_body(mut self, body: impl Into<Body>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn with_hints(mut self, hints: TransportHints) -> Self {
        self.hints = hints;
        self
    }

    pub(crate) fn into_parts(self) -> (Method, Url, HeaderMap, Option<Body>, TransportHints) {
        (self.method, self.url, self.headers, self.body, self.hints)
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", &self.method)
            .field("url", &self.url.as_str())
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("hints", &self.hints)
            .finish()
    }
}

pub(crate) fn parse_url(url: &str) -> Result<Url> {
    Url::parse(url).map_err(|source| Error::InvalidUrl {
        url: url.to_owned(),
        source,
    })
}
