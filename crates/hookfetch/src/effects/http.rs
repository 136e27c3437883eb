use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::data::{Request, Response};
use crate::error::Result;

/// The terminal step of a dispatch: turn a request into a response.
///
/// Implementations own redirects, timeouts and compression; the dispatcher
/// hands them [`TransportHints`](crate::TransportHints) untouched.
///
/// # Implementations
///
/// - [`ReqwestTransport`]: production transport using `reqwest`
/// - [`Dispatcher`](crate::Dispatcher): a whole hook chain
/// - [`transport_fn`] closures, mostly for tests
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: Request) -> Result<Response>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: Request) -> Result<Response> { (**self).send(request).await }
}

/// A [`Transport`] made from an async closure. See [`transport_fn`].
pub struct FnTransport<F> {
    f: F,
}

pub fn transport_fn<F, Fut>(f: F) -> FnTransport<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    FnTransport { f }
}

#[async_trait]
impl<F, Fut> Transport for FnTransport<F>
where
    F: Fn(Request) -> Fut + Send + Sync,
    Fut: Future<Output = Result<Response>> + Send + 'static,
{
    async fn send(&self, request: Request) -> Result<Response> { (self.f)(request).await }
}

#[cfg(feature = "reqwest")]
mod reqwest_impl {
    use super::*;
    use crate::data::{Body, RedirectPolicy};
    use crate::error::Error;
    use futures_util::TryStreamExt;
    use http::header::{ACCEPT_ENCODING, HeaderValue};
    use reqwest::redirect;
    use tracing::debug;

    const DEFAULT_MAX_REDIRECTS: usize = 20;

    /// Production transport using reqwest.
    ///
    /// Redirect limits belong to the client, so [`TransportHints::max_redirects`]
    /// is fixed when the transport is built; the per-request
    /// [`RedirectPolicy`] and timeout are honored on every call.
    ///
    /// [`TransportHints::max_redirects`]: crate::TransportHints::max_redirects
    pub struct ReqwestTransport {
        following: reqwest::Client,
        manual:    reqwest::Client,
    }

    impl ReqwestTransport {
        /// Create a transport following up to 20 redirects.
        pub fn new() -> Result<Self> { Self::with_max_redirects(DEFAULT_MAX_REDIRECTS) }

        pub fn with_max_redirects(max_redirects: usize) -> Result<Self> {
            let following = reqwest::Client::builder()
                .redirect(redirect::Policy::limited(max_redirects))
                .build()
                .map_err(Error::upstream)?;
            let manual = reqwest::Client::builder()
                .redirect(redirect::Policy::none())
                .build()
                .map_err(Error::upstream)?;
            Ok(Self { following, manual })
        }
    }

    #[async_trait]
    impl Transport for ReqwestTransport {
        async fn send(&self, request: Request) -> Result<Response> {
            let (method, url, mut headers, body, hints) = request.into_parts();
            if !hints.compress {
                headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
            }

            let client = match hints.redirect {
                RedirectPolicy::Follow => &self.following,
                RedirectPolicy::Error | RedirectPolicy::Manual => &self.manual,
            };
            debug!(method = %method, url = %url, "sending upstream request");

            let mut builder = client.request(method, url).headers(headers);
            if let Some(timeout) = hints.timeout {
                builder = builder.timeout(timeout);
            }
            if let Some(body) = body {
                builder = builder.body(into_reqwest_body(body));
            }

            let response = builder.send().await.map_err(Error::upstream)?;
            if hints.redirect == RedirectPolicy::Error && response.status().is_redirection() {
                return Err(Error::upstream(format!(
                    "redirect from {} refused: redirect mode is error",
                    response.url()
                )));
            }
            Ok(from_reqwest(response))
        }
    }

    fn into_reqwest_body(body: Body) -> reqwest::Body {
        match body {
            Body::Empty => reqwest::Body::from(Vec::new()),
            Body::Bytes(bytes) => reqwest::Body::from(bytes),
            Body::Text(text) => reqwest::Body::from(text),
            stream @ Body::Stream(_) => reqwest::Body::wrap_stream(stream.into_stream()),
        }
    }

    fn from_reqwest(response: reqwest::Response) -> Response {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let len = response.content_length();

        let stream = response.bytes_stream().map_err(std::io::Error::other);
        let body = match len {
            Some(len) => Body::from_sized_stream(stream, len),
            None => Body::from_stream(stream),
        };

        Response::new(body)
            .with_status(status)
            .with_headers(headers)
            .with_url(url)
    }
}

#[cfg(feature = "reqwest")]
pub use reqwest_impl::ReqwestTransport;
