use std::fmt;

use http::header::{CONTENT_LENGTH, HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;
use url::Url;

use super::body::Body;

/// `type` given to responses whose constructor did not set one.
pub const DEFAULT_RESPONSE_TYPE: &str = "default";

/// An incoming response, either from the upstream transport or built by a
/// hook.
///
/// A response straight out of a constructor may still be missing its `type`
/// and hold an in-memory body; [`normalize`](crate::normalize) fills it in
/// before anybody outside the hook sees it.
#[derive(Clone)]
pub struct Response {
    status:      StatusCode,
    status_text: Option<String>,
    headers:     HeaderMap,
    body:        Body,
    url:         Option<Url>,
    kind:        Option<String>,
}

impl Response {
    /// A `200 OK` with `body`.
    pub fn new(body: impl Into<Body>) -> Self {
        Self {
            status:      StatusCode::OK,
            status_text: None,
            headers:     HeaderMap::new(),
            body:        body.into(),
            url:         None,
            kind:        None,
        }
    }

    /// An empty response with `status`.
    pub fn with_status_only(status: StatusCode) -> Self { Self::new(Body::Empty).with_status(status) }

    pub fn status(&self) -> StatusCode { self.status }

    /// The reason phrase: the one set explicitly, or the canonical one.
    pub fn status_text(&self) -> &str {
        self.status_text
            .as_deref()
            .or_else(|| self.status.canonical_reason())
            .unwrap_or("")
    }

    /// Whether the status is in the 2xx range.
    pub fn ok(&self) -> bool { self.status.is_success() }

    pub fn headers(&self) -> &HeaderMap { &self.headers }

    pub fn body(&self) -> &Body { &self.body }

    pub fn into_body(self) -> Body { self.body }

    pub fn url(&self) -> Option<&Url> { self.url.as_ref() }

    /// The response `type`, `None` until normalized unless set explicitly.
    pub fn kind(&self) -> Option<&str> { self.kind.as_deref() }

    /// `content-length` as a number, when present and well formed.
    pub fn content_length(&self) -> Option<u64> {
        self.headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.trim().parse().ok())
    }

    pub async fn text(self) -> std::io::Result<String> { self.body.text().await }

    pub async fn bytes(self) -> std::io::Result<bytes::Bytes> { self.body.bytes().await }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = Some(text.into());
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
        self.body = body.into();
        self
    }

    /// Swap the body for whatever `f` makes of it.
    pub fn map_body(mut self, f: impl FnOnce(Body) -> Body) -> Self {
        self.body = f(std::mem::take(&mut self.body));
        self
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .field("status_text", &self.status_text())
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("url", &self.url.as_ref().map(Url::as_str))
            .field("kind", &self.kind)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_text_defaults_to_canonical_reason() {
        assert_eq!(Response::with_status_only(StatusCode::NOT_FOUND).status_text(), "Not Found");
        assert_eq!(Response::with_status_only(StatusCode::FORBIDDEN).status_text(), "Forbidden");
        let custom = Response::new("").with_status_text("Fine");
        assert_eq!(custom.status_text(), "Fine");
    }

    #[test]
    fn test_ok_tracks_status() {
        assert!(Response::new("hi").ok());
        assert!(!Response::with_status_only(StatusCode::INTERNAL_SERVER_ERROR).ok());
    }

    #[test]
    fn test_content_length_parses_header() {
        let response = Response::new("hello").with_header(CONTENT_LENGTH, HeaderValue::from_static("5"));
        assert_eq!(response.content_length(), Some(5));
        assert_eq!(Response::new("hello").content_length(), None);
    }

    #[tokio::test]
    async fn test_text_reads_body() {
        let response = Response::new("goodbye");
        assert_eq!(response.kind(), None);
        assert_eq!(response.text().await.unwrap(), "goodbye");
    }
}
