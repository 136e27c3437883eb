use crate::data::{Body, DEFAULT_RESPONSE_TYPE, Response};

/// Fill in what a freshly constructed response may lack.
///
/// - a missing `type` becomes `"default"`
/// - a string or buffer body becomes a one-shot byte stream of the same
///   length; streams and empty bodies are left alone
///
/// Everything else is carried over as is. Normalizing twice is the same as
/// normalizing once.
pub fn normalize(response: Response) -> Response {
    let response = match response.kind() {
        Some(_) => response,
        None => response.with_kind(DEFAULT_RESPONSE_TYPE),
    };
    response.map_body(Body::into_readable)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{CONTENT_TYPE, HeaderValue};
    use http::StatusCode;

    #[test]
    fn test_missing_type_defaults() {
        let response = normalize(Response::new("x"));
        assert_eq!(response.kind(), Some("default"));
    }

    #[test]
    fn test_explicit_type_is_kept() {
        let response = normalize(Response::new("x").with_kind("basic"));
        assert_eq!(response.kind(), Some("basic"));
    }

    #[tokio::test]
    async fn test_string_body_becomes_stream() {
        let response = normalize(Response::new("hello"));
        assert!(response.body().is_stream());
        assert_eq!(response.body().size_hint(), Some(5));
        assert_eq!(response.text().await.unwrap(), "hello");
    }

    #[test]
    fn test_empty_body_passes_through() {
        let response = normalize(Response::with_status_only(StatusCode::NOT_FOUND));
        assert!(matches!(response.body(), Body::Empty));
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(response.status_text(), "Not Found");
    }

    #[tokio::test]
    async fn test_normalize_is_idempotent() {
        let raw = Response::new("twice")
            .with_status(StatusCode::CREATED)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"));
        let once = normalize(raw);
        let twice = normalize(once.clone());

        assert_eq!(once.status(), twice.status());
        assert_eq!(once.status_text(), twice.status_text());
        assert_eq!(once.headers(), twice.headers());
        assert_eq!(once.kind(), twice.kind());
        assert_eq!(once.body().size_hint(), twice.body().size_hint());
        assert!(twice.body().is_stream());
        assert_eq!(twice.text().await.unwrap(), "twice");
    }
}
