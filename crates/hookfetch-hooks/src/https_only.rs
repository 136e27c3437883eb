use async_trait::async_trait;
use hookfetch::{Hook, HookResult, Request};
use tracing::debug;

use crate::error::HookError;

/// Vetoes every request that is not HTTPS.
#[derive(Debug, Clone, Copy, Default)]
pub struct HttpsOnly;

#[async_trait]
impl Hook for HttpsOnly {
    fn name(&self) -> &str { "https_only" }

    async fn call(&self, request: &Request) -> hookfetch::Result<Option<HookResult>> {
        let scheme = request.url().scheme();
        debug!(method = %request.method(), url = %request.url(), "https_only");
        if scheme.eq_ignore_ascii_case("https") {
            Ok(None)
        } else {
            Err(HookError::BadProtocol(scheme.to_owned()).into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_https_passes() {
        let request = Request::get("https://example.com").unwrap();
        assert!(HttpsOnly.call(&request).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_other_schemes_are_named() {
        for (url, message) in [
            ("http://example.com", "bad protocol: http:"),
            ("ftp://example.com", "bad protocol: ftp:"),
            ("data:,x", "bad protocol: data:"),
        ] {
            let request = Request::get(url).unwrap();
            let err = HttpsOnly.call(&request).await.unwrap_err();
            assert_eq!(err.to_string(), message);
        }
    }
}
