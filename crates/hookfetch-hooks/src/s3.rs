use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use hookfetch::http::Method;
use hookfetch::http::header::{HeaderName, HeaderValue};
use hookfetch::{BoxError, Hook, HookResult, Request, Url};
use percent_encoding::percent_decode_str;
use serde::Deserialize;
use tracing::debug;

use crate::error::{HookError, Result};

static X_AMZ_ACL: HeaderName = HeaderName::from_static("x-amz-acl");

/// S3 operations reachable through `s3:` URLs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum S3Operation {
    DeleteObject,
    GetObject,
    HeadObject,
    PutObject,
}

impl S3Operation {
    pub fn from_method(method: &Method) -> Option<Self> {
        match method.as_str().to_ascii_uppercase().as_str() {
            "DELETE" => Some(S3Operation::DeleteObject),
            "GET" => Some(S3Operation::GetObject),
            "HEAD" => Some(S3Operation::HeadObject),
            "PUT" => Some(S3Operation::PutObject),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            S3Operation::DeleteObject => "deleteObject",
            S3Operation::GetObject => "getObject",
            S3Operation::HeadObject => "headObject",
            S3Operation::PutObject => "putObject",
        }
    }
}

impl fmt::Display for S3Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

/// Produces presigned URLs, typically backed by an S3 SDK client.
#[async_trait]
pub trait UrlSigner: Send + Sync {
    async fn presign(&self, operation: S3Operation, bucket: &str, key: &str) -> std::result::Result<Url, BoxError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct S3HookOptions {
    /// Only URLs under this base are handled.
    ///
    /// Default: "s3://"
    pub base: String,

    /// `x-amz-acl` for requests with a body that do not set one.
    ///
    /// Default: "private"
    pub acl: String,
}

impl Default for S3HookOptions {
    fn default() -> Self {
        Self {
            base: "s3://".to_owned(),
            acl:  "private".to_owned(),
        }
    }
}

/// Rewrites `s3://bucket/key` requests to presigned HTTPS requests.
#[derive(Clone)]
pub struct S3Hook {
    signer:  Arc<dyn UrlSigner>,
    options: S3HookOptions,
}

impl S3Hook {
    pub fn new(signer: impl UrlSigner + 'static, options: S3HookOptions) -> Self {
        Self {
            signer: Arc::new(signer),
            options,
        }
    }

    fn handles(&self, url: &str) -> bool {
        let base = self.options.base.as_str();
        match url.strip_prefix(base) {
            Some(_) if base.ends_with('/') => true,
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

impl fmt::Debug for S3Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Hook").field("options", &self.options).finish()
    }
}

#[async_trait]
impl Hook for S3Hook {
    fn name(&self) -> &str { "s3" }

    async fn call(&self, request: &Request) -> hookfetch::Result<Option<HookResult>> {
        if !self.handles(request.url().as_str()) {
            return Ok(None);
        }
        Ok(Some(HookResult::replace(self.rewrite(request).await?)))
    }
}

impl S3Hook {
    async fn rewrite(&self, request: &Request) -> Result<Request> {
        let url = request.url();
        let bucket = url.host_str().unwrap_or_default();
        let path = percent_decode_str(url.path()).decode_utf8_lossy();
        let key = path.split('/').filter(|segment| !segment.is_empty()).collect::<Vec<_>>().join("/");

        let operation = S3Operation::from_method(request.method())
            .ok_or_else(|| HookError::UnsupportedVerb(request.method().as_str().to_uppercase()))?;
        debug!(%operation, bucket, key = key.as_str(), "presigning s3 request");

        let signed = self
            .signer
            .presign(operation, bucket, &key)
            .await
            .map_err(|source| HookError::Signer {
                operation: operation.as_str(),
                bucket: bucket.to_owned(),
                key: key.clone(),
                source,
            })?;

        let mut rewritten = request.with_url(signed);
        if rewritten.body_matters() && !rewritten.headers().contains_key(&X_AMZ_ACL) {
            rewritten = rewritten.with_header(X_AMZ_ACL.clone(), HeaderValue::from_str(&self.options.acl)?);
        }
        Ok(rewritten)
    }
}
