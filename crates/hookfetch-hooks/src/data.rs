use async_trait::async_trait;
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use bytes::Bytes;
use hookfetch::http::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderValue};
use hookfetch::{Hook, HookResult, Request, Response};
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use tracing::debug;

use crate::error::{HookError, Result};

const DEFAULT_CONTENT_TYPE: &str = "text/plain; charset=US-ASCII";

static DATA_URI: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^data:([^;,]+)?(;base64)?,(.+)$").ok());

/// Padding is optional in the wild.
const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Answers `data:` URIs with their decoded content.
#[derive(Debug, Clone, Copy, Default)]
pub struct DataHook;

#[async_trait]
impl Hook for DataHook {
    fn name(&self) -> &str { "data" }

    async fn call(&self, request: &Request) -> hookfetch::Result<Option<HookResult>> {
        Ok(data_response(request.url().as_str())?.map(HookResult::respond))
    }
}

/// Decode `url` as `data:[<type>][;base64],<data>`.
///
/// `Ok(None)` when `url` is not a data URI this hook understands.
pub fn data_response(url: &str) -> Result<Option<Response>> {
    let Some(caps) = DATA_URI.as_ref().and_then(|re| re.captures(url)) else {
        return Ok(None);
    };

    let content_type = match caps.get(1).map(|m| m.as_str()) {
        None | Some("/") => DEFAULT_CONTENT_TYPE,
        Some(content_type) => content_type,
    };
    let data = caps.get(3).map_or("", |m| m.as_str());

    let body: Vec<u8> = if caps.get(2).is_some() {
        let text = percent_decode_str(data).decode_utf8_lossy();
        BASE64
            .decode(text.trim())
            .map_err(|e| HookError::InvalidDataUri(e.to_string()))?
    } else {
        percent_decode_str(data).collect()
    };
    debug!(content_type, len = body.len(), "decoded data: URI");

    let len = body.len();
    let response = Response::new(Bytes::from(body))
        .with_header(CONTENT_TYPE, HeaderValue::from_str(content_type)?)
        .with_header(CONTENT_LENGTH, HeaderValue::from(len));
    Ok(Some(response))
}
