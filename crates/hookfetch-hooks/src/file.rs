use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream;
use hookfetch::http::header::{CONTENT_LENGTH, CONTENT_TYPE, HeaderMap, HeaderValue, LAST_MODIFIED};
use hookfetch::http::{Method, StatusCode};
use hookfetch::{Body, Hook, HookResult, Request, Response, Url, WorkingDir};
use serde::Deserialize;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::error::{HookError, Result};

const CHUNK_SIZE: usize = 64 * 1024;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FileHookOptions {
    /// `file:` URI or filesystem path the hook is confined to.
    ///
    /// Default: the working directory at request time
    pub base_uri: Option<String>,
}

/// Serves `file:` URIs under a base directory.
///
/// URIs outside the base get no opinion, so a later hook or the upstream can
/// still deny them.
#[derive(Debug, Clone, Default)]
pub struct FileHook {
    options:     FileHookOptions,
    working_dir: WorkingDir,
}

impl FileHook {
    pub fn new(options: FileHookOptions) -> Self {
        Self {
            options,
            working_dir: WorkingDir::default(),
        }
    }

    pub fn with_base(base: impl Into<String>) -> Self {
        Self::new(FileHookOptions {
            base_uri: Some(base.into()),
        })
    }

    /// Directory relative bases and the default base resolve against.
    pub fn working_dir(mut self, working_dir: WorkingDir) -> Self {
        self.working_dir = working_dir;
        self
    }

    /// The base as an absolute `file:` URI without a trailing slash.
    fn base_uri(&self) -> Result<String> {
        let cwd = self.working_dir.resolve().unwrap_or_else(|| PathBuf::from("/"));
        let base = match &self.options.base_uri {
            Some(base) if is_file_uri(base) => return Ok(base.trim_end_matches('/').to_owned()),
            Some(base) => resolve_path(&cwd, Path::new(base)),
            None => resolve_path(&cwd, &cwd),
        };
        let url = Url::from_file_path(&base).map_err(|()| HookError::FileUri(base.display().to_string()))?;
        Ok(url.as_str().trim_end_matches('/').to_owned())
    }
}

#[async_trait]
impl Hook for FileHook {
    fn name(&self) -> &str { "file" }

    async fn call(&self, request: &Request) -> hookfetch::Result<Option<HookResult>> {
        let url = request.url();
        if url.scheme() != "file" {
            return Ok(None);
        }

        let base = self.base_uri()?;
        let href = url.as_str();
        debug!(method = %request.method(), url = href, base = %base, "file hook");

        if href == base {
            return Ok(Some(HookResult::respond(status_only(StatusCode::FORBIDDEN))));
        }
        if !href.strip_prefix(base.as_str()).is_some_and(|rest| rest.starts_with('/')) {
            debug!(url = href, base = %base, "not under base");
            return Ok(None);
        }

        reject_toxic_parts(url)?;
        let path = url
            .to_file_path()
            .map_err(|()| HookError::FileUri(href.to_owned()))?;
        Ok(Some(HookResult::respond(serve(request, &path).await?)))
    }
}

async fn serve(request: &Request, path: &Path) -> Result<Response> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(status_only(StatusCode::NOT_FOUND)),
        Err(err) => return Err(err.into()),
    };
    if !metadata.is_file() {
        return Ok(status_only(StatusCode::FORBIDDEN));
    }

    let content_type = mime_guess::from_path(path)
        .first()
        .map_or_else(|| "application/octet-stream".to_owned(), |mime| mime.to_string());
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_str(&format!("{content_type}; charset=UTF-8"))?);
    headers.insert(CONTENT_LENGTH, HeaderValue::from(metadata.len()));
    if let Ok(modified) = metadata.modified() {
        headers.insert(LAST_MODIFIED, HeaderValue::from_str(&httpdate::fmt_http_date(modified))?);
    }

    let body = if *request.method() == Method::HEAD {
        Body::from(Bytes::new())
    } else if *request.method() == Method::GET {
        let file = File::open(path).await?;
        Body::from_sized_stream(read_chunks(file), metadata.len())
    } else {
        return Err(HookError::FileMethod);
    };

    Ok(Response::new(body)
        .with_headers(headers)
        .with_url(request.url().clone()))
}

fn read_chunks(file: File) -> impl futures_util::Stream<Item = io::Result<Bytes>> + Send + 'static {
    stream::try_unfold(file, |mut file| async move {
        let mut buf = vec![0u8; CHUNK_SIZE];
        let n = file.read(&mut buf).await?;
        if n == 0 {
            return Ok::<_, io::Error>(None);
        }
        buf.truncate(n);
        Ok(Some((Bytes::from(buf), file)))
    })
}

fn reject_toxic_parts(url: &Url) -> Result<()> {
    let parts = [
        ("host", url.host_str().filter(|host| !host.is_empty()).map(str::to_owned)),
        ("port", url.port().map(|port| port.to_string())),
        ("hash", url.fragment().map(|fragment| format!("#{fragment}"))),
        ("query", url.query().map(str::to_owned)),
    ];
    match parts.into_iter().find_map(|(part, value)| value.map(|value| (part, value))) {
        Some((part, value)) => Err(HookError::FileUriPart { part, value }),
        None => Ok(()),
    }
}

fn status_only(status: StatusCode) -> Response { Response::with_status_only(status) }

fn is_file_uri(base: &str) -> bool { base.get(..5).is_some_and(|scheme| scheme.eq_ignore_ascii_case("file:")) }

/// Lexically resolve `path` against `cwd`, dropping `.` and `..`.
fn resolve_path(cwd: &Path, path: &Path) -> PathBuf {
    cwd.join(path)
        .components()
        .fold(PathBuf::new(), |mut resolved, component| {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    resolved.pop();
                }
                other => resolved.push(other),
            }
            resolved
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_base_resolves_against_working_dir() {
        let hook = FileHook::with_base("data/../public").working_dir(WorkingDir::Fixed("/srv".into()));
        assert_eq!(hook.base_uri().unwrap(), "file:///srv/public");
    }

    #[test]
    fn test_default_base_is_working_dir() {
        let hook = FileHook::default().working_dir(WorkingDir::Fixed("/srv/www".into()));
        assert_eq!(hook.base_uri().unwrap(), "file:///srv/www");
    }

    #[test]
    fn test_file_uri_base_is_kept() {
        let hook = FileHook::with_base("file:///var/data/");
        assert_eq!(hook.base_uri().unwrap(), "file:///var/data");
    }

    #[test]
    fn test_toxic_parts_are_named() {
        let url = Url::parse("file:///srv/a.txt?x=1").unwrap();
        let err = reject_toxic_parts(&url).unwrap_err();
        assert_eq!(err.to_string(), "Can't handle file: URIs with query: \"x=1\"");

        let url = Url::parse("file:///srv/a.txt#top").unwrap();
        assert!(matches!(reject_toxic_parts(&url), Err(HookError::FileUriPart { part: "hash", .. })));

        let url = Url::parse("file:///srv/a.txt").unwrap();
        assert!(reject_toxic_parts(&url).is_ok());
    }

    #[test]
    fn test_options_deserialize() {
        let options: FileHookOptions = serde_json::from_str(r#"{"base_uri": "/srv"}"#).unwrap();
        assert_eq!(options.base_uri.as_deref(), Some("/srv"));
        let options: FileHookOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options, FileHookOptions::default());
    }
}
