use std::fmt;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt, stream};

/// A boxed stream type for request and response bodies.
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = T> + Send + 'a>>;

/// Stream of body chunks.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// A request or response body.
///
/// Cloning is cheap. A [`Body::Stream`] is a one-shot stream shared between
/// clones: whichever clone is consumed first gets the bytes, the others yield
/// an "already consumed" error.
#[derive(Clone, Default)]
pub enum Body {
    #[default]
    Empty,
    Bytes(Bytes),
    Text(String),
    Stream(SharedStream),
}

impl Body {
    /// Wrap a chunk stream of unknown length.
    pub fn from_stream<S>(stream: S) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Body::Stream(SharedStream::new(Box::pin(stream), None))
    }

    /// Wrap a chunk stream whose total length is known up front.
    pub fn from_sized_stream<S>(stream: S, len: u64) -> Self
    where
        S: Stream<Item = io::Result<Bytes>> + Send + 'static,
    {
        Body::Stream(SharedStream::new(Box::pin(stream), Some(len)))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Body::Empty => true,
            Body::Bytes(b) => b.is_empty(),
            Body::Text(s) => s.is_empty(),
            Body::Stream(s) => s.len == Some(0),
        }
    }

    pub fn is_stream(&self) -> bool { matches!(self, Body::Stream(_)) }

    /// Exact length of the body in bytes, when it can be known without
    /// reading it.
    pub fn size_hint(&self) -> Option<u64> {
        match self {
            Body::Empty => Some(0),
            Body::Bytes(b) => Some(b.len() as u64),
            Body::Text(s) => Some(s.len() as u64),
            Body::Stream(s) => s.len,
        }
    }

    /// Turn the body into a one-shot byte stream, keeping its length.
    ///
    /// Buffers and strings are pushed as a single chunk followed by
    /// end-of-stream. Empty bodies and streams are returned unchanged.
    pub fn into_readable(self) -> Self {
        match self {
            Body::Bytes(bytes) => {
                let len = bytes.len() as u64;
                Body::from_sized_stream(stream::iter([Ok::<_, io::Error>(bytes)]), len)
            }
            Body::Text(text) => {
                let bytes = Bytes::from(text);
                let len = bytes.len() as u64;
                Body::from_sized_stream(stream::iter([Ok::<_, io::Error>(bytes)]), len)
            }
            other => other,
        }
    }

    /// Take the body as a stream of chunks.
    pub fn into_stream(self) -> BodyStream {
        let inner: ByteStream = match self {
            Body::Empty => Box::pin(stream::empty::<io::Result<Bytes>>()),
            Body::Bytes(bytes) => Box::pin(stream::iter([Ok::<_, io::Error>(bytes)])),
            Body::Text(text) => Box::pin(stream::iter([Ok::<_, io::Error>(Bytes::from(text))])),
            Body::Stream(shared) => shared.take(),
        };
        BodyStream {
            inner: Mutex::new(inner),
        }
    }

    /// Read the whole body into memory.
    pub async fn bytes(self) -> io::Result<Bytes> {
        match self {
            Body::Empty => Ok(Bytes::new()),
            Body::Bytes(bytes) => Ok(bytes),
            Body::Text(text) => Ok(Bytes::from(text)),
            Body::Stream(shared) => {
                let mut stream = shared.take();
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk?);
                }
                Ok(buf.freeze())
            }
        }
    }

    /// Read the whole body as UTF-8 text.
    pub async fn text(self) -> io::Result<String> {
        let bytes = self.bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Body::Empty => f.write_str("Body::Empty"),
            Body::Bytes(b) => f.debug_tuple("Body::Bytes").field(&b.len()).finish(),
            Body::Text(s) => f.debug_tuple("Body::Text").field(&s.len()).finish(),
            Body::Stream(s) => f.debug_struct("Body::Stream").field("len", &s.len).finish(),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self { Body::Bytes(bytes) }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self { Body::Bytes(Bytes::from(bytes)) }
}

impl From<&'static [u8]> for Body {
    fn from(bytes: &'static [u8]) -> Self { Body::Bytes(Bytes::from_static(bytes)) }
}

impl From<String> for Body {
    fn from(text: String) -> Self { Body::Text(text) }
}

impl From<&str> for Body {
    fn from(text: &str) -> Self { Body::Text(text.to_owned()) }
}

/// One-shot stream shared between clones of a [`Body`].
#[derive(Clone)]
pub struct SharedStream {
    slot: Arc<Mutex<Option<ByteStream>>>,
    len:  Option<u64>,
}

impl SharedStream {
    fn new(stream: ByteStream, len: Option<u64>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(stream))),
            len,
        }
    }

    pub fn len(&self) -> Option<u64> { self.len }

    /// Whether some clone already took the stream.
    pub fn is_consumed(&self) -> bool {
        self.slot.lock().map(|slot| slot.is_none()).unwrap_or(true)
    }

    fn take(&self) -> ByteStream {
        let taken = match self.slot.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        taken.unwrap_or_else(|| {
            Box::pin(stream::once(async {
                Err::<Bytes, _>(io::Error::other("body stream already consumed"))
            }))
        })
    }
}

/// A body being read, usable wherever a `Send + Sync` stream is required.
pub struct BodyStream {
    inner: Mutex<ByteStream>,
}

impl Stream for BodyStream {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match self.get_mut().inner.get_mut() {
            Ok(stream) => stream.as_mut().poll_next(cx),
            Err(poisoned) => poisoned.into_inner().as_mut().poll_next(cx),
        }
    }
}
