//! Request and response bodies as seen by the cache layer.
//!
//! The layer must stay transparent: the handler receives the same bytes the
//! client sent, and the client receives the same bytes the handler produced.
//! A body is only read into memory when its content feeds a cache key or a
//! stored response; everything else streams through untouched.
//!
//! ## Body States
//!
//! - **Complete**: the body was read in full and is replayed from memory
//! - **Failed**: reading stopped on an error, which is replayed once
//! - **Partial**: reading stopped at the size limit; the bytes read are
//!   replayed, then the rest streams from the upstream body
//! - **Passthrough**: the body was never inspected

use bytes::{Buf, Bytes, BytesMut};
use http_body::{Body as HttpBody, Frame, SizeHint};
use http_body_util::BodyExt;
use pin_project::pin_project;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

/// A body wrapper that represents different consumption states.
#[pin_project(project = BufferedBodyProj)]
pub enum BufferedBody<B>
where
    B: HttpBody,
{
    /// Body was fully read and buffered.
    ///
    /// The `Option` is used to yield the data once, then return `None` on subsequent polls.
    Complete(Option<Bytes>),

    /// Reading the body failed.
    ///
    /// Bytes read before the error are replayed first, then the error is
    /// yielded once and the stream ends.
    Failed {
        /// Bytes read before the error.
        prefix: Option<Bytes>,
        /// The error, taken on first poll.
        error: Option<B::Error>,
    },

    /// Reading stopped at the size limit.
    ///
    /// The prefix is replayed first, then the rest of the body streams.
    Partial {
        /// Bytes read before the limit was hit.
        prefix: Option<Bytes>,
        /// The unread rest of the body.
        rest: Pin<Box<B>>,
    },

    /// Body was passed through without reading.
    Passthrough(#[pin] B),
}

/// Outcome of [`BufferedBody::buffer`].
pub enum Collected<B>
where
    B: HttpBody,
{
    /// All bytes were read.
    Complete(Bytes),
    /// Reading stopped on an error; the returned body replays what was read.
    Failed(BufferedBody<B>),
    /// The body is larger than the limit; the returned body replays what was
    /// read and streams the rest.
    Oversized(BufferedBody<B>),
}

impl<B> BufferedBody<B>
where
    B: HttpBody,
{
    /// Reads `body` to the end.
    ///
    /// Trailers are dropped; the cache only deals with payload bytes.
    pub async fn buffer(body: B) -> Collected<B> {
        Self::buffer_limited(body, None).await
    }

    /// Reads `body` to the end, stopping once more than `limit` bytes arrived.
    ///
    /// A body whose size hint already exceeds the limit is not read at all.
    pub async fn buffer_limited(body: B, limit: Option<usize>) -> Collected<B> {
        if let Some(limit) = limit
            && body.size_hint().lower() > limit as u64
        {
            return Collected::Oversized(BufferedBody::Passthrough(body));
        }
        let mut body = Box::pin(body);
        let mut buffer = BytesMut::new();
        loop {
            match body.frame().await {
                Some(Ok(frame)) => {
                    if let Ok(mut data) = frame.into_data() {
                        buffer.extend_from_slice(&data.copy_to_bytes(data.remaining()));
                    }
                    if limit.is_some_and(|limit| buffer.len() > limit) {
                        return Collected::Oversized(BufferedBody::Partial {
                            prefix: Some(buffer.freeze()),
                            rest: body,
                        });
                    }
                }
                Some(Err(error)) => {
                    let prefix = (!buffer.is_empty()).then(|| buffer.freeze());
                    return Collected::Failed(BufferedBody::Failed {
                        prefix,
                        error: Some(error),
                    });
                }
                None => return Collected::Complete(buffer.freeze()),
            }
        }
    }

    /// Returns the buffered bytes of a `Complete` body that has not been polled yet.
    pub fn bytes(&self) -> Option<&Bytes> {
        match self {
            BufferedBody::Complete(bytes) => bytes.as_ref(),
            _ => None,
        }
    }
}

impl<B> HttpBody for BufferedBody<B>
where
    B: HttpBody,
{
    type Data = Bytes;
    type Error = B::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        match self.project() {
            BufferedBodyProj::Complete(data) => match data.take() {
                Some(bytes) => Poll::Ready(Some(Ok(Frame::data(bytes)))),
                None => Poll::Ready(None),
            },

            BufferedBodyProj::Failed { prefix, error } => {
                if let Some(bytes) = prefix.take() {
                    return Poll::Ready(Some(Ok(Frame::data(bytes))));
                }
                match error.take() {
                    Some(error) => Poll::Ready(Some(Err(error))),
                    None => Poll::Ready(None),
                }
            }

            BufferedBodyProj::Partial { prefix, rest } => {
                if let Some(bytes) = prefix.take() {
                    return Poll::Ready(Some(Ok(Frame::data(bytes))));
                }
                match rest.as_mut().poll_frame(cx) {
                    Poll::Ready(Some(Ok(frame))) => {
                        let frame = frame.map_data(|mut data| data.copy_to_bytes(data.remaining()));
                        Poll::Ready(Some(Ok(frame)))
                    }
                    Poll::Ready(Some(Err(error))) => Poll::Ready(Some(Err(error))),
                    Poll::Ready(None) => Poll::Ready(None),
                    Poll::Pending => Poll::Pending,
                }
            }

            BufferedBodyProj::Passthrough(body) => match body.poll_frame(cx) {
                Poll::Ready(Some(Ok(frame))) => {
                    let frame = frame.map_data(|mut data| data.copy_to_bytes(data.remaining()));
                    Poll::Ready(Some(Ok(frame)))
                }
                Poll::Ready(Some(Err(error))) => Poll::Ready(Some(Err(error))),
                Poll::Ready(None) => Poll::Ready(None),
                Poll::Pending => Poll::Pending,
            },
        }
    }

    fn size_hint(&self) -> SizeHint {
        match self {
            BufferedBody::Complete(Some(bytes)) => SizeHint::with_exact(bytes.len() as u64),
            BufferedBody::Complete(None) => SizeHint::with_exact(0),
            BufferedBody::Failed { prefix, .. } => {
                SizeHint::with_exact(prefix.as_ref().map(|b| b.len() as u64).unwrap_or(0))
            }
            BufferedBody::Partial { prefix, rest } => {
                let prefix_len = prefix.as_ref().map(|b| b.len() as u64).unwrap_or(0);
                let hint = rest.size_hint();
                let lower = hint.lower().saturating_add(prefix_len);
                let mut result = SizeHint::new();
                result.set_lower(lower);
                if let Some(upper) = hint.upper() {
                    result.set_upper(upper.saturating_add(prefix_len).max(lower));
                }
                result
            }
            BufferedBody::Passthrough(body) => body.size_hint(),
        }
    }

    fn is_end_stream(&self) -> bool {
        match self {
            BufferedBody::Complete(data) => data.is_none(),
            BufferedBody::Failed { prefix, error } => prefix.is_none() && error.is_none(),
            BufferedBody::Partial { prefix, rest } => prefix.is_none() && rest.is_end_stream(),
            BufferedBody::Passthrough(body) => body.is_end_stream(),
        }
    }
}

impl<B> fmt::Debug for BufferedBody<B>
where
    B: HttpBody,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BufferedBody::Complete(Some(bytes)) => f
                .debug_tuple("Complete")
                .field(&format!("{} bytes", bytes.len()))
                .finish(),
            BufferedBody::Complete(None) => f.debug_tuple("Complete").field(&"consumed").finish(),
            BufferedBody::Failed { prefix, error } => f
                .debug_struct("Failed")
                .field("prefix_len", &prefix.as_ref().map(|b| b.len()).unwrap_or(0))
                .field("pending_error", &error.is_some())
                .finish(),
            BufferedBody::Partial { prefix, .. } => f
                .debug_struct("Partial")
                .field("prefix_len", &prefix.as_ref().map(|b| b.len()).unwrap_or(0))
                .finish(),
            BufferedBody::Passthrough(_) => f.debug_tuple("Passthrough").field(&"...").finish(),
        }
    }
}

impl<B> fmt::Debug for Collected<B>
where
    B: HttpBody,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collected::Complete(bytes) => f
                .debug_tuple("Complete")
                .field(&format!("{} bytes", bytes.len()))
                .finish(),
            Collected::Failed(body) => f.debug_tuple("Failed").field(body).finish(),
            Collected::Oversized(body) => f.debug_tuple("Oversized").field(body).finish(),
        }
    }
}
