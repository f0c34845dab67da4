//! Streaming object download

use crate::s3::error::Result;
use crate::s3::request::ByteRange;
use crate::s3::transport::{collect_stream, ByteStream};
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Object body as a lazy sequence of chunks.
///
/// Finite and single-pass: chunks are pulled from the connection as the
/// caller polls, so large objects are never held in memory as a whole.
pub struct ObjectStream {
    inner: ByteStream,
    content_length: Option<u64>,
    range: Option<ByteRange>,
}

impl ObjectStream {
    pub(crate) fn new(inner: ByteStream, content_length: Option<u64>, range: Option<ByteRange>) -> Self {
        Self {
            inner,
            content_length,
            range,
        }
    }

    /// Body length announced by the service, if any
    pub fn content_length(&self) -> Option<u64> {
        self.content_length
    }

    /// Range this stream was requested with
    pub fn range(&self) -> Option<ByteRange> {
        self.range
    }

    /// Buffer the remaining body in memory
    pub async fn collect(self) -> Result<Bytes> {
        collect_stream(self.inner).await
    }

    /// Copy the remaining body into `writer`, returning the number of bytes written
    pub async fn write_to<W>(mut self, writer: &mut W) -> Result<u64>
    where
        W: AsyncWrite + Unpin,
    {
        let mut total_bytes = 0u64;
        while let Some(chunk) = self.inner.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            total_bytes += chunk.len() as u64;
        }
        writer.flush().await?;
        Ok(total_bytes)
    }
}

impl Stream for ObjectStream {
    type Item = Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for ObjectStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectStream")
            .field("content_length", &self.content_length)
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn chunks(parts: &[&'static [u8]]) -> ByteStream {
        let items: Vec<Result<Bytes>> = parts.iter().map(|p| Ok(Bytes::from_static(p))).collect();
        Box::pin(stream::iter(items))
    }

    #[tokio::test]
    async fn test_stream_yields_chunks_in_order() {
        let mut object = ObjectStream::new(chunks(&[b"hello ", b"world"]), Some(11), None);
        assert_eq!(object.next().await.unwrap().unwrap(), Bytes::from_static(b"hello "));
        assert_eq!(object.next().await.unwrap().unwrap(), Bytes::from_static(b"world"));
        assert!(object.next().await.is_none());
    }

    #[tokio::test]
    async fn test_collect() {
        let object = ObjectStream::new(chunks(&[b"ab", b"cd"]), None, None);
        assert_eq!(object.collect().await.unwrap(), Bytes::from_static(b"abcd"));
    }

    #[tokio::test]
    async fn test_write_to() {
        let range = ByteRange::new(4, 3).unwrap();
        let object = ObjectStream::new(chunks(&[b"abc"]), Some(3), Some(range));
        assert_eq!(object.range(), Some(range));
        assert_eq!(object.content_length(), Some(3));

        let mut out = Vec::new();
        let written = object.write_to(&mut out).await.unwrap();
        assert_eq!(written, 3);
        assert_eq!(out, b"abc");
    }
}
