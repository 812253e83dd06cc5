//! Bridges between async request/response bodies and the blocking
//! [`FileStore`](crate::file::FileStore) API.
//!
//! Storage runs on tokio's blocking pool; chunks cross over bounded channels
//! so neither side buffers a whole file.

use std::io::{self, Read};

use axum::body::Bytes;
use futures::Stream;
use tokio::sync::mpsc;

/// Chunks in flight between the two sides of a bridge.
const CHANNEL_DEPTH: usize = 8;

/// Read size used when streaming a stored file out.
const READ_CHUNK_SIZE: usize = 64 * 1024;

/// Sending half of an upload bridge.
pub type ChunkSender = mpsc::Sender<io::Result<Bytes>>;

/// Blocking [`Read`] over chunks pushed from async code.
///
/// End of stream is signalled by dropping the sender; an `Err` chunk makes
/// the next `read` fail with it.
pub struct ChannelReader {
    rx: mpsc::Receiver<io::Result<Bytes>>,
    current: Bytes,
}

impl ChannelReader {
    /// Create a connected sender/reader pair.
    pub fn pair() -> (ChunkSender, Self) {
        let (tx, rx) = mpsc::channel(CHANNEL_DEPTH);
        (
            tx,
            Self {
                rx,
                current: Bytes::new(),
            },
        )
    }
}

impl Read for ChannelReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        while self.current.is_empty() {
            match self.rx.blocking_recv() {
                Some(Ok(chunk)) => self.current = chunk,
                Some(Err(e)) => return Err(e),
                None => return Ok(0),
            }
        }

        let n = buf.len().min(self.current.len());
        buf[..n].copy_from_slice(&self.current[..n]);
        self.current = self.current.slice(n..);
        Ok(n)
    }
}

/// Stream the content of a blocking reader as body chunks.
///
/// The reader is drained on the blocking pool. Reading stops as soon as the
/// stream is dropped, e.g. when the client disconnects.
pub fn reader_stream(
    mut reader: Box<dyn Read + Send>,
) -> impl Stream<Item = io::Result<Bytes>> + Send + 'static {
    let (tx, rx) = mpsc::channel::<io::Result<Bytes>>(CHANNEL_DEPTH);

    tokio::task::spawn_blocking(move || {
        let mut buf = vec![0u8; READ_CHUNK_SIZE];
        loop {
            let item = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => Ok(Bytes::copy_from_slice(&buf[..n])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::error!("Failed to read stored file: {}", e);
                    Err(e)
                }
            };
            let failed = item.is_err();
            if tx.blocking_send(item).is_err() || failed {
                break;
            }
        }
    });

    futures::stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io::Cursor;

    #[tokio::test]
    async fn test_channel_reader_reassembles_chunks() {
        let (tx, mut reader) = ChannelReader::pair();

        let handle = tokio::task::spawn_blocking(move || {
            let mut out = Vec::new();
            reader.read_to_end(&mut out).map(|_| out)
        });

        for chunk in [&b"hello "[..], &b""[..], &b"chunked "[..], &b"world"[..]] {
            tx.send(Ok(Bytes::from_static(chunk))).await.unwrap();
        }
        drop(tx);

        assert_eq!(handle.await.unwrap().unwrap(), b"hello chunked world");
    }

    #[tokio::test]
    async fn test_channel_reader_propagates_error() {
        let (tx, mut reader) = ChannelReader::pair();

        let handle = tokio::task::spawn_blocking(move || {
            let mut out = Vec::new();
            reader.read_to_end(&mut out)
        });

        tx.send(Ok(Bytes::from_static(b"partial"))).await.unwrap();
        tx.send(Err(io::Error::other("client went away")))
            .await
            .unwrap();
        drop(tx);

        let err = handle.await.unwrap().unwrap_err();
        assert_eq!(err.to_string(), "client went away");
    }

    #[tokio::test]
    async fn test_reader_stream_yields_all_bytes() {
        let content: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
        let stream = reader_stream(Box::new(Cursor::new(content.clone())));

        let chunks: Vec<io::Result<Bytes>> = stream.collect().await;
        assert!(chunks.len() > 1);

        let mut joined = Vec::new();
        for chunk in chunks {
            joined.extend_from_slice(&chunk.unwrap());
        }
        assert_eq!(joined, content);
    }
}
