//! In-memory connector for tests.

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use tokio::io::{AsyncRead, AsyncWrite, DuplexStream, ReadBuf};

use crate::error::{Error, Result};
use crate::transport::Connector;

/// Link handed out by [`MockConnector`].
#[derive(Debug)]
pub enum MockLink {
    /// In-memory pipe to a test-held device end.
    Pipe(DuplexStream),
    /// Every write fails; reads never complete.
    BrokenWrite,
    /// Every read fails; writes are swallowed.
    BrokenRead,
}

impl AsyncRead for MockLink {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Pipe(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::BrokenWrite => Poll::Pending,
            Self::BrokenRead => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::ConnectionReset,
                "device reset",
            ))),
        }
    }
}

impl AsyncWrite for MockLink {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Pipe(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::BrokenWrite => Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "device unplugged",
            ))),
            Self::BrokenRead => Poll::Ready(Ok(buf.len())),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Pipe(stream) => Pin::new(stream).poll_flush(cx),
            _ => Poll::Ready(Ok(())),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Pipe(stream) => Pin::new(stream).poll_shutdown(cx),
            _ => Poll::Ready(Ok(())),
        }
    }
}

#[derive(Default)]
struct Inner {
    outcomes: Mutex<VecDeque<Option<MockLink>>>,
    attempts: AtomicUsize,
}

/// Connector handing out scripted open results. An empty script fails.
#[derive(Clone, Default)]
pub struct MockConnector {
    inner: Arc<Inner>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, outcome: Option<MockLink>) {
        self.inner.outcomes.lock().unwrap().push_back(outcome);
    }

    /// Queues a failed open.
    pub fn fail(&self) {
        self.push(None);
    }

    /// Queues a successful open, returning the device end of the link.
    pub fn succeed(&self) -> DuplexStream {
        let (device, link) = tokio::io::duplex(256);
        self.push(Some(MockLink::Pipe(link)));
        device
    }

    /// Queues a successful open of a link whose writes fail.
    pub fn succeed_broken_write(&self) {
        self.push(Some(MockLink::BrokenWrite));
    }

    /// Queues a successful open of a link whose reads fail.
    pub fn succeed_broken_read(&self) {
        self.push(Some(MockLink::BrokenRead));
    }

    /// Number of open attempts so far.
    pub fn attempts(&self) -> usize {
        self.inner.attempts.load(Ordering::SeqCst)
    }
}

impl Connector for MockConnector {
    type Link = MockLink;

    fn open(&self) -> BoxFuture<'_, Result<MockLink>> {
        self.inner.attempts.fetch_add(1, Ordering::SeqCst);
        let next = self.inner.outcomes.lock().unwrap().pop_front().flatten();
        Box::pin(async move {
            next.ok_or_else(|| Error::Io(io::Error::new(io::ErrorKind::NotFound, "no device")))
        })
    }
}
