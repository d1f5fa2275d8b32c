//! Absolute I/O deadline for an async stream.
//!
//! Asterisk gives a `FastAGI` server no keep-alive signal, so a peer that stops
//! talking would pin a connection task forever. [`Deadline`] puts one
//! deadline on the whole connection, the way a socket deadline works: every
//! read, write and flush made after it passes fails with
//! [`io::ErrorKind::TimedOut`], and a pending operation is woken and failed
//! when it passes. Shutdown is not subject to the deadline.

use std::fmt::{Debug, Formatter};
use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::{sleep_until, Instant, Sleep};

/// Stream wrapper failing all I/O once a deadline has passed.
pub struct Deadline<S> {
    inner: S,
    timer: Pin<Box<Sleep>>,
    expired: bool,
}

impl<S> Deadline<S> {
    /// Wrap `inner` with an absolute `deadline`.
    ///
    /// Must be called from within a Tokio runtime with the time driver
    /// enabled.
    #[must_use]
    pub fn new(inner: S, deadline: Instant) -> Self {
        Self {
            inner,
            timer: Box::pin(sleep_until(deadline)),
            expired: false,
        }
    }

    /// Wrap `inner` with a deadline `timeout` from now.
    #[must_use]
    pub fn after(inner: S, timeout: Duration) -> Self {
        Self::new(inner, Instant::now() + timeout)
    }

    /// Current deadline.
    #[must_use]
    pub fn deadline(&self) -> Instant {
        self.timer.deadline()
    }

    /// Move the deadline. A stream that had already timed out becomes usable
    /// again if the new deadline is in the future.
    pub fn set_deadline(&mut self, deadline: Instant) {
        self.timer.as_mut().reset(deadline);
        self.expired = false;
    }

    /// Borrow the wrapped stream.
    #[must_use]
    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    /// Mutably borrow the wrapped stream, bypassing the deadline.
    #[must_use]
    pub fn get_mut(&mut self) -> &mut S {
        &mut self.inner
    }

    /// Remove the wrapper.
    #[must_use]
    pub fn into_inner(self) -> S {
        self.inner
    }

    /// Fail with `TimedOut` once the deadline has passed.
    ///
    /// Polling the timer also registers the task's waker, so a read or write
    /// pending on the inner stream is woken when the deadline passes.
    fn poll_expired(&mut self, cx: &mut Context<'_>) -> io::Result<()> {
        if !self.expired && self.timer.as_mut().poll(cx).is_ready() {
            self.expired = true;
        }
        if self.expired {
            Err(io::Error::new(
                io::ErrorKind::TimedOut,
                "connection deadline exceeded",
            ))
        } else {
            Ok(())
        }
    }
}

impl<S: Debug> Debug for Deadline<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deadline")
            .field("inner", &self.inner)
            .field("deadline", &self.timer.deadline())
            .field("expired", &self.expired)
            .finish()
    }
}

impl<S> AsyncRead for Deadline<S>
where
    S: AsyncRead + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if let Err(err) = this.poll_expired(cx) {
            return Poll::Ready(Err(err));
        }
        Pin::new(&mut this.inner).poll_read(cx, buf)
    }
}

impl<S> AsyncWrite for Deadline<S>
where
    S: AsyncWrite + Unpin,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        if let Err(err) = this.poll_expired(cx) {
            return Poll::Ready(Err(err));
        }
        Pin::new(&mut this.inner).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if let Err(err) = this.poll_expired(cx) {
            return Poll::Ready(Err(err));
        }
        Pin::new(&mut this.inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
