// Transport wrapper module
// Stamps the isolation headers onto responses hyper writes by itself
//
// hyper answers requests it cannot parse (400, 414, 431) before any handler
// runs. Those heads are rewritten on their way to the socket; responses from
// the handler stack already carry both headers and pass through untouched.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use hyper::rt::{Read, ReadBufCursor, Write};

use crate::handler::isolation::{
    CROSS_ORIGIN_EMBEDDER_POLICY, CROSS_ORIGIN_OPENER_POLICY, REQUIRE_CORP, SAME_ORIGIN,
};

const HEAD_END: &[u8] = b"\r\n\r\n";

/// Wraps a connection's transport, adding the isolation headers to any
/// response head that lacks them.
///
/// The wrapper is not vectored, so hyper flattens each message into one
/// buffer and every fresh write starts at a response head.
#[derive(Debug)]
pub struct IsolatedIo<T> {
    inner: T,
    pending: Option<Pending>,
    // The last write was only partly accepted: the next buffer continues a message
    mid_message: bool,
}

/// A rewritten buffer still being written out
#[derive(Debug)]
struct Pending {
    data: Vec<u8>,
    written: usize,
    /// Length of the caller's buffer it replaces
    consumed: usize,
}

impl<T> IsolatedIo<T> {
    pub const fn new(inner: T) -> Self {
        Self {
            inner,
            pending: None,
            mid_message: false,
        }
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Insert the isolation headers after the status line of `buf`, if it starts
/// a response head that does not carry them yet
fn isolate_head(buf: &[u8]) -> Option<Vec<u8>> {
    if !buf.starts_with(b"HTTP/1.") {
        return None;
    }
    let head_len = find(buf, HEAD_END)? + HEAD_END.len();
    let head = buf[..head_len].to_ascii_lowercase();
    let marker = format!("\r\n{CROSS_ORIGIN_OPENER_POLICY}:");
    if find(&head, marker.as_bytes()).is_some() {
        return None;
    }

    let status_end = find(buf, b"\r\n")? + 2;
    let headers = format!(
        "{CROSS_ORIGIN_OPENER_POLICY}: {SAME_ORIGIN}\r\n{CROSS_ORIGIN_EMBEDDER_POLICY}: {REQUIRE_CORP}\r\n"
    );
    let mut out = Vec::with_capacity(buf.len() + headers.len());
    out.extend_from_slice(&buf[..status_end]);
    out.extend_from_slice(headers.as_bytes());
    out.extend_from_slice(&buf[status_end..]);
    Some(out)
}

impl<T: Read + Unpin> Read for IsolatedIo<T> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: ReadBufCursor<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_read(cx, buf)
    }
}

impl<T: Write + Unpin> Write for IsolatedIo<T> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();

        if this.pending.is_none() && !this.mid_message {
            if let Some(data) = isolate_head(buf) {
                this.pending = Some(Pending {
                    data,
                    written: 0,
                    consumed: buf.len(),
                });
            }
        }

        let Some(pending) = this.pending.as_mut() else {
            let result = Pin::new(&mut this.inner).poll_write(cx, buf);
            if let Poll::Ready(Ok(n)) = result {
                this.mid_message = n < buf.len();
            }
            return result;
        };

        // hyper retries with the same buffer until it is reported consumed
        while pending.written < pending.data.len() {
            match Pin::new(&mut this.inner).poll_write(cx, &pending.data[pending.written..]) {
                Poll::Ready(Ok(0)) => return Poll::Ready(Err(io::ErrorKind::WriteZero.into())),
                Poll::Ready(Ok(n)) => pending.written += n,
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => return Poll::Pending,
            }
        }

        let consumed = pending.consumed;
        this.pending = None;
        this.mid_message = false;
        Poll::Ready(Ok(consumed))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}
