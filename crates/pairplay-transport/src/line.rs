//! Newline-framed connection over any async byte stream.
//!
//! The line reader is buffered inside the connection, so whatever the peer
//! sent ahead of the current frame stays available to the next `recv`
//! caller, even if a different task owns the connection by then.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt,
    BufReader, DuplexStream, ReadHalf, WriteHalf,
};
use tokio::sync::Mutex;

use crate::{Connection, ConnectionId, TransportError};

/// Longest line a peer may send before the connection is treated as broken.
///
/// Counted without the terminator, so `\n` and `\r\n` peers get the same
/// allowance.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// A [`Connection`] that frames an async byte stream into lines.
///
/// `R` and `W` are the read and write halves of the stream. The TCP
/// transport uses the owned halves of a `TcpStream`; tests use the halves
/// of an in-memory duplex pipe (see [`LineConnection::duplex`]).
pub struct LineConnection<R, W> {
    id: ConnectionId,
    reader: Mutex<BufReader<R>>,
    writer: Mutex<W>,
    closed: AtomicBool,
}

impl<R, W> LineConnection<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    /// Wraps a reader/writer pair.
    pub fn new(id: ConnectionId, reader: R, writer: W) -> Self {
        Self {
            id,
            reader: Mutex::new(BufReader::new(reader)),
            writer: Mutex::new(writer),
            closed: AtomicBool::new(false),
        }
    }

    /// Returns `true` once [`Connection::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// A [`LineConnection`] over one end of an in-memory pipe.
pub type DuplexConnection =
    LineConnection<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

impl DuplexConnection {
    /// Creates an in-memory connection.
    ///
    /// Returns the server-side connection and the raw client end of the
    /// pipe. Dropping the client end reads as end-of-stream on the server.
    pub fn duplex() -> (Self, DuplexStream) {
        let (server, client) = tokio::io::duplex(MAX_LINE_BYTES);
        let (reader, writer) = tokio::io::split(server);
        (Self::new(ConnectionId::next(), reader, writer), client)
    }
}

impl<R, W> fmt::Debug for LineConnection<R, W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineConnection")
            .field("id", &self.id)
            .field("closed", &self.closed.load(Ordering::Relaxed))
            .finish()
    }
}

impl<R, W> Connection for LineConnection<R, W>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        if self.is_closed() {
            return Err(TransportError::ConnectionClosed(format!(
                "{} already closed",
                self.id
            )));
        }
        // Held for the whole frame so concurrent senders can't interleave.
        let mut writer = self.writer.lock().await;
        writer
            .write_all(data)
            .await
            .map_err(TransportError::SendFailed)?;
        writer.flush().await.map_err(TransportError::SendFailed)
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut reader = self.reader.lock().await;
        loop {
            let mut line = Vec::new();
            // Room for a full line plus `\r\n`; anything longer is cut off
            // and fails the length check below.
            let n = (&mut *reader)
                .take(MAX_LINE_BYTES as u64 + 2)
                .read_until(b'\n', &mut line)
                .await
                .map_err(TransportError::ReceiveFailed)?;
            if n == 0 {
                return Ok(None);
            }

            if line.last() == Some(&b'\n') {
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
            }
            if line.len() > MAX_LINE_BYTES {
                return Err(TransportError::LineTooLong(MAX_LINE_BYTES));
            }
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Ok(Some(line));
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        tracing::debug!(id = %self.id, "closing connection");
        self.writer
            .lock()
            .await
            .shutdown()
            .await
            .map_err(TransportError::SendFailed)
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
