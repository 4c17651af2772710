//! Transport abstraction layer for Pairplay.
//!
//! Provides the [`Transport`] and [`Connection`] traits that abstract over
//! byte-stream sources, plus [`LineConnection`], which frames a stream into
//! newline-terminated lines.
//!
//! # Framing
//!
//! A frame is one line. The terminator may be `\n` or `\r\n` and is not
//! part of the frame. Lines made only of whitespace are skipped. A line
//! longer than [`MAX_LINE_BYTES`] (terminator excluded) fails with
//! [`TransportError::LineTooLong`], and the connection should be treated
//! as broken. An unterminated tail is delivered as a final frame before
//! end-of-stream.
//!
//! # How it fits in the stack
//!
//! ```text
//! Session / Lobby (above)  ← own a connection, read and write whole frames
//!     ↕
//! Transport (this crate)  ← sockets, framing, connection ids
//! ```
//!
//! Nothing here knows what a frame contains; decoding belongs to the
//! protocol crate.
//!
//! # Feature Flags
//!
//! - `tcp` (default): TCP listener via [`TcpLineTransport`]

#![allow(async_fn_in_trait)]

mod error;
mod line;
#[cfg(feature = "tcp")]
mod tcp;

pub use error::TransportError;
pub use line::{DuplexConnection, LineConnection, MAX_LINE_BYTES};
#[cfg(feature = "tcp")]
pub use tcp::{TcpConnection, TcpLineTransport};

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates the next process-wide unique id.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;

    /// Gracefully shuts down the transport, stopping new connections.
    async fn shutdown(&self) -> Result<(), Self::Error>;
}

/// A single connection that exchanges newline-delimited frames.
///
/// A connection is shared behind an `Arc`: one task reads while others
/// write. All methods take `&self`, and the returned futures are `Send`
/// so they can be polled from any worker of the multi-threaded runtime.
///
/// # Contract
///
/// - `send` writes exactly the bytes it is given (callers include the
///   terminator) and never interleaves with another `send`.
/// - `recv` yields one frame without its terminator, `Ok(None)` once the
///   peer has closed, or an error when the stream is broken.
/// - `close` shuts down the write side. The peer sees end-of-stream.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Writes one complete frame to the remote peer.
    ///
    /// Concurrent callers never interleave partial frames.
    fn send(
        &self,
        data: &[u8],
    ) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the peer has closed the stream.
    fn recv(
        &self,
    ) -> impl Future<Output = Result<Option<Vec<u8>>, Self::Error>> + Send;

    /// Closes the connection. Calling this more than once is a no-op.
    fn close(&self) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_new_and_into_inner() {
        let id = ConnectionId::new(42);
        assert_eq!(id.into_inner(), 42);
    }

    #[test]
    fn test_connection_id_display() {
        let id = ConnectionId::new(7);
        assert_eq!(id.to_string(), "conn-7");
    }

    #[test]
    fn test_connection_id_next_is_unique() {
        let a = ConnectionId::next();
        let b = ConnectionId::next();
        assert_ne!(a, b);
        assert!(b.into_inner() > a.into_inner());
    }

    #[test]
    fn test_connection_id_hash_works_as_map_key() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(ConnectionId::new(1), "alice");
        map.insert(ConnectionId::new(2), "bob");
        assert_eq!(map[&ConnectionId::new(1)], "alice");
    }
}
