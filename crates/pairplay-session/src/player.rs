//! A connection attached to the game server.
//!
//! Attaching a connection spawns its reader task: the only code that ever
//! reads from the socket. Every frame is decoded and pushed into the
//! player's inbox, so whoever owns the [`Player`] (the lobby handler, a
//! matchmaking queue, or a session) consumes decoded messages without
//! touching the socket. Inbox receives are cancel-safe, which lets a
//! session `select!` over both of its players.
//!
//! ```text
//!  socket ──► reader task ──► inbox (bounded) ──► owner
//!                  │
//!                  └─ on EOF: departed flag, departures channel, Closed
//! ```
//!
//! The inbox holds at most [`INBOX_CAPACITY`] events. A player nobody is
//! reading from (one waiting in a queue) fills it and then the reader
//! stops pulling from the socket, so the peer is pushed back by TCP flow
//! control instead of growing server memory.
//!
//! End-of-stream is visible in three ways: [`Player::is_departed`] flips
//! to `true` immediately, the connection id goes out on the optional
//! departures channel, and [`Inbound::Closed`] is queued behind whatever
//! the peer sent before leaving.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use pairplay_protocol::{ClientMessage, Codec, ProtocolError, ServerMessage};
use pairplay_transport::{Connection, ConnectionId};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::SessionError;

/// Decoded events buffered per player before the reader waits.
pub const INBOX_CAPACITY: usize = 32;

/// One decoded event from a player's connection.
#[derive(Debug)]
pub enum Inbound {
    /// A well-formed client message.
    Message(ClientMessage),
    /// A line that failed to decode. The connection stays open.
    Malformed(ProtocolError),
    /// End-of-stream or a read failure. Nothing follows.
    Closed,
}

/// An attached connection plus its decoded inbox.
///
/// Dropping a `Player` stops its reader task; once nothing else holds the
/// connection, the socket is closed.
pub struct Player<C: Connection> {
    conn: Arc<C>,
    inbox: mpsc::Receiver<Inbound>,
    departed: Arc<AtomicBool>,
    reader: JoinHandle<()>,
}

impl<C: Connection> Player<C> {
    /// Attaches `conn` and starts its reader task.
    ///
    /// When the peer goes away, the connection id is also reported on
    /// `departures` (if given) so the lobby can forget a waiting entry.
    pub fn attach<K: Codec>(
        conn: C,
        codec: K,
        departures: Option<mpsc::UnboundedSender<ConnectionId>>,
    ) -> Self {
        let conn = Arc::new(conn);
        let departed = Arc::new(AtomicBool::new(false));
        let (tx, inbox) = mpsc::channel(INBOX_CAPACITY);
        let reader = tokio::spawn(read_loop(
            Arc::clone(&conn),
            codec,
            tx,
            Arc::clone(&departed),
            departures,
        ));
        Self {
            conn,
            inbox,
            departed,
            reader,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.conn.id()
    }

    /// Whether the peer has closed the stream (or reading failed).
    ///
    /// Set by the reader task as soon as it sees end-of-stream, without
    /// waiting for the owner to drain the inbox.
    pub fn is_departed(&self) -> bool {
        self.departed.load(Ordering::Acquire)
    }

    /// Waits for the next inbound event.
    pub async fn recv(&mut self) -> Inbound {
        self.inbox.recv().await.unwrap_or(Inbound::Closed)
    }

    /// Encodes and sends one message.
    pub async fn send<K: Codec>(
        &self,
        codec: &K,
        msg: &ServerMessage,
    ) -> Result<(), SessionError> {
        let frame = codec.encode(msg)?;
        self.conn
            .send(&frame)
            .await
            .map_err(|e| SessionError::SendFailed {
                conn: self.id(),
                reason: e.to_string(),
            })
    }

    /// Closes the connection and stops the reader task.
    pub async fn release(self) {
        if let Err(e) = self.conn.close().await {
            tracing::debug!(conn_id = %self.id(), error = %e, "close failed");
        }
    }
}

impl<C: Connection> Drop for Player<C> {
    fn drop(&mut self) {
        self.reader.abort();
    }
}

async fn read_loop<C: Connection, K: Codec>(
    conn: Arc<C>,
    codec: K,
    tx: mpsc::Sender<Inbound>,
    departed: Arc<AtomicBool>,
    departures: Option<mpsc::UnboundedSender<ConnectionId>>,
) {
    let conn_id = conn.id();
    loop {
        let event = match conn.recv().await {
            Ok(Some(frame)) => match codec.decode::<ClientMessage>(&frame) {
                Ok(msg) => Inbound::Message(msg),
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "undecodable frame");
                    Inbound::Malformed(e)
                }
            },
            Ok(None) => {
                tracing::debug!(%conn_id, "peer closed the stream");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "read failed");
                break;
            }
        };
        // Waits while the inbox is full; the socket isn't read meanwhile.
        if tx.send(event).await.is_err() {
            // The player was dropped; nobody is listening.
            return;
        }
    }

    departed.store(true, Ordering::Release);
    if let Some(departures) = departures {
        let _ = departures.send(conn_id);
    }
    let _ = tx.send(Inbound::Closed).await;
}
