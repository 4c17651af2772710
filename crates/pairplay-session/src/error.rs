//! Error types for the session layer.

use pairplay_protocol::ProtocolError;
use pairplay_transport::ConnectionId;

/// Errors raised while talking to a player.
///
/// Inside a running session every one of these is treated as the player
/// leaving; they never escape the session task.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// An outbound message could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Writing to the player's connection failed.
    #[error("send to {conn} failed: {reason}")]
    SendFailed { conn: ConnectionId, reason: String },
}
