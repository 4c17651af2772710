//! Unified error type for Pairplay.

use pairplay_lobby::LobbyError;
use pairplay_protocol::ProtocolError;
use pairplay_session::SessionError;
use pairplay_transport::TransportError;

/// Top-level error that wraps every layer's error.
///
/// The `#[from]` attributes let `?` convert layer errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum PairplayError {
    /// Binding, accepting, reading or writing a socket.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Encoding or decoding a message.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Talking to a player.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Matchmaking.
    #[error(transparent)]
    Lobby(#[from] LobbyError),

    /// Querying the listening socket.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
