//! Error types for the lobby layer.

use pairplay_protocol::SessionId;

/// Errors that can occur during matchmaking.
#[derive(Debug, thiserror::Error)]
pub enum LobbyError {
    /// The game name isn't one this lobby plays.
    #[error("unknown game: {0}")]
    UnknownGame(String),

    /// No session with this id was ever started here.
    #[error("session {0} not found")]
    SessionNotFound(SessionId),
}
