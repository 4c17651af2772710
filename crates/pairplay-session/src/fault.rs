//! Game-rule faults: a message was understood but is not allowed now.

/// A rejected move or choice. The state machine does not advance.
///
/// The `Display` text is exactly the `reason` sent to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RuleFault {
    /// Grid position outside 0–8.
    #[error("bad position")]
    BadPosition,

    /// Grid position already holds a mark.
    #[error("cell occupied")]
    CellOccupied,

    /// The sender is not the player expected to move.
    #[error("not your turn")]
    NotYourTurn,

    /// A well-formed message of a type this session doesn't accept.
    #[error("unexpected message type")]
    UnexpectedMessage,

    /// A second choice in the same round.
    #[error("already chose this round")]
    AlreadyChose,

    /// A choice token outside the choice domain.
    #[error("invalid choice")]
    InvalidChoice,

    /// The game already reached a terminal state.
    #[error("game is over")]
    GameOver,
}
