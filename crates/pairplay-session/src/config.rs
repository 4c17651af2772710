//! Session configuration and seating.

use std::fmt;
use std::time::Duration;

use pairplay_protocol::Mark;

/// Match length used when nothing else is configured.
pub const DEFAULT_MAX_ROUNDS: u32 = 3;

/// Settings shared by every session a matchmaker starts.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Round cap for the choice game. A player who reaches
    /// `max_rounds / 2 + 1` round wins ends the match early.
    pub max_rounds: u32,

    /// How long a session waits for the player(s) it is blocked on.
    ///
    /// `None` (the default) waits forever. When it expires, the stalled
    /// player is handled exactly as if they had disconnected.
    pub turn_timeout: Option<Duration>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            turn_timeout: None,
        }
    }
}

/// One of the two places at a session's table.
///
/// `First` is whoever was dequeued first; in the grid game they play `X`
/// and move first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Seat {
    First,
    Second,
}

impl Seat {
    /// Both seats, in order.
    pub const BOTH: [Seat; 2] = [Seat::First, Seat::Second];

    /// The wire `player_index`.
    pub fn index(self) -> usize {
        match self {
            Self::First => 0,
            Self::Second => 1,
        }
    }

    /// The opposing seat.
    pub fn other(self) -> Self {
        match self {
            Self::First => Self::Second,
            Self::Second => Self::First,
        }
    }

    /// The grid mark played from this seat.
    pub fn mark(self) -> Mark {
        match self {
            Self::First => Mark::X,
            Self::Second => Mark::O,
        }
    }

    /// The seat that plays `mark`.
    pub fn of_mark(mark: Mark) -> Self {
        match mark {
            Mark::X => Self::First,
            Mark::O => Self::Second,
        }
    }
}

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat-{}", self.index())
    }
}
