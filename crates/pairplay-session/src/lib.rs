//! Game sessions for Pairplay.
//!
//! A session is one paired match between exactly two connections. Each
//! session runs as its own Tokio task that owns both connections for its
//! whole lifetime and drives one protocol state machine to a terminal
//! outcome.
//!
//! # Key types
//!
//! - [`GridGame`] / [`ChoiceMatch`]: pure rule state machines, no I/O
//! - [`Player`]: an attached connection with its decoded inbox
//! - [`spawn_session`]: runs the right state machine for a [`GameKind`]
//! - [`SessionConfig`]: match length and the optional turn timeout
//!
//! # Session lifecycle
//!
//! 1. Both players get `start` with their seat (`player_index` 0 or 1).
//! 2. The session waits on both inboxes at once. A rule violation earns
//!    the sender an `invalid` reply and changes nothing; `status` is
//!    answered in place.
//! 3. When the game reaches a terminal state, each player still connected
//!    gets one `game_over` and then the connection is closed.
//!
//! A player who disconnects (or, with a turn timeout, runs out of time)
//! forfeits. The outcome is returned from the task as a
//! [`SessionOutcome`].
//!
//! # How it fits in the stack
//!
//! ```text
//! Lobby (above)  ← pairs players, hands both to spawn_session
//!     ↕
//! Session (this crate)  ← rules, turn order, forfeits
//!     ↕
//! Protocol / Transport (below)  ← messages and framed connections
//! ```
//!
//! [`GameKind`]: pairplay_protocol::GameKind

mod choice;
mod choice_session;
mod config;
mod error;
mod fault;
mod grid;
mod player;
mod session;
mod table;
mod turn_session;

pub use choice::{ChoiceMatch, ChoiceState, RoundReport};
pub use config::{Seat, SessionConfig, DEFAULT_MAX_ROUNDS};
pub use error::SessionError;
pub use fault::RuleFault;
pub use grid::{is_full, winner, GridGame, GridState, LINES};
pub use player::{Inbound, Player, INBOX_CAPACITY};
pub use session::{spawn_session, SessionOutcome};
