//! Spawning sessions.

use pairplay_protocol::{Codec, GameKind, SessionId};
use pairplay_transport::Connection;
use tokio::task::JoinHandle;

use crate::table::Table;
use crate::{choice_session, turn_session, Player, Seat, SessionConfig};

/// How a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// Played to the end. `winner` is `None` on a draw or tie.
    Finished { winner: Option<Seat> },
    /// `loser` disconnected or stalled and the other seat was told it won.
    Forfeited { loser: Seat },
    /// Nobody could be told the result.
    Abandoned,
}

/// Starts a session for `kind` on its own task.
///
/// The task owns both players until it finishes, then closes both
/// connections. `players[0]` is [`Seat::First`].
pub fn spawn_session<C: Connection, K: Codec>(
    id: SessionId,
    kind: GameKind,
    players: [Player<C>; 2],
    codec: K,
    config: SessionConfig,
) -> JoinHandle<SessionOutcome> {
    tracing::info!(
        session_id = %id,
        game = %kind,
        first = %players[0].id(),
        second = %players[1].id(),
        "session started"
    );
    let table = Table::new(id, players, codec);

    tokio::spawn(async move {
        let outcome = match kind {
            GameKind::Grid => turn_session::run(table, &config).await,
            GameKind::Choice => choice_session::run(table, &config).await,
        };
        tracing::info!(session_id = %id, ?outcome, "session ended");
        outcome
    })
}
