//! Per-connection lobby handler.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Attach the connection (starts its reader task)
//!   2. Answer `list` and `status`, and reject anything that isn't a
//!      valid `join`
//!   3. On a valid `join`, reply `queued` and hand the player to the
//!      matchmaker, which owns it from then on
//!
//! A connection that spends its whole lobby budget without joining is
//! told so and closed.

use std::sync::Arc;

use pairplay_lobby::Enqueued;
use pairplay_protocol::{ClientMessage, ServerMessage, StatusReport};
use pairplay_session::{Inbound, Player, RuleFault};
use pairplay_transport::{Connection, TcpConnection};

use crate::server::ServerState;
use crate::PairplayError;

/// Handles a single connection until it joins a game or leaves.
pub(crate) async fn handle_connection(
    conn: TcpConnection,
    state: Arc<ServerState>,
) -> Result<(), PairplayError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let mut player =
        Player::attach(conn, state.codec, Some(state.departures.clone()));

    for _ in 0..state.max_lobby_messages {
        let msg = match player.recv().await {
            Inbound::Message(msg) => msg,
            Inbound::Malformed(e) => {
                reject(&player, &state, e.reason()).await?;
                continue;
            }
            Inbound::Closed => {
                tracing::debug!(%conn_id, "left the lobby");
                return Ok(());
            }
        };

        match msg {
            ClientMessage::List => {
                let games = state.matchmaker.lock().await.list_game_types();
                player
                    .send(&state.codec, &ServerMessage::List { games })
                    .await?;
            }
            ClientMessage::Status => {
                let waiting = state.matchmaker.lock().await.waiting_counts();
                let report = StatusReport {
                    status: "in lobby".to_owned(),
                    waiting: Some(waiting),
                    ..StatusReport::default()
                };
                player
                    .send(&state.codec, &ServerMessage::Status(report))
                    .await?;
            }
            ClientMessage::Join { game } => {
                let resolved = state.matchmaker.lock().await.resolve_game(&game);
                let game = match resolved {
                    Ok(game) => game,
                    Err(e) => {
                        reject(&player, &state, e).await?;
                        continue;
                    }
                };

                // Queued must be on the wire before the player can be
                // paired, or `start` could overtake it.
                player
                    .send(&state.codec, &ServerMessage::Queued { game })
                    .await?;
                let enqueued = state.matchmaker.lock().await.enqueue(player, game)?;
                match enqueued {
                    Enqueued::Waiting => {
                        tracing::info!(%conn_id, %game, "waiting for a partner");
                    }
                    Enqueued::Paired(session_id) => {
                        tracing::info!(%conn_id, %game, %session_id, "paired");
                    }
                }
                return Ok(());
            }
            other => {
                tracing::debug!(%conn_id, kind = other.kind(), "not a lobby message");
                reject(&player, &state, RuleFault::UnexpectedMessage).await?;
            }
        }
    }

    tracing::info!(%conn_id, "lobby message budget exhausted");
    reject(&player, &state, "too many lobby messages").await?;
    player.release().await;
    Ok(())
}

async fn reject(
    player: &Player<TcpConnection>,
    state: &ServerState,
    reason: impl ToString,
) -> Result<(), PairplayError> {
    let msg = ServerMessage::Invalid {
        reason: reason.to_string(),
    };
    player.send(&state.codec, &msg).await?;
    Ok(())
}
