//! The two seats of a running session and everything a session task does
//! with them.

use std::fmt;

use pairplay_protocol::{Codec, ServerMessage, SessionId};
use pairplay_transport::Connection;
use tokio::time::Instant;

use crate::{Inbound, Player, Seat};

/// What woke a session up.
pub(crate) enum Wake {
    Inbound(Seat, Inbound),
    /// The deadline passed before anybody said anything.
    TimedOut,
}

/// Why a session stopped early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Departure {
    /// This seat left (or stalled); the other seat wins by forfeit.
    One(Seat),
    /// Nobody is left to play.
    Both,
}

/// Both players of one session, plus which of them can still be reached.
pub(crate) struct Table<C: Connection, K: Codec> {
    id: SessionId,
    players: [Player<C>; 2],
    present: [bool; 2],
    codec: K,
}

impl<C: Connection, K: Codec> Table<C, K> {
    pub(crate) fn new(id: SessionId, players: [Player<C>; 2], codec: K) -> Self {
        Self {
            id,
            players,
            present: [true, true],
            codec,
        }
    }

    pub(crate) fn id(&self) -> SessionId {
        self.id
    }

    pub(crate) fn is_present(&self, seat: Seat) -> bool {
        self.present[seat.index()]
    }

    pub(crate) fn mark_departed(&mut self, seat: Seat) {
        if self.present[seat.index()] {
            tracing::info!(
                session_id = %self.id,
                %seat,
                conn_id = %self.players[seat.index()].id(),
                "player left"
            );
        }
        self.present[seat.index()] = false;
    }

    /// Waits for the next event from either seat, or for `deadline`.
    pub(crate) async fn next(&mut self, deadline: Option<Instant>) -> Wake {
        let [first, second] = &mut self.players;
        let inbound = async {
            tokio::select! {
                event = first.recv() => Wake::Inbound(Seat::First, event),
                event = second.recv() => Wake::Inbound(Seat::Second, event),
            }
        };
        match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, inbound)
                .await
                .unwrap_or(Wake::TimedOut),
            None => inbound.await,
        }
    }

    /// Sends to one seat. A failed send counts as that seat leaving.
    pub(crate) async fn send(
        &mut self,
        seat: Seat,
        msg: &ServerMessage,
    ) -> Result<(), Departure> {
        if !self.is_present(seat) {
            return Err(Departure::One(seat));
        }
        match self.players[seat.index()].send(&self.codec, msg).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::warn!(session_id = %self.id, %seat, error = %e, "send failed");
                self.mark_departed(seat);
                Err(Departure::One(seat))
            }
        }
    }

    /// Replies `invalid` to `seat` without touching game state.
    pub(crate) async fn reject(
        &mut self,
        seat: Seat,
        reason: impl fmt::Display,
    ) -> Result<(), Departure> {
        let reason = reason.to_string();
        tracing::debug!(session_id = %self.id, %seat, %reason, "rejected");
        self.send(seat, &ServerMessage::Invalid { reason }).await
    }

    /// Sends each reachable seat its own copy of a final message, then
    /// closes both connections.
    ///
    /// Returns which seats were reached.
    pub(crate) async fn conclude(
        mut self,
        message_for: impl Fn(Seat) -> ServerMessage,
    ) -> [bool; 2] {
        for seat in Seat::BOTH {
            if self.is_present(seat) {
                // A failure here already marks the seat absent.
                let _ = self.send(seat, &message_for(seat)).await;
            }
        }
        let reached = self.present;
        self.release().await;
        reached
    }

    /// Closes both connections without telling anybody anything.
    pub(crate) async fn release(self) {
        let [first, second] = self.players;
        first.release().await;
        second.release().await;
    }
}
