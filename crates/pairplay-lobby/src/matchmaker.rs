//! Matchmaker: per-game waiting queues plus the arena of running sessions.

use std::collections::{BTreeMap, HashMap, VecDeque};

use pairplay_protocol::{Codec, GameKind, SessionId};
use pairplay_session::{spawn_session, Player, SessionConfig, SessionOutcome};
use pairplay_transport::{Connection, ConnectionId};
use tokio::task::JoinHandle;

use crate::LobbyError;

/// Result of [`Matchmaker::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    /// No partner yet.
    Waiting,
    /// The player was paired and this session now owns them.
    Paired(SessionId),
}

/// A snapshot of one session in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: SessionId,
    pub game: GameKind,
    pub finished: bool,
}

struct SessionEntry {
    game: GameKind,
    handle: JoinHandle<SessionOutcome>,
}

/// Pairs waiting players two at a time, oldest first, per game.
///
/// A player handed to [`enqueue`](Self::enqueue) is owned by the matchmaker
/// until it is either paired (ownership moves to the new session task) or
/// evicted (the player is dropped, which closes its connection).
pub struct Matchmaker<C: Connection, K: Codec> {
    /// One queue per enabled game. A game without a queue is not offered.
    queues: BTreeMap<GameKind, VecDeque<Player<C>>>,

    /// Sessions started so far. Finished ones are pruned whenever a new
    /// session starts or the running count is asked for.
    sessions: HashMap<SessionId, SessionEntry>,

    next_session: u64,
    codec: K,
    config: SessionConfig,
}

impl<C: Connection, K: Codec> Matchmaker<C, K> {
    /// A matchmaker offering every game.
    pub fn new(codec: K, config: SessionConfig) -> Self {
        Self::with_games(GameKind::ALL, codec, config)
    }

    /// A matchmaker offering only `games`.
    pub fn with_games(
        games: impl IntoIterator<Item = GameKind>,
        codec: K,
        config: SessionConfig,
    ) -> Self {
        Self {
            queues: games.into_iter().map(|g| (g, VecDeque::new())).collect(),
            sessions: HashMap::new(),
            next_session: 1,
            codec,
            config,
        }
    }

    /// The games this matchmaker offers, in a fixed order.
    pub fn list_game_types(&self) -> Vec<GameKind> {
        self.queues.keys().copied().collect()
    }

    /// Maps a client-supplied game name onto an offered game.
    pub fn resolve_game(&self, name: &str) -> Result<GameKind, LobbyError> {
        name.parse::<GameKind>()
            .ok()
            .filter(|kind| self.queues.contains_key(kind))
            .ok_or_else(|| LobbyError::UnknownGame(name.to_owned()))
    }

    /// Queues `player` for `game`, or pairs it with the player already
    /// waiting there.
    ///
    /// Pairing happens on arrival, so a queue never holds more than one
    /// player and the waiting one always takes the first seat. A waiting
    /// player whose peer has already hung up is discarded rather than
    /// paired, even if its departure hasn't been evicted yet.
    pub fn enqueue(
        &mut self,
        player: Player<C>,
        game: GameKind,
    ) -> Result<Enqueued, LobbyError> {
        let queue = self
            .queues
            .get_mut(&game)
            .ok_or_else(|| LobbyError::UnknownGame(game.to_string()))?;

        while let Some(partner) = queue.pop_front() {
            if partner.is_departed() {
                tracing::info!(conn_id = %partner.id(), %game, "dropped departed partner");
                continue;
            }
            return Ok(Enqueued::Paired(self.start(game, [partner, player])));
        }
        tracing::debug!(conn_id = %player.id(), %game, "waiting for a partner");
        queue.push_back(player);
        Ok(Enqueued::Waiting)
    }

    fn start(&mut self, game: GameKind, players: [Player<C>; 2]) -> SessionId {
        let id = SessionId(self.next_session);
        self.next_session += 1;
        self.prune();
        let handle = spawn_session(
            id,
            game,
            players,
            self.codec.clone(),
            self.config.clone(),
        );
        self.sessions.insert(id, SessionEntry { game, handle });
        id
    }

    /// Drops a waiting player whose connection has gone away.
    ///
    /// Returns `false` if the connection isn't waiting anywhere (it was
    /// already paired or already evicted).
    pub fn evict(&mut self, conn_id: ConnectionId) -> bool {
        for (game, queue) in &mut self.queues {
            if let Some(pos) = queue.iter().position(|p| p.id() == conn_id) {
                queue.remove(pos);
                tracing::info!(%conn_id, %game, "evicted from queue");
                return true;
            }
        }
        false
    }

    /// Number of players waiting for `game`.
    pub fn waiting(&self, game: GameKind) -> usize {
        self.queues.get(&game).map_or(0, VecDeque::len)
    }

    /// Waiting players per offered game, including empty queues.
    pub fn waiting_counts(&self) -> BTreeMap<GameKind, usize> {
        self.queues
            .iter()
            .map(|(game, queue)| (*game, queue.len()))
            .collect()
    }

    /// Number of sessions still running. Forgets finished ones.
    pub fn active_sessions(&mut self) -> usize {
        self.prune();
        self.sessions.len()
    }

    fn prune(&mut self) {
        self.sessions.retain(|_, entry| !entry.handle.is_finished());
    }

    pub fn session(&self, id: SessionId) -> Result<SessionInfo, LobbyError> {
        let entry = self
            .sessions
            .get(&id)
            .ok_or(LobbyError::SessionNotFound(id))?;
        Ok(SessionInfo {
            id,
            game: entry.game,
            finished: entry.handle.is_finished(),
        })
    }

    /// Drops every waiting player, closing their connections.
    ///
    /// Running sessions are left alone; they end when their players do.
    pub fn shutdown(&mut self) {
        let dropped: usize = self.queues.values().map(VecDeque::len).sum();
        for queue in self.queues.values_mut() {
            queue.clear();
        }
        tracing::info!(
            dropped,
            running = self.active_sessions(),
            "matchmaker shut down"
        );
    }
}
