//! `PairplayServer` builder and accept loop.
//!
//! This is the entry point for running a Pairplay server. It ties the
//! layers together: transport → lobby handler → matchmaker → session.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use pairplay_lobby::Matchmaker;
use pairplay_protocol::{GameKind, JsonCodec};
use pairplay_session::SessionConfig;
use pairplay_transport::{ConnectionId, TcpConnection, TcpLineTransport, Transport};
use tokio::sync::{mpsc, Mutex};

use crate::handler::handle_connection;
use crate::PairplayError;

/// Address used when none is given.
pub const DEFAULT_ADDR: &str = "127.0.0.1:8888";

/// How many messages a connection may send before it joins a game.
pub const DEFAULT_MAX_LOBBY_MESSAGES: usize = 16;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState {
    /// The only state shared between tasks. Every queue read or write
    /// happens under this lock.
    pub(crate) matchmaker: Mutex<Matchmaker<TcpConnection, JsonCodec>>,
    pub(crate) codec: JsonCodec,
    /// Connections whose peer went away; drained by the janitor.
    pub(crate) departures: mpsc::UnboundedSender<ConnectionId>,
    pub(crate) max_lobby_messages: usize,
}

/// Builder for configuring and starting a Pairplay server.
///
/// # Example
///
/// ```rust,no_run
/// use pairplay::prelude::*;
///
/// # async fn start() -> Result<(), PairplayError> {
/// let server = PairplayServer::builder()
///     .bind("0.0.0.0:8888")
///     .games([GameKind::Grid])
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct PairplayServerBuilder {
    bind_addr: String,
    games: Vec<GameKind>,
    session_config: SessionConfig,
    max_lobby_messages: usize,
}

impl PairplayServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: DEFAULT_ADDR.to_string(),
            games: GameKind::ALL.to_vec(),
            session_config: SessionConfig::default(),
            max_lobby_messages: DEFAULT_MAX_LOBBY_MESSAGES,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Restricts the games offered to clients.
    pub fn games(mut self, games: impl IntoIterator<Item = GameKind>) -> Self {
        self.games = games.into_iter().collect();
        self
    }

    /// Sets the configuration every session is started with.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.session_config = config;
        self
    }

    /// Sets how many messages a connection may send before joining.
    pub fn max_lobby_messages(mut self, max: usize) -> Self {
        self.max_lobby_messages = max;
        self
    }

    /// Binds the listener and builds the server.
    pub async fn build(self) -> Result<PairplayServer, PairplayError> {
        let transport = TcpLineTransport::bind(&self.bind_addr).await?;
        let (departures, departed) = mpsc::unbounded_channel();

        let state = Arc::new(ServerState {
            matchmaker: Mutex::new(Matchmaker::with_games(
                self.games,
                JsonCodec,
                self.session_config,
            )),
            codec: JsonCodec,
            departures,
            max_lobby_messages: self.max_lobby_messages,
        });

        Ok(PairplayServer {
            transport,
            state,
            departed,
        })
    }
}

impl Default for PairplayServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Pairplay server.
///
/// Call [`run()`](Self::run) or [`run_until()`](Self::run_until) to start
/// accepting connections.
pub struct PairplayServer {
    transport: TcpLineTransport,
    state: Arc<ServerState>,
    departed: mpsc::UnboundedReceiver<ConnectionId>,
}

impl PairplayServer {
    /// Creates a new builder.
    pub fn builder() -> PairplayServerBuilder {
        PairplayServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, PairplayError> {
        Ok(self.transport.local_addr()?)
    }

    /// Accepts connections until the process is terminated.
    pub async fn run(self) -> Result<(), PairplayError> {
        self.run_until(std::future::pending()).await
    }

    /// Accepts connections until `signal` resolves.
    ///
    /// Each connection gets its own lobby handler task. When `signal`
    /// fires the listener is closed and waiting players are dropped;
    /// sessions already running are left to finish on their own.
    pub async fn run_until(
        mut self,
        signal: impl Future<Output = ()>,
    ) -> Result<(), PairplayError> {
        tracing::info!("pairplay server running");
        let janitor = tokio::spawn(evict_departed(
            Arc::clone(&self.state),
            self.departed,
        ));
        tokio::pin!(signal);

        loop {
            tokio::select! {
                () = &mut signal => break,
                accepted = self.transport.accept() => match accepted {
                    Ok(conn) => {
                        let state = Arc::clone(&self.state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(conn, state).await {
                                tracing::debug!(
                                    error = %e,
                                    "connection ended with error"
                                );
                            }
                        });
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed");
                    }
                },
            }
        }

        tracing::info!("shutting down");
        self.transport.shutdown().await?;
        janitor.abort();
        self.state.matchmaker.lock().await.shutdown();
        Ok(())
    }
}

/// Removes waiting players whose connection has gone away.
async fn evict_departed(
    state: Arc<ServerState>,
    mut departed: mpsc::UnboundedReceiver<ConnectionId>,
) {
    while let Some(conn_id) = departed.recv().await {
        state.matchmaker.lock().await.evict(conn_id);
    }
}
