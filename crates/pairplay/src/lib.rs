//! # Pairplay
//!
//! A two-player game server. Clients connect over TCP, speak one JSON
//! object per line, get paired with the next client that asked for the
//! same game, and play it out in a session of their own.
//!
//! Two games ship with the server:
//!
//! - `grid`: tic-tac-toe, strict alternation, first player is `X`
//! - `choice`: rock/paper/scissors, best of three
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pairplay::prelude::*;
//!
//! # async fn start() -> Result<(), PairplayError> {
//! let server = PairplayServer::builder()
//!     .bind("127.0.0.1:8888")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::PairplayError;
pub use server::{
    PairplayServer, PairplayServerBuilder, DEFAULT_ADDR,
    DEFAULT_MAX_LOBBY_MESSAGES,
};

pub use pairplay_lobby as lobby;
pub use pairplay_protocol as protocol;
pub use pairplay_session as session;
pub use pairplay_transport as transport;

/// Everything needed to configure and run a server.
pub mod prelude {
    pub use crate::{
        PairplayError, PairplayServer, PairplayServerBuilder, DEFAULT_ADDR,
    };
    pub use pairplay_protocol::{
        ClientMessage, GameKind, ServerMessage, SessionId,
    };
    pub use pairplay_session::{SessionConfig, DEFAULT_MAX_ROUNDS};
}
