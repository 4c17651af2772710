//! Wire protocol for Pairplay.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], [`Board`], etc.):
//!   one closed schema per message `type`.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): one JSON object per
//!   newline-terminated line.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding, and the short reason sent back to the client.
//!
//! The protocol layer knows nothing about sockets or sessions.
//!
//! ```text
//! Transport (lines) → Protocol (messages) → Session (game rules)
//! ```

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Board, Cell, Choice, ClientMessage, FinalResult, GameKind, GridResult,
    Mark, MatchResult, RoundOutcome, ServerMessage, SessionId, StatusReport,
    EMPTY_BOARD,
};
