//! Matchmaking for Pairplay.
//!
//! The [`Matchmaker`] keeps one FIFO queue per enabled game, pairs the two
//! oldest waiting players as soon as a second one arrives, and keeps an
//! arena of the sessions it has started.
//!
//! It is a plain struct with `&mut self` operations. Callers that share it
//! across tasks put it behind a single `tokio::sync::Mutex`, which makes
//! "push onto the queue, then check for a pair" one critical section.
//!
//! # Ownership
//!
//! ```text
//! handler ──enqueue──► queue ──pair──► session task
//!                        │
//!                        └─evict / departed──► dropped (socket closed)
//! ```
//!
//! A [`Player`](pairplay_session::Player) has exactly one owner at a time.
//! While it waits, its inbox keeps buffering what the client sends, up to
//! a bound; the session reads that backlog once it starts. A waiting
//! player whose peer has hung up is never paired: it is discarded either
//! when its departure is evicted or when the next arrival finds it.
//!
//! Finished sessions stay visible through
//! [`Matchmaker::session`] until the next session starts.

mod error;
mod matchmaker;

pub use error::LobbyError;
pub use matchmaker::{Enqueued, Matchmaker, SessionInfo};
