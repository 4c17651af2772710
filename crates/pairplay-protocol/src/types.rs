//! Core protocol types for Pairplay's wire format.
//!
//! Every message is a JSON object with a `type` tag. Each tag has one
//! closed schema: missing mandatory fields fail decoding instead of being
//! read as absent values.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a session (one paired match).
///
/// Serialized as a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Game types
// ---------------------------------------------------------------------------

/// The game types a client can queue for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    /// Alternating-move 3×3 grid game (tic-tac-toe).
    Grid,
    /// Simultaneous-choice best-of-N game (rock/paper/scissors).
    Choice,
}

impl GameKind {
    /// Every game type, in listing order.
    pub const ALL: [GameKind; 2] = [GameKind::Grid, GameKind::Choice];

    /// The canonical wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Grid => "grid",
            Self::Choice => "choice",
        }
    }
}

impl fmt::Display for GameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GameKind {
    type Err = ProtocolError;

    /// Accepts the canonical names plus the classic game names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grid" | "tictactoe" | "tic-tac-toe" => Ok(Self::Grid),
            "choice" | "rps" => Ok(Self::Choice),
            _ => Err(ProtocolError::UnknownGame(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Grid game: marks, cells, board
// ---------------------------------------------------------------------------

/// A player's symbol on the grid. The first player is always `X`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    /// The opposing mark.
    pub fn other(self) -> Self {
        match self {
            Self::X => Self::O,
            Self::O => Self::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::X => f.write_str("X"),
            Self::O => f.write_str("O"),
        }
    }
}

/// One square of the grid. Serialized as `" "`, `"X"` or `"O"`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum Cell {
    #[default]
    #[serde(rename = " ")]
    Empty,
    X,
    O,
}

impl From<Mark> for Cell {
    fn from(mark: Mark) -> Self {
        match mark {
            Mark::X => Self::X,
            Mark::O => Self::O,
        }
    }
}

/// The 3×3 grid in row-major order; index `row * 3 + col`.
pub type Board = [Cell; 9];

/// A board with no marks on it.
pub const EMPTY_BOARD: Board = [Cell::Empty; 9];

// ---------------------------------------------------------------------------
// Choice game
// ---------------------------------------------------------------------------

/// A simultaneous choice. Dominance is a 3-cycle:
/// rock beats scissors, paper beats rock, scissors beats paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Choice {
    Rock,
    Paper,
    Scissors,
}

impl Choice {
    /// Every choice, for exhaustive checks.
    pub const ALL: [Choice; 3] = [Choice::Rock, Choice::Paper, Choice::Scissors];

    /// Returns `true` if `self` wins against `other`.
    pub fn beats(self, other: Choice) -> bool {
        matches!(
            (self, other),
            (Self::Rock, Self::Scissors)
                | (Self::Paper, Self::Rock)
                | (Self::Scissors, Self::Paper)
        )
    }
}

impl fmt::Display for Choice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Rock => f.write_str("rock"),
            Self::Paper => f.write_str("paper"),
            Self::Scissors => f.write_str("scissors"),
        }
    }
}

impl FromStr for Choice {
    type Err = ProtocolError;

    /// Case-insensitive; accepts the full word or its initial.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "r" | "rock" => Ok(Self::Rock),
            "p" | "paper" => Ok(Self::Paper),
            "s" | "scissors" => Ok(Self::Scissors),
            _ => Err(ProtocolError::InvalidMessage(format!(
                "unrecognized choice token {s:?}"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Outcomes (always relative to the recipient)
// ---------------------------------------------------------------------------

/// Final result of a grid game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridResult {
    Win,
    Loss,
    Draw,
}

/// Final result of a choice match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchResult {
    Won,
    Lost,
    Tied,
}

/// The `result` field of `game_over`: a plain string whose vocabulary
/// depends on the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FinalResult {
    Grid(GridResult),
    Match(MatchResult),
}

impl From<GridResult> for FinalResult {
    fn from(result: GridResult) -> Self {
        Self::Grid(result)
    }
}

impl From<MatchResult> for FinalResult {
    fn from(result: MatchResult) -> Self {
        Self::Match(result)
    }
}

/// Outcome of a single choice round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoundOutcome {
    Won,
    Lost,
    Tie,
}

/// A snapshot of where one connection stands, sent on request.
///
/// The same shape answers a connection in the lobby, in a grid session and
/// in a choice session; fields that don't apply to the asker are left out
/// of the JSON.
///
/// ```text
/// lobby:   status, waiting
/// grid:    status, game, board, your_turn
/// choice:  status, game, round, scores, your_turn
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// One-line summary, e.g. `"X to move"` or `"round 2 of 3"`.
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<GameKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub board: Option<Board>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    /// Indexed by `player_index`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<[u32; 2]>,
    /// Whether the server is waiting on the asker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub your_turn: Option<bool>,
    /// Players currently queued, per offered game.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waiting: Option<BTreeMap<GameKind, usize>>,
}

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Everything a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask for the available game types.
    List,

    /// Enter the matchmaking queue for the named game type.
    Join { game: String },

    /// Grid game: claim cell `pos` (0–8). Signed so out-of-range values
    /// reach the rules and get a rule fault rather than a decode fault.
    Move { pos: i64 },

    /// Choice game: this round's choice token.
    Choice {
        #[serde(alias = "move")]
        choice: String,
    },

    /// Ask where this connection stands. Answered with a `status` reply
    /// and never changes any state.
    #[serde(alias = "get_status")]
    Status,
}

impl ClientMessage {
    /// The wire `type` tag, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::List => "list",
            Self::Join { .. } => "join",
            Self::Move { .. } => "move",
            Self::Choice { .. } => "choice",
            Self::Status => "status",
        }
    }
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Everything the server may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Reply to `list`.
    List { games: Vec<GameKind> },

    /// The join was accepted and the connection is waiting for a partner.
    Queued { game: GameKind },

    /// A session started. `player_index` 0 is the first player.
    Start {
        session: SessionId,
        game: GameKind,
        player_index: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        mark: Option<Mark>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        board: Option<Board>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        round: Option<u32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_rounds: Option<u32>,
    },

    /// Grid game: it's the recipient's move.
    YourTurn { board: Board },

    /// Grid game: the opponent is moving.
    Wait { board: Board },

    /// Grid game: a non-terminal move was accepted.
    Update { board: Board, pos: usize, mark: Mark },

    /// Choice game: the recipient's choice for `round` was recorded.
    ChoiceReceived { round: u32 },

    /// Choice game: the opponent has chosen for `round`.
    OpponentChose { round: u32 },

    /// Choice game: both choices are in and the round is resolved.
    /// `scores` is indexed by `player_index`; `next_round` is absent once
    /// the match is over.
    RoundResult {
        round: u32,
        your_choice: Choice,
        opponent_choice: Choice,
        outcome: RoundOutcome,
        scores: [u32; 2],
        #[serde(default, skip_serializing_if = "Option::is_none")]
        next_round: Option<u32>,
    },

    /// Reply to `status`.
    Status(StatusReport),

    /// The last message was rejected; state did not change.
    Invalid { reason: String },

    /// The session is over. Sent once per player, then the connection
    /// is closed.
    GameOver {
        result: FinalResult,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        board: Option<Board>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        scores: Option<[u32; 2]>,
        #[serde(default)]
        forfeit: bool,
    },
}
