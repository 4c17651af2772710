//! Grid game rules: a 3×3 board, alternating marks, eight winning lines.

use pairplay_protocol::{Board, Cell, Mark, EMPTY_BOARD};

use crate::RuleFault;

/// The eight fixed triples: three rows, three columns, two diagonals.
pub const LINES: [[usize; 3]; 8] = [
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    [0, 4, 8],
    [2, 4, 6],
];

/// Grid game state.
///
/// ```text
/// AwaitingMove(X) ⇄ AwaitingMove(O)
///        │                 │
///        └──→ Won(mark) | Drawn
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridState {
    /// Waiting for the given mark to move.
    AwaitingMove(Mark),
    /// Terminal: the given mark completed a line (or the opponent forfeited).
    Won(Mark),
    /// Terminal: the board filled with no line.
    Drawn,
}

impl GridState {
    /// Returns `true` for `Won` and `Drawn`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::AwaitingMove(_))
    }
}

/// One grid game. Cells go from empty to marked at most once.
#[derive(Debug, Clone)]
pub struct GridGame {
    board: Board,
    state: GridState,
}

impl GridGame {
    /// A fresh game with `X` to move.
    pub fn new() -> Self {
        Self {
            board: EMPTY_BOARD,
            state: GridState::AwaitingMove(Mark::X),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn state(&self) -> GridState {
        self.state
    }

    /// Places `mark` at `pos` and returns the resulting state.
    ///
    /// # Errors
    /// - [`RuleFault::GameOver`] once the game is terminal
    /// - [`RuleFault::NotYourTurn`] if `mark` isn't the one to move
    /// - [`RuleFault::BadPosition`] for `pos` outside 0–8
    /// - [`RuleFault::CellOccupied`] if the cell already holds a mark
    pub fn play(&mut self, mark: Mark, pos: i64) -> Result<GridState, RuleFault> {
        let GridState::AwaitingMove(active) = self.state else {
            return Err(RuleFault::GameOver);
        };
        if mark != active {
            return Err(RuleFault::NotYourTurn);
        }
        let idx = usize::try_from(pos)
            .ok()
            .filter(|idx| *idx < self.board.len())
            .ok_or(RuleFault::BadPosition)?;
        if self.board[idx] != Cell::Empty {
            return Err(RuleFault::CellOccupied);
        }

        self.board[idx] = mark.into();
        self.state = if winner(&self.board) == Some(mark) {
            GridState::Won(mark)
        } else if is_full(&self.board) {
            GridState::Drawn
        } else {
            GridState::AwaitingMove(mark.other())
        };
        Ok(self.state)
    }

    /// Ends a running game in favour of `mark`'s opponent.
    ///
    /// No-op if the game is already over.
    pub fn forfeit(&mut self, mark: Mark) -> GridState {
        if !self.state.is_terminal() {
            self.state = GridState::Won(mark.other());
        }
        self.state
    }
}

impl Default for GridGame {
    fn default() -> Self {
        Self::new()
    }
}

/// The mark holding any full line, if one exists.
pub fn winner(board: &Board) -> Option<Mark> {
    LINES.iter().find_map(|[a, b, c]| {
        match (board[*a], board[*b], board[*c]) {
            (Cell::X, Cell::X, Cell::X) => Some(Mark::X),
            (Cell::O, Cell::O, Cell::O) => Some(Mark::O),
            _ => None,
        }
    })
}

/// Returns `true` when no cell is empty.
pub fn is_full(board: &Board) -> bool {
    board.iter().all(|cell| *cell != Cell::Empty)
}
