//! Choice game rules: simultaneous choices, best-of-N scoring.

use pairplay_protocol::Choice;

use crate::{RuleFault, Seat};

/// Choice match state.
///
/// ```text
/// AwaitingChoices(1) ─(both in)→ [round resolved] ─→ AwaitingChoices(2) ...
///                                       │
///                                       └──→ MatchOver(winner | tie)
/// ```
///
/// The resolved step is transient: it happens inside the submission that
/// fills the second slot and is reported as a [`RoundReport`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChoiceState {
    /// Collecting one choice per player for `round`.
    AwaitingChoices { round: u32 },
    /// Terminal. `winner` is `None` on a tie.
    MatchOver { winner: Option<Seat> },
}

impl ChoiceState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::MatchOver { .. })
    }
}

/// Everything that happened when a round resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundReport {
    /// The round that just resolved.
    pub round: u32,
    /// Choices indexed by seat.
    pub choices: [Choice; 2],
    /// Round winner; `None` on equal choices.
    pub winner: Option<Seat>,
    /// Scores after this round, indexed by seat.
    pub scores: [u32; 2],
    /// State after resolution: the next round or the end of the match.
    pub next: ChoiceState,
}

/// A best-of-`max_rounds` choice match.
#[derive(Debug, Clone)]
pub struct ChoiceMatch {
    max_rounds: u32,
    round: u32,
    scores: [u32; 2],
    pending: [Option<Choice>; 2],
    state: ChoiceState,
}

impl ChoiceMatch {
    /// A fresh match at round 1. `max_rounds` is at least 1.
    pub fn new(max_rounds: u32) -> Self {
        Self {
            max_rounds: max_rounds.max(1),
            round: 1,
            scores: [0, 0],
            pending: [None, None],
            state: ChoiceState::AwaitingChoices { round: 1 },
        }
    }

    pub fn max_rounds(&self) -> u32 {
        self.max_rounds
    }

    /// Round wins that end the match early.
    pub fn wins_needed(&self) -> u32 {
        self.max_rounds / 2 + 1
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn scores(&self) -> [u32; 2] {
        self.scores
    }

    pub fn state(&self) -> ChoiceState {
        self.state
    }

    /// Whether `seat` has already chosen this round.
    pub fn has_chosen(&self, seat: Seat) -> bool {
        self.pending[seat.index()].is_some()
    }

    /// Records `seat`'s choice for the current round.
    ///
    /// Returns `Some(report)` when this submission completes the round.
    ///
    /// # Errors
    /// - [`RuleFault::GameOver`] once the match is over
    /// - [`RuleFault::AlreadyChose`] if the seat's slot is already filled
    /// - [`RuleFault::InvalidChoice`] for an unrecognized token; the slot
    ///   stays empty
    pub fn submit(
        &mut self,
        seat: Seat,
        token: &str,
    ) -> Result<Option<RoundReport>, RuleFault> {
        if self.state.is_terminal() {
            return Err(RuleFault::GameOver);
        }
        if self.has_chosen(seat) {
            return Err(RuleFault::AlreadyChose);
        }
        let choice: Choice =
            token.parse().map_err(|_| RuleFault::InvalidChoice)?;
        self.pending[seat.index()] = Some(choice);

        match self.pending {
            [Some(first), Some(second)] => {
                Ok(Some(self.resolve([first, second])))
            }
            _ => Ok(None),
        }
    }

    /// Ends a running match in favour of `seat`'s opponent.
    ///
    /// Scores are left as they were. No-op once the match is over.
    pub fn forfeit(&mut self, seat: Seat) -> ChoiceState {
        if !self.state.is_terminal() {
            self.pending = [None, None];
            self.state = ChoiceState::MatchOver {
                winner: Some(seat.other()),
            };
        }
        self.state
    }

    fn resolve(&mut self, choices: [Choice; 2]) -> RoundReport {
        let [first, second] = choices;
        let winner = if first == second {
            None
        } else if first.beats(second) {
            Some(Seat::First)
        } else {
            Some(Seat::Second)
        };
        if let Some(seat) = winner {
            self.scores[seat.index()] += 1;
        }

        let resolved = self.round;
        self.pending = [None, None];
        self.round += 1;

        let needed = self.wins_needed();
        self.state = if self.round > self.max_rounds
            || self.scores.iter().any(|score| *score >= needed)
        {
            ChoiceState::MatchOver {
                winner: leader(self.scores),
            }
        } else {
            ChoiceState::AwaitingChoices { round: self.round }
        };

        RoundReport {
            round: resolved,
            choices,
            winner,
            scores: self.scores,
            next: self.state,
        }
    }
}

/// The seat with strictly more round wins.
fn leader(scores: [u32; 2]) -> Option<Seat> {
    match scores[0].cmp(&scores[1]) {
        std::cmp::Ordering::Greater => Some(Seat::First),
        std::cmp::Ordering::Less => Some(Seat::Second),
        std::cmp::Ordering::Equal => None,
    }
}
