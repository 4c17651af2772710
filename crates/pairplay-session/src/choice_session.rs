//! The choice game session: both players pick every round, best of N.

use pairplay_protocol::{
    ClientMessage, Codec, GameKind, MatchResult, RoundOutcome, ServerMessage,
    StatusReport,
};
use pairplay_transport::Connection;
use tokio::time::Instant;

use crate::table::{Departure, Table, Wake};
use crate::{
    ChoiceMatch, ChoiceState, Inbound, RoundReport, RuleFault, Seat,
    SessionConfig, SessionOutcome,
};

pub(crate) async fn run<C: Connection, K: Codec>(
    mut table: Table<C, K>,
    config: &SessionConfig,
) -> SessionOutcome {
    let mut game = ChoiceMatch::new(config.max_rounds);

    let forfeit = match play(&mut table, &mut game, config).await {
        Ok(()) => false,
        Err(Departure::One(seat)) => {
            game.forfeit(seat);
            true
        }
        Err(Departure::Both) => {
            tracing::warn!(session_id = %table.id(), "both players stalled");
            table.release().await;
            return SessionOutcome::Abandoned;
        }
    };

    let ChoiceState::MatchOver { winner } = game.state() else {
        table.release().await;
        return SessionOutcome::Abandoned;
    };
    let scores = game.scores();
    let reached = table
        .conclude(|seat| ServerMessage::GameOver {
            result: result_for(winner, seat).into(),
            board: None,
            scores: Some(scores),
            forfeit,
        })
        .await;

    match winner {
        Some(seat) if forfeit => {
            if reached[seat.index()] {
                SessionOutcome::Forfeited {
                    loser: seat.other(),
                }
            } else {
                SessionOutcome::Abandoned
            }
        }
        winner => SessionOutcome::Finished { winner },
    }
}

async fn play<C: Connection, K: Codec>(
    table: &mut Table<C, K>,
    game: &mut ChoiceMatch,
    config: &SessionConfig,
) -> Result<(), Departure> {
    for seat in Seat::BOTH {
        let start = ServerMessage::Start {
            session: table.id(),
            game: GameKind::Choice,
            player_index: seat.index(),
            mark: None,
            board: None,
            round: Some(game.round()),
            max_rounds: Some(game.max_rounds()),
        };
        table.send(seat, &start).await?;
    }

    let mut deadline = config.turn_timeout.map(|t| Instant::now() + t);
    while !game.state().is_terminal() {
        let (seat, inbound) = match table.next(deadline).await {
            Wake::Inbound(seat, inbound) => (seat, inbound),
            Wake::TimedOut => {
                let stalled = Seat::BOTH.map(|seat| !game.has_chosen(seat));
                tracing::warn!(
                    session_id = %table.id(),
                    round = game.round(),
                    ?stalled,
                    "round timed out"
                );
                return Err(match stalled {
                    [true, false] => Departure::One(Seat::First),
                    [false, true] => Departure::One(Seat::Second),
                    _ => Departure::Both,
                });
            }
        };

        let choice = match inbound {
            Inbound::Closed => {
                table.mark_departed(seat);
                return Err(Departure::One(seat));
            }
            Inbound::Malformed(e) => {
                table.reject(seat, e.reason()).await?;
                continue;
            }
            Inbound::Message(ClientMessage::Choice { choice }) => choice,
            Inbound::Message(ClientMessage::Status) => {
                table.send(seat, &status(game, seat)).await?;
                continue;
            }
            Inbound::Message(_) => {
                table.reject(seat, RuleFault::UnexpectedMessage).await?;
                continue;
            }
        };

        let round = game.round();
        match game.submit(seat, &choice) {
            Err(fault) => table.reject(seat, fault).await?,
            Ok(None) => {
                table
                    .send(seat, &ServerMessage::ChoiceReceived { round })
                    .await?;
                table
                    .send(seat.other(), &ServerMessage::OpponentChose { round })
                    .await?;
            }
            Ok(Some(report)) => {
                tracing::debug!(
                    session_id = %table.id(),
                    round,
                    winner = ?report.winner,
                    scores = ?report.scores,
                    "round resolved"
                );
                table
                    .send(seat, &ServerMessage::ChoiceReceived { round })
                    .await?;
                for seat in Seat::BOTH {
                    table.send(seat, &round_result(&report, seat)).await?;
                }
                deadline = config.turn_timeout.map(|t| Instant::now() + t);
            }
        }
    }
    Ok(())
}

fn round_result(report: &RoundReport, seat: Seat) -> ServerMessage {
    let outcome = match report.winner {
        None => RoundOutcome::Tie,
        Some(winner) if winner == seat => RoundOutcome::Won,
        Some(_) => RoundOutcome::Lost,
    };
    let next_round = match report.next {
        ChoiceState::AwaitingChoices { round } => Some(round),
        ChoiceState::MatchOver { .. } => None,
    };
    ServerMessage::RoundResult {
        round: report.round,
        your_choice: report.choices[seat.index()],
        opponent_choice: report.choices[seat.other().index()],
        outcome,
        scores: report.scores,
        next_round,
    }
}

fn status(game: &ChoiceMatch, seat: Seat) -> ServerMessage {
    let [first, second] = game.scores();
    let (status, your_turn) = match game.state() {
        ChoiceState::AwaitingChoices { round } => (
            format!(
                "round {round} of {}, score {first}-{second}",
                game.max_rounds()
            ),
            !game.has_chosen(seat),
        ),
        ChoiceState::MatchOver { .. } => {
            (format!("match over, score {first}-{second}"), false)
        }
    };
    ServerMessage::Status(StatusReport {
        status,
        game: Some(GameKind::Choice),
        round: Some(game.round()),
        scores: Some(game.scores()),
        your_turn: Some(your_turn),
        ..StatusReport::default()
    })
}

fn result_for(winner: Option<Seat>, seat: Seat) -> MatchResult {
    match winner {
        None => MatchResult::Tied,
        Some(winner) if winner == seat => MatchResult::Won,
        Some(_) => MatchResult::Lost,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pairplay_protocol::Choice;

    #[test]
    fn test_round_result_is_personalized() {
        let report = RoundReport {
            round: 2,
            choices: [Choice::Rock, Choice::Scissors],
            winner: Some(Seat::First),
            scores: [2, 0],
            next: ChoiceState::MatchOver {
                winner: Some(Seat::First),
            },
        };

        let ServerMessage::RoundResult {
            your_choice,
            opponent_choice,
            outcome,
            next_round,
            ..
        } = round_result(&report, Seat::Second)
        else {
            panic!("expected a round_result");
        };
        assert_eq!(your_choice, Choice::Scissors);
        assert_eq!(opponent_choice, Choice::Rock);
        assert_eq!(outcome, RoundOutcome::Lost);
        assert_eq!(next_round, None);
    }

    #[test]
    fn test_result_for_tie_and_win() {
        assert_eq!(result_for(None, Seat::First), MatchResult::Tied);
        assert_eq!(result_for(Some(Seat::Second), Seat::Second), MatchResult::Won);
        assert_eq!(result_for(Some(Seat::Second), Seat::First), MatchResult::Lost);
    }

    #[test]
    fn test_status_tracks_who_still_has_to_choose() {
        let mut game = ChoiceMatch::new(3);
        game.submit(Seat::First, "rock").unwrap();

        let ServerMessage::Status(report) = status(&game, Seat::First) else {
            panic!("expected a status reply");
        };
        assert_eq!(report.status, "round 1 of 3, score 0-0");
        assert_eq!(report.round, Some(1));
        assert_eq!(report.scores, Some([0, 0]));
        assert_eq!(report.your_turn, Some(false));
        assert_eq!(report.board, None);

        let ServerMessage::Status(report) = status(&game, Seat::Second) else {
            panic!("expected a status reply");
        };
        assert_eq!(report.your_turn, Some(true));
    }
}
