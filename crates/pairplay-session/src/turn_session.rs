//! The grid game session: strict alternation, one board, one winner.

use pairplay_protocol::{
    ClientMessage, Codec, GameKind, GridResult, ServerMessage, StatusReport,
};
use pairplay_transport::Connection;
use tokio::time::Instant;

use crate::table::{Departure, Table, Wake};
use crate::{GridGame, GridState, Inbound, RuleFault, Seat, SessionConfig, SessionOutcome};

pub(crate) async fn run<C: Connection, K: Codec>(
    mut table: Table<C, K>,
    config: &SessionConfig,
) -> SessionOutcome {
    let mut game = GridGame::new();

    let forfeit = match play(&mut table, &mut game, config).await {
        Ok(()) => false,
        Err(Departure::One(seat)) => {
            game.forfeit(seat.mark());
            true
        }
        Err(Departure::Both) => {
            table.release().await;
            return SessionOutcome::Abandoned;
        }
    };

    let state = game.state();
    let board = *game.board();
    let reached = table
        .conclude(|seat| ServerMessage::GameOver {
            result: result_for(state, seat).into(),
            board: Some(board),
            scores: None,
            forfeit,
        })
        .await;

    match state {
        GridState::Won(mark) if forfeit => {
            if reached[Seat::of_mark(mark).index()] {
                SessionOutcome::Forfeited {
                    loser: Seat::of_mark(mark.other()),
                }
            } else {
                SessionOutcome::Abandoned
            }
        }
        GridState::Won(mark) => SessionOutcome::Finished {
            winner: Some(Seat::of_mark(mark)),
        },
        _ => SessionOutcome::Finished { winner: None },
    }
}

/// Drives the game until it is terminal or somebody leaves.
async fn play<C: Connection, K: Codec>(
    table: &mut Table<C, K>,
    game: &mut GridGame,
    config: &SessionConfig,
) -> Result<(), Departure> {
    for seat in Seat::BOTH {
        let start = ServerMessage::Start {
            session: table.id(),
            game: GameKind::Grid,
            player_index: seat.index(),
            mark: Some(seat.mark()),
            board: Some(*game.board()),
            round: None,
            max_rounds: None,
        };
        table.send(seat, &start).await?;
    }

    while let GridState::AwaitingMove(mark) = game.state() {
        let active = Seat::of_mark(mark);
        let board = *game.board();
        table.send(active, &ServerMessage::YourTurn { board }).await?;
        table.send(active.other(), &ServerMessage::Wait { board }).await?;

        let deadline = config.turn_timeout.map(|t| Instant::now() + t);
        loop {
            let (seat, inbound) = match table.next(deadline).await {
                Wake::Inbound(seat, inbound) => (seat, inbound),
                Wake::TimedOut => {
                    tracing::warn!(
                        session_id = %table.id(),
                        seat = %active,
                        "turn timed out"
                    );
                    return Err(Departure::One(active));
                }
            };

            let fault = match inbound {
                Inbound::Closed => {
                    table.mark_departed(seat);
                    return Err(Departure::One(seat));
                }
                Inbound::Malformed(e) => {
                    table.reject(seat, e.reason()).await?;
                    None
                }
                Inbound::Message(ClientMessage::Move { pos }) => {
                    match game.play(seat.mark(), pos) {
                        Ok(state) => {
                            tracing::debug!(
                                session_id = %table.id(),
                                %seat,
                                pos,
                                "move accepted"
                            );
                            if !state.is_terminal() {
                                let update = ServerMessage::Update {
                                    board: *game.board(),
                                    // `play` only accepts 0..9.
                                    pos: pos as usize,
                                    mark,
                                };
                                for seat in Seat::BOTH {
                                    table.send(seat, &update).await?;
                                }
                            }
                            break;
                        }
                        Err(fault) => Some(fault),
                    }
                }
                Inbound::Message(ClientMessage::Status) => {
                    table.send(seat, &status(game, seat)).await?;
                    continue;
                }
                Inbound::Message(_) => Some(RuleFault::UnexpectedMessage),
            };

            if let Some(fault) = fault {
                table.reject(seat, fault).await?;
            }
            if seat == active {
                table
                    .send(active, &ServerMessage::YourTurn { board })
                    .await?;
            }
        }
    }
    Ok(())
}

fn status(game: &GridGame, seat: Seat) -> ServerMessage {
    let (status, your_turn) = match game.state() {
        GridState::AwaitingMove(mark) => {
            (format!("{mark} to move"), mark == seat.mark())
        }
        GridState::Won(mark) => (format!("{mark} won"), false),
        GridState::Drawn => ("draw".to_owned(), false),
    };
    ServerMessage::Status(StatusReport {
        status,
        game: Some(GameKind::Grid),
        board: Some(*game.board()),
        your_turn: Some(your_turn),
        ..StatusReport::default()
    })
}

fn result_for(state: GridState, seat: Seat) -> GridResult {
    match state {
        GridState::Won(mark) if mark == seat.mark() => GridResult::Win,
        GridState::Won(_) => GridResult::Loss,
        _ => GridResult::Draw,
    }
}
