//! End-to-end session tests over in-memory connections.

use std::time::Duration;

use pairplay_protocol::{GameKind, JsonCodec, SessionId};
use pairplay_session::{spawn_session, Player, Seat, SessionConfig, SessionOutcome};
use pairplay_transport::LineConnection;
use serde_json::{json, Value};
use tokio::io::{
    AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines, ReadHalf,
    WriteHalf,
};
use tokio::task::JoinHandle;

struct Client {
    lines: Lines<BufReader<ReadHalf<DuplexStream>>>,
    writer: WriteHalf<DuplexStream>,
}

impl Client {
    fn new(stream: DuplexStream) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
        }
    }

    async fn send_raw(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
    }

    async fn send(&mut self, msg: Value) {
        self.send_raw(&msg.to_string()).await;
    }

    async fn play(&mut self, pos: i64) {
        self.send(json!({"type": "move", "pos": pos})).await;
    }

    async fn choose(&mut self, token: &str) {
        self.send(json!({"type": "choice", "choice": token})).await;
    }

    /// Reads the next message and checks its type.
    async fn expect(&mut self, kind: &str) -> Value {
        let line = self
            .lines
            .next_line()
            .await
            .unwrap()
            .unwrap_or_else(|| panic!("stream ended while expecting {kind}"));
        let msg: Value = serde_json::from_str(&line).unwrap();
        assert_eq!(msg["type"], kind, "unexpected message: {msg}");
        msg
    }

    async fn expect_invalid(&mut self, reason: &str) {
        let msg = self.expect("invalid").await;
        assert_eq!(msg["reason"], reason);
    }

    async fn expect_eof(&mut self) {
        assert_eq!(self.lines.next_line().await.unwrap(), None);
    }
}

fn start(
    kind: GameKind,
    config: SessionConfig,
) -> (Client, Client, JoinHandle<SessionOutcome>) {
    let (first, first_end) = LineConnection::duplex();
    let (second, second_end) = LineConnection::duplex();
    let players = [
        Player::attach(first, JsonCodec, None),
        Player::attach(second, JsonCodec, None),
    ];
    let handle = spawn_session(SessionId(1), kind, players, JsonCodec, config);
    (Client::new(first_end), Client::new(second_end), handle)
}

async fn start_grid(config: SessionConfig) -> (Client, Client, JoinHandle<SessionOutcome>) {
    let (mut x, mut o, handle) = start(GameKind::Grid, config);

    let msg = x.expect("start").await;
    assert_eq!(msg["session"], 1);
    assert_eq!(msg["game"], "grid");
    assert_eq!(msg["player_index"], 0);
    assert_eq!(msg["mark"], "X");
    x.expect("your_turn").await;

    let msg = o.expect("start").await;
    assert_eq!(msg["player_index"], 1);
    assert_eq!(msg["mark"], "O");
    o.expect("wait").await;

    (x, o, handle)
}

/// `mover` places a non-terminal mark; both sides see the update and the
/// turn passes.
async fn accepted_move(mover: &mut Client, other: &mut Client, pos: i64) {
    mover.play(pos).await;
    let update = mover.expect("update").await;
    assert_eq!(update["pos"], pos);
    mover.expect("wait").await;
    assert_eq!(other.expect("update").await, update);
    other.expect("your_turn").await;
}

// -- grid game --

#[tokio::test]
async fn test_grid_top_row_win() {
    let (mut x, mut o, handle) = start_grid(SessionConfig::default()).await;

    accepted_move(&mut x, &mut o, 0).await;
    accepted_move(&mut o, &mut x, 3).await;
    accepted_move(&mut x, &mut o, 1).await;
    accepted_move(&mut o, &mut x, 4).await;
    x.play(2).await;

    // No update for the winning move, straight to game_over.
    let over = x.expect("game_over").await;
    assert_eq!(over["result"], "win");
    assert_eq!(over["forfeit"], false);
    assert_eq!(
        over["board"],
        json!(["X", "X", "X", "O", "O", " ", " ", " ", " "])
    );
    let over = o.expect("game_over").await;
    assert_eq!(over["result"], "loss");

    x.expect_eof().await;
    o.expect_eof().await;
    assert_eq!(
        handle.await.unwrap(),
        SessionOutcome::Finished {
            winner: Some(Seat::First)
        }
    );
}

#[tokio::test]
async fn test_grid_full_board_is_a_draw() {
    let (mut x, mut o, handle) = start_grid(SessionConfig::default()).await;

    for (x_pos, o_pos) in [(0, 1), (2, 4), (3, 5), (7, 6)] {
        accepted_move(&mut x, &mut o, x_pos).await;
        accepted_move(&mut o, &mut x, o_pos).await;
    }
    x.play(8).await;

    let over = x.expect("game_over").await;
    assert_eq!(over["result"], "draw");
    assert_eq!(
        over["board"],
        json!(["X", "O", "X", "X", "O", "O", "O", "X", "X"])
    );
    assert_eq!(o.expect("game_over").await["result"], "draw");
    assert_eq!(
        handle.await.unwrap(),
        SessionOutcome::Finished { winner: None }
    );
}

#[tokio::test]
async fn test_grid_rejections_leave_state_unchanged() {
    let (mut x, mut o, handle) = start_grid(SessionConfig::default()).await;

    x.play(9).await;
    x.expect_invalid("bad position").await;
    x.expect("your_turn").await;

    x.play(-1).await;
    x.expect_invalid("bad position").await;
    x.expect("your_turn").await;

    x.choose("rock").await;
    x.expect_invalid("unexpected message type").await;
    x.expect("your_turn").await;

    x.send_raw("{not json").await;
    x.expect_invalid("malformed json").await;
    x.expect("your_turn").await;

    // The waiting player is told off but not re-prompted.
    o.play(4).await;
    o.expect_invalid("not your turn").await;

    accepted_move(&mut x, &mut o, 0).await;

    o.play(0).await;
    o.expect_invalid("cell occupied").await;
    let prompt = o.expect("your_turn").await;
    assert_eq!(prompt["board"][0], "X");

    drop(o);
    let over = x.expect("game_over").await;
    assert_eq!(over["result"], "win");
    assert_eq!(over["forfeit"], true);
    assert_eq!(
        handle.await.unwrap(),
        SessionOutcome::Forfeited {
            loser: Seat::Second
        }
    );
}

#[tokio::test]
async fn test_grid_disconnect_of_active_player_forfeits() {
    let (x, mut o, handle) = start_grid(SessionConfig::default()).await;

    drop(x);

    let over = o.expect("game_over").await;
    assert_eq!(over["result"], "win");
    assert_eq!(over["forfeit"], true);
    assert_eq!(over["board"], json!([" ", " ", " ", " ", " ", " ", " ", " ", " "]));
    o.expect_eof().await;
    assert_eq!(
        handle.await.unwrap(),
        SessionOutcome::Forfeited {
            loser: Seat::First
        }
    );
}

#[tokio::test]
async fn test_grid_status_answers_without_advancing() {
    let (mut x, mut o, handle) = start_grid(SessionConfig::default()).await;
    accepted_move(&mut x, &mut o, 4).await;

    // The mover asks: no fresh your_turn follows the reply.
    o.send(json!({"type": "status"})).await;
    let status = o.expect("status").await;
    assert_eq!(status["status"], "O to move");
    assert_eq!(status["game"], "grid");
    assert_eq!(status["your_turn"], true);
    assert_eq!(
        status["board"],
        json!([" ", " ", " ", " ", "X", " ", " ", " ", " "])
    );

    x.send(json!({"type": "get_status"})).await;
    let status = x.expect("status").await;
    assert_eq!(status["your_turn"], false);
    assert!(status.get("scores").is_none());

    // The turn is still O's and the board is unchanged.
    accepted_move(&mut o, &mut x, 0).await;
    drop((x, o));
    handle.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_grid_turn_timeout_counts_as_leaving() {
    let config = SessionConfig {
        turn_timeout: Some(Duration::from_secs(30)),
        ..SessionConfig::default()
    };
    let (mut x, mut o, handle) = start_grid(config).await;

    accepted_move(&mut x, &mut o, 4).await;
    // O never answers.

    let over = o.expect("game_over").await;
    assert_eq!(over["result"], "loss");
    assert_eq!(over["forfeit"], true);
    let over = x.expect("game_over").await;
    assert_eq!(over["result"], "win");
    assert_eq!(
        handle.await.unwrap(),
        SessionOutcome::Forfeited {
            loser: Seat::Second
        }
    );
}

// -- choice game --

async fn start_choice(
    config: SessionConfig,
) -> (Client, Client, JoinHandle<SessionOutcome>) {
    let (mut a, mut b, handle) = start(GameKind::Choice, config);
    for (client, index) in [(&mut a, 0), (&mut b, 1)] {
        let msg = client.expect("start").await;
        assert_eq!(msg["game"], "choice");
        assert_eq!(msg["player_index"], index);
        assert_eq!(msg["round"], 1);
        assert_eq!(msg["max_rounds"], 3);
        assert!(msg.get("board").is_none());
    }
    (a, b, handle)
}

/// Plays one full round and returns each side's `round_result`.
async fn round(
    a: &mut Client,
    b: &mut Client,
    a_token: &str,
    b_token: &str,
) -> (Value, Value) {
    a.choose(a_token).await;
    let received = a.expect("choice_received").await;
    let round = received["round"].clone();
    assert_eq!(b.expect("opponent_chose").await["round"], round);

    b.choose(b_token).await;
    assert_eq!(b.expect("choice_received").await["round"], round);

    let a_result = a.expect("round_result").await;
    let b_result = b.expect("round_result").await;
    assert_eq!(a_result["round"], round);
    assert_eq!(a_result["scores"], b_result["scores"]);
    (a_result, b_result)
}

#[tokio::test]
async fn test_choice_all_ties_end_tied_after_three_rounds() {
    let (mut a, mut b, handle) = start_choice(SessionConfig::default()).await;

    for expected_next in [json!(2), json!(3), Value::Null] {
        let (a_result, b_result) = round(&mut a, &mut b, "rock", "rock").await;
        assert_eq!(a_result["outcome"], "tie");
        assert_eq!(b_result["outcome"], "tie");
        assert_eq!(a_result["scores"], json!([0, 0]));
        assert_eq!(a_result.get("next_round").cloned().unwrap_or(Value::Null), expected_next);
    }

    for client in [&mut a, &mut b] {
        let over = client.expect("game_over").await;
        assert_eq!(over["result"], "tied");
        assert_eq!(over["scores"], json!([0, 0]));
        assert_eq!(over["forfeit"], false);
        client.expect_eof().await;
    }
    assert_eq!(
        handle.await.unwrap(),
        SessionOutcome::Finished { winner: None }
    );
}

#[tokio::test]
async fn test_choice_two_wins_end_the_match_early() {
    let (mut a, mut b, handle) = start_choice(SessionConfig::default()).await;

    let (a_result, b_result) = round(&mut a, &mut b, "rock", "scissors").await;
    assert_eq!(a_result["outcome"], "won");
    assert_eq!(a_result["your_choice"], "rock");
    assert_eq!(a_result["opponent_choice"], "scissors");
    assert_eq!(b_result["outcome"], "lost");
    assert_eq!(b_result["your_choice"], "scissors");
    assert_eq!(a_result["next_round"], 2);

    let (a_result, _) = round(&mut a, &mut b, "Paper", "r").await;
    assert_eq!(a_result["scores"], json!([2, 0]));
    assert!(a_result.get("next_round").is_none());

    let over = a.expect("game_over").await;
    assert_eq!(over["result"], "won");
    assert_eq!(over["scores"], json!([2, 0]));
    assert_eq!(b.expect("game_over").await["result"], "lost");
    a.expect_eof().await;
    b.expect_eof().await;
    assert_eq!(
        handle.await.unwrap(),
        SessionOutcome::Finished {
            winner: Some(Seat::First)
        }
    );
}

#[tokio::test]
async fn test_choice_status_reports_round_and_scores() {
    let (mut a, mut b, handle) = start_choice(SessionConfig::default()).await;
    round(&mut a, &mut b, "rock", "scissors").await;

    a.choose("paper").await;
    a.expect("choice_received").await;
    b.expect("opponent_chose").await;

    for (client, your_turn) in [(&mut a, false), (&mut b, true)] {
        client.send(json!({"type": "status"})).await;
        let status = client.expect("status").await;
        assert_eq!(status["status"], "round 2 of 3, score 1-0");
        assert_eq!(status["game"], "choice");
        assert_eq!(status["round"], 2);
        assert_eq!(status["scores"], json!([1, 0]));
        assert_eq!(status["your_turn"], your_turn);
        assert!(status.get("board").is_none());
    }

    // A's earlier pick still stands.
    b.choose("rock").await;
    b.expect("choice_received").await;
    let result = a.expect("round_result").await;
    assert_eq!(result["your_choice"], "paper");
    assert_eq!(result["outcome"], "won");
    b.expect("round_result").await;

    a.expect("game_over").await;
    b.expect("game_over").await;
    assert_eq!(
        handle.await.unwrap(),
        SessionOutcome::Finished {
            winner: Some(Seat::First)
        }
    );
}

#[tokio::test]
async fn test_choice_rejects_duplicates_and_bad_tokens() {
    let (mut a, mut b, handle) = start_choice(SessionConfig::default()).await;

    a.choose("rock").await;
    a.expect("choice_received").await;
    b.expect("opponent_chose").await;

    a.choose("paper").await;
    a.expect_invalid("already chose this round").await;

    b.choose("lizard").await;
    b.expect_invalid("invalid choice").await;

    b.play(3).await;
    b.expect_invalid("unexpected message type").await;

    // The legacy field name still works.
    b.send(json!({"type": "choice", "move": "paper"})).await;
    b.expect("choice_received").await;

    let a_result = a.expect("round_result").await;
    assert_eq!(a_result["your_choice"], "rock");
    assert_eq!(a_result["outcome"], "lost");
    assert_eq!(b.expect("round_result").await["outcome"], "won");

    drop(a);
    let over = b.expect("game_over").await;
    assert_eq!(over["result"], "won");
    assert_eq!(over["forfeit"], true);
    assert_eq!(over["scores"], json!([0, 1]));
    assert_eq!(
        handle.await.unwrap(),
        SessionOutcome::Forfeited {
            loser: Seat::First
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_choice_timeout_forfeits_the_stalled_player() {
    let config = SessionConfig {
        turn_timeout: Some(Duration::from_secs(10)),
        ..SessionConfig::default()
    };
    let (mut a, mut b, handle) = start_choice(config).await;

    b.choose("scissors").await;
    b.expect("choice_received").await;
    a.expect("opponent_chose").await;

    assert_eq!(a.expect("game_over").await["result"], "lost");
    assert_eq!(b.expect("game_over").await["result"], "won");
    assert_eq!(
        handle.await.unwrap(),
        SessionOutcome::Forfeited {
            loser: Seat::First
        }
    );
}

#[tokio::test(start_paused = true)]
async fn test_choice_timeout_with_nobody_choosing_abandons() {
    let config = SessionConfig {
        turn_timeout: Some(Duration::from_secs(10)),
        ..SessionConfig::default()
    };
    let (mut a, mut b, handle) = start_choice(config).await;

    a.expect_eof().await;
    b.expect_eof().await;
    assert_eq!(handle.await.unwrap(), SessionOutcome::Abandoned);
}
