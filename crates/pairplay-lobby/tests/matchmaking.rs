//! Matchmaker integration tests over in-memory connections.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use pairplay_lobby::{Enqueued, LobbyError, Matchmaker};
use pairplay_protocol::{GameKind, JsonCodec, SessionId};
use pairplay_session::{Player, SessionConfig};
use pairplay_transport::{Connection, ConnectionId, DuplexConnection};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader, DuplexStream, Lines};
use tokio::sync::Mutex;

type TestMatchmaker = Matchmaker<DuplexConnection, JsonCodec>;

fn matchmaker() -> TestMatchmaker {
    Matchmaker::new(JsonCodec, SessionConfig::default())
}

fn player() -> (Player<DuplexConnection>, Lines<BufReader<DuplexStream>>) {
    let (conn, client) = DuplexConnection::duplex();
    (
        Player::attach(conn, JsonCodec, None),
        BufReader::new(client).lines(),
    )
}

async fn next_message(lines: &mut Lines<BufReader<DuplexStream>>) -> Value {
    let line = lines.next_line().await.unwrap().expect("a message");
    serde_json::from_str(&line).unwrap()
}

#[tokio::test]
async fn test_pairs_in_arrival_order() {
    let mut mm = matchmaker();
    let (a, mut a_lines) = player();
    let (b, mut b_lines) = player();
    let (c, _c_lines) = player();

    assert_eq!(mm.enqueue(a, GameKind::Grid).unwrap(), Enqueued::Waiting);
    assert_eq!(mm.waiting(GameKind::Grid), 1);

    let Enqueued::Paired(id) = mm.enqueue(b, GameKind::Grid).unwrap() else {
        panic!("second player should pair");
    };
    assert_eq!(id, SessionId(1));
    assert_eq!(mm.waiting(GameKind::Grid), 0);

    let start = next_message(&mut a_lines).await;
    assert_eq!(start["type"], "start");
    assert_eq!(start["player_index"], 0);
    assert_eq!(start["mark"], "X");
    let start = next_message(&mut b_lines).await;
    assert_eq!(start["player_index"], 1);

    // A third arrival waits alone.
    assert_eq!(mm.enqueue(c, GameKind::Grid).unwrap(), Enqueued::Waiting);
    assert_eq!(mm.waiting(GameKind::Grid), 1);

    let info = mm.session(id).unwrap();
    assert_eq!(info.game, GameKind::Grid);
    assert_eq!(mm.active_sessions(), 1);
}

#[tokio::test]
async fn test_queue_order_decides_seats_for_later_pairs() {
    let mut mm = matchmaker();
    let mut lines = Vec::new();
    for _ in 0..4 {
        let (p, l) = player();
        mm.enqueue(p, GameKind::Grid).unwrap();
        lines.push(l);
    }

    for (i, l) in lines.iter_mut().enumerate() {
        let start = next_message(l).await;
        assert_eq!(start["session"], (i / 2 + 1) as u64);
        assert_eq!(start["player_index"], i % 2);
    }
}

#[tokio::test]
async fn test_games_have_separate_queues() {
    let mut mm = matchmaker();
    let (a, _a_lines) = player();
    let (b, _b_lines) = player();

    assert_eq!(mm.enqueue(a, GameKind::Grid).unwrap(), Enqueued::Waiting);
    assert_eq!(mm.enqueue(b, GameKind::Choice).unwrap(), Enqueued::Waiting);
    assert_eq!(mm.waiting(GameKind::Grid), 1);
    assert_eq!(mm.waiting(GameKind::Choice), 1);
    assert_eq!(mm.active_sessions(), 0);
}

#[tokio::test]
async fn test_evict_removes_a_waiting_player_and_closes_it() {
    let mut mm = matchmaker();
    let (a, mut a_lines) = player();
    let a_id = a.id();

    mm.enqueue(a, GameKind::Choice).unwrap();
    assert!(mm.evict(a_id));
    assert!(!mm.evict(a_id));
    assert_eq!(mm.waiting(GameKind::Choice), 0);
    assert!(!mm.evict(ConnectionId::new(u64::MAX)));

    assert!(a_lines.next_line().await.unwrap().is_none());

    // The next arrival doesn't get paired with the evicted player.
    let (b, _b_lines) = player();
    assert_eq!(mm.enqueue(b, GameKind::Choice).unwrap(), Enqueued::Waiting);
}

#[tokio::test]
async fn test_departed_players_are_reported() {
    let (conn, client) = DuplexConnection::duplex();
    let conn_id = conn.id();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut mm = matchmaker();
    mm.enqueue(Player::attach(conn, JsonCodec, Some(tx)), GameKind::Grid)
        .unwrap();

    drop(client);
    let departed = rx.recv().await.unwrap();
    assert_eq!(departed, conn_id);
    assert!(mm.evict(departed));
}

#[tokio::test]
async fn test_departed_waiting_player_is_never_paired() {
    let (conn, client) = DuplexConnection::duplex();
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
    let mut mm = matchmaker();
    mm.enqueue(Player::attach(conn, JsonCodec, Some(tx)), GameKind::Grid)
        .unwrap();

    // The departure is known but nobody has evicted it yet.
    drop(client);
    rx.recv().await.unwrap();
    assert_eq!(mm.waiting(GameKind::Grid), 1);

    let (b, mut b_lines) = player();
    let b_id = b.id();
    assert_eq!(mm.enqueue(b, GameKind::Grid).unwrap(), Enqueued::Waiting);
    assert_eq!(mm.waiting(GameKind::Grid), 1);
    assert_eq!(mm.active_sessions(), 0);

    // The live player pairs with the next arrival instead.
    let (c, _c_lines) = player();
    let Enqueued::Paired(id) = mm.enqueue(c, GameKind::Grid).unwrap() else {
        panic!("live players should pair");
    };
    assert_eq!(id, SessionId(1));
    let start = next_message(&mut b_lines).await;
    assert_eq!(start["player_index"], 0);
    assert!(!mm.evict(b_id));
}

#[tokio::test]
async fn test_finished_sessions_leave_the_arena() {
    const SESSIONS: u64 = 5;
    let mut mm = matchmaker();
    let mut ids = Vec::new();
    for _ in 0..SESSIONS {
        let (a, a_lines) = player();
        let (b, b_lines) = player();
        mm.enqueue(a, GameKind::Choice).unwrap();
        let Enqueued::Paired(id) = mm.enqueue(b, GameKind::Choice).unwrap() else {
            panic!("second player should pair");
        };
        drop((a_lines, b_lines));
        ids.push(id);
    }

    for &id in &ids {
        while !mm.session(id).unwrap().finished {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }

    // Starting one more session forgets every finished one.
    let (a, a_lines) = player();
    let (b, b_lines) = player();
    mm.enqueue(a, GameKind::Grid).unwrap();
    let Enqueued::Paired(last) = mm.enqueue(b, GameKind::Grid).unwrap() else {
        panic!("second player should pair");
    };
    assert_eq!(last, SessionId(SESSIONS + 1));
    for id in ids {
        assert!(matches!(mm.session(id), Err(LobbyError::SessionNotFound(_))));
    }
    assert!(!mm.session(last).unwrap().finished);
    assert_eq!(mm.active_sessions(), 1);

    drop((a_lines, b_lines));
    while !mm.session(last).unwrap().finished {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert_eq!(mm.active_sessions(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_enqueues_pair_exactly_once() {
    const PLAYERS: usize = 40;
    let mm = Arc::new(Mutex::new(matchmaker()));

    let mut clients = Vec::new();
    let mut tasks = Vec::new();
    for _ in 0..PLAYERS {
        let (p, l) = player();
        clients.push(l);
        let mm = Arc::clone(&mm);
        tasks.push(tokio::spawn(async move {
            mm.lock().await.enqueue(p, GameKind::Choice).unwrap()
        }));
    }

    let mut sessions = HashSet::new();
    let mut waiting = 0;
    for task in tasks {
        match task.await.unwrap() {
            Enqueued::Paired(id) => assert!(sessions.insert(id)),
            Enqueued::Waiting => waiting += 1,
        }
    }
    assert_eq!(sessions.len(), PLAYERS / 2);
    assert_eq!(waiting, PLAYERS / 2);
    assert_eq!(mm.lock().await.waiting(GameKind::Choice), 0);

    // Every player was seated exactly once.
    let mut seats = HashSet::new();
    for l in &mut clients {
        let start = next_message(l).await;
        let seat = (start["session"].as_u64().unwrap(), start["player_index"].as_u64().unwrap());
        assert!(seats.insert(seat));
    }
    assert_eq!(seats.len(), PLAYERS);
}

#[tokio::test]
async fn test_shutdown_drops_waiting_players() {
    let mut mm = matchmaker();
    let (a, mut a_lines) = player();
    mm.enqueue(a, GameKind::Grid).unwrap();

    mm.shutdown();

    assert_eq!(mm.waiting(GameKind::Grid), 0);
    assert!(a_lines.next_line().await.unwrap().is_none());
}
