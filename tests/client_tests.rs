#![cfg(feature = "tokio-runtime")]
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
//! End-to-end tests for [`GameSessionClient`] over a mock transport that the
//! test drives frame by frame.

mod common;

use std::time::Duration;

use duel_session_client::games::{GuessRange, Pick};
use duel_session_client::policy::RetryThenRollback;
use duel_session_client::protocol::MessageKind;
use duel_session_client::{
    NumberGuesserClient, RockPaperScissorsClient, SessionConfig, SessionError, SessionState,
};
use tokio::time::timeout;

use common::{frame, init_tracing, result_frame, score_table, MockTransport};

const WAIT: Duration = Duration::from_secs(2);

#[tokio::test]
async fn full_number_guesser_session() {
    init_tracing();
    let (transport, server) = MockTransport::new();
    let (mut client, _errors) = NumberGuesserClient::start(transport, SessionConfig::new());
    let mut state = client.subscribe();

    server.push(frame(MessageKind::Opponent, "bob"));
    server.push(frame(MessageKind::Game, "1-100"));
    timeout(WAIT, state.wait_for(|s| s.round_config.is_set()))
        .await
        .unwrap()
        .unwrap();

    client.submit_turn(50).unwrap();
    server.push(frame(MessageKind::Info, "lower"));
    client.submit_turn(25).unwrap();
    server.push(result_frame(
        "alice",
        &[("alice", vec![50_i64, 25]), ("bob", vec![70])],
        &[("alice", 1), ("bob", 0)],
    ));
    timeout(WAIT, state.wait_for(|s| s.round_finished))
        .await
        .unwrap()
        .unwrap();

    let snapshot = client.state();
    assert_eq!(snapshot.winner_id, "alice");
    assert_eq!(snapshot.local_player_id, "alice");
    assert!(snapshot.local_player_won());
    assert_eq!(snapshot.local_score(), Some(1));
    assert_eq!(snapshot.opponent_score(), Some(0));

    client.request_replay().unwrap();
    server.push(frame(MessageKind::Replay, ""));
    timeout(WAIT, state.wait_for(|s| !s.round_finished))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(client.state().round_config, GuessRange::default());

    let sent = server.wait_for_sent(3).await;
    let kinds: Vec<_> = sent.iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        [MessageKind::PlayerTurn, MessageKind::PlayerTurn, MessageKind::Replay]
    );
    assert_eq!(sent[0].text, "50");
    assert_eq!(sent[1].text, "25");

    client.shutdown().await;
    assert!(server.is_closed());
    assert_eq!(client.state(), SessionState::default());
}

#[tokio::test]
async fn commands_are_rejected_after_server_hang_up() {
    let (transport, server) = MockTransport::new();
    let (mut client, _errors) = RockPaperScissorsClient::start(transport, SessionConfig::new());
    let mut state = client.subscribe();

    server.push(frame(MessageKind::Opponent, "bob"));
    server.hang_up();
    timeout(WAIT, state.wait_for(|s| !s.is_connected()))
        .await
        .unwrap()
        .unwrap();

    assert!(matches!(
        client.submit_turn(Pick::Paper),
        Err(SessionError::TransportNotReady)
    ));
    assert!(matches!(
        client.request_replay(),
        Err(SessionError::TransportNotReady)
    ));
    assert_eq!(client.state(), SessionState::default());
    assert!(server.sent_envelopes().is_empty());

    client.shutdown().await;
}

#[tokio::test]
async fn decode_errors_are_reported_without_dropping_the_session() {
    let (transport, server) = MockTransport::new();
    let (mut client, mut errors) = RockPaperScissorsClient::start(transport, SessionConfig::new());

    server.push(frame(MessageKind::Opponent, "bob"));
    server.push("{\"type\":");
    server.push(r#"{"type":"RESULT","text":"bob"}"#);
    server.push(frame(MessageKind::Game, "Lizard"));
    server.push(frame(MessageKind::Game, "Rock"));

    for _ in 0..3 {
        let err = timeout(WAIT, errors.recv()).await.unwrap().unwrap();
        assert!(err.is_decode(), "unexpected error {err:?}");
    }

    let mut state = client.subscribe();
    timeout(WAIT, state.wait_for(|s| s.game_data.get("bob") == Some(&Pick::Rock)))
        .await
        .unwrap()
        .unwrap();
    assert!(client.is_connected());
    assert!(!client.state().round_finished);

    client.shutdown().await;
}

#[tokio::test]
async fn receive_failure_closes_the_session() {
    let (transport, server) = MockTransport::new();
    let (mut client, mut errors) = NumberGuesserClient::start(transport, SessionConfig::new());

    server.push(frame(MessageKind::Opponent, "bob"));
    server.fail("connection reset");

    let err = timeout(WAIT, errors.recv()).await.unwrap().unwrap();
    assert!(matches!(err, SessionError::TransportReceive(ref r) if r == "connection reset"));
    assert!(!client.is_connected());

    client.shutdown().await;
}

#[tokio::test]
async fn opponent_departure_keeps_the_session_open() {
    let (transport, server) = MockTransport::new();
    let (mut client, _errors) = RockPaperScissorsClient::start(transport, SessionConfig::new());
    let mut state = client.subscribe();

    server.push(frame(MessageKind::Opponent, "bob"));
    client.submit_turn(Pick::Scissor).unwrap();
    server.push(result_frame(
        "alice",
        &[("alice", Pick::Scissor), ("bob", Pick::Paper)],
        &[("alice", 2), ("bob", 1)],
    ));
    timeout(WAIT, state.wait_for(|s| s.round_finished))
        .await
        .unwrap()
        .unwrap();

    server.push(frame(MessageKind::OpponentLeft, ""));
    timeout(WAIT, state.wait_for(|s| !s.has_opponent()))
        .await
        .unwrap()
        .unwrap();

    let snapshot = client.state();
    assert!(snapshot.is_connected());
    assert_eq!(snapshot.scores, score_table(&[("alice", 0)]));
    assert!(snapshot.local_submission.is_none());
    assert!(!snapshot.round_finished);

    server.push(frame(MessageKind::Opponent, "carol"));
    timeout(WAIT, state.wait_for(|s| s.opponent_id == "carol"))
        .await
        .unwrap()
        .unwrap();
    client.submit_turn(Pick::Rock).unwrap();

    let sent = server.wait_for_sent(2).await;
    client.shutdown().await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].kind, MessageKind::Game);
    assert_eq!(sent[1].text, "Rock");
}

#[tokio::test]
async fn subscribers_observe_whole_snapshots() {
    let (transport, server) = MockTransport::new();
    let (mut client, _errors) = NumberGuesserClient::start(transport, SessionConfig::new());
    let mut state = client.subscribe();
    assert!(state.borrow_and_update().is_connected());

    server.push(frame(MessageKind::Timer, "30"));
    timeout(WAIT, state.changed()).await.unwrap().unwrap();
    let seen = state.borrow_and_update().clone();
    assert_eq!(seen.turn_timer.as_deref(), Some("30"));
    assert!(seen.is_connected());

    client.shutdown().await;
    assert_eq!(*state.borrow(), SessionState::default());
}

#[tokio::test]
async fn acknowledged_submission_is_not_resent() {
    let (transport, server) = MockTransport::new();
    let config = SessionConfig::new()
        .with_submission_policy(RetryThenRollback::new(Duration::from_millis(200), 3));
    let (mut client, mut errors) = NumberGuesserClient::start(transport, config);

    client.submit_turn(12).unwrap();
    server.wait_for_sent(1).await;
    server.push(frame(MessageKind::Info, "too high"));

    tokio::time::sleep(Duration::from_millis(700)).await;
    assert_eq!(server.sent_envelopes().len(), 1);
    assert_eq!(client.state().local_submission, Some(12));
    assert!(errors.try_recv().is_err());

    client.shutdown().await;
}

#[tokio::test]
async fn dropping_the_client_publishes_closed_state() {
    let (transport, _server) = MockTransport::new();
    let (client, _errors) = NumberGuesserClient::start(transport, SessionConfig::new());
    let state = client.subscribe();
    assert!(state.borrow().is_connected());

    drop(client);
    assert!(!state.borrow().is_connected());
}
