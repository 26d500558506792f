#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
//! Wire-format fixtures for the duel session protocol.
//!
//! Frames here are copied verbatim from what game servers send, so these
//! tests catch any drift in field names or accepted shapes.

mod common;

use duel_session_client::games::Pick;
use duel_session_client::protocol::{Envelope, GameBoard, MessageKind, RoundData};
use duel_session_client::{NumberGuesser, SessionStore};
use serde_json::json;

use common::score_table;

#[test]
fn inbound_kinds_decode_from_server_spelling() {
    let fixtures = [
        (r#"{"type":"INFO","text":"Waiting for an opponent"}"#, MessageKind::Info),
        (r#"{"type":"MODAL-INFO","text":"Play again?"}"#, MessageKind::ModalInfo),
        (r#"{"type":"CHAT","text":"hi"}"#, MessageKind::Chat),
        (r#"{"type":"GAME","text":"1-100"}"#, MessageKind::Game),
        (r#"{"type":"OPPONENT","text":"playerB"}"#, MessageKind::Opponent),
        (r#"{"type":"TIMER","text":"00:10"}"#, MessageKind::Timer),
        (r#"{"type":"RESET","text":""}"#, MessageKind::Reset),
        (r#"{"type":"REPLAY","text":""}"#, MessageKind::Replay),
        (r#"{"type":"OPPONENT-LEFT","text":""}"#, MessageKind::OpponentLeft),
        (r#"{"type":"PLAYER_TURN","text":"42"}"#, MessageKind::PlayerTurn),
    ];
    for (frame, kind) in fixtures {
        let envelope = Envelope::decode(frame).unwrap();
        assert_eq!(envelope.kind, kind, "{frame}");
        assert!(envelope.data.is_none());
    }
}

#[test]
fn kind_spelling_is_case_sensitive() {
    let envelope = Envelope::decode(r#"{"type":"info","text":"x"}"#).unwrap();
    assert_eq!(envelope.kind, MessageKind::Unknown);
}

#[test]
fn number_guesser_result_fixture() {
    let frame = r#"{
        "type": "RESULT",
        "text": "playerA",
        "data": {
            "game": {"playerA": [3, 7], "playerB": [5]},
            "score": {"playerA": 2, "playerB": 1}
        }
    }"#;
    let envelope = Envelope::decode(frame).unwrap();
    assert_eq!(envelope.kind, MessageKind::Result);
    assert_eq!(envelope.text, "playerA");

    let data = RoundData::<Vec<i64>>::from_value(envelope.data.unwrap()).unwrap();
    assert_eq!(data.game.get("playerA"), Some(&vec![3, 7]));
    assert_eq!(data.game.get("playerB"), Some(&vec![5]));
    assert_eq!(data.score, Some(score_table(&[("playerA", 2), ("playerB", 1)])));
}

#[test]
fn rock_paper_scissors_result_fixtures() {
    let scored = json!({
        "game": {"playerA": "Paper", "playerB": "Rock"},
        "score": {"playerA": 1, "playerB": 0}
    });
    let data = RoundData::<Pick>::from_value(scored).unwrap();
    assert_eq!(data.game.get("playerA"), Some(&Pick::Paper));
    assert!(data.score.is_some());

    let legacy = json!({"playerA": "Scissors", "playerB": "Scissor"});
    let data = RoundData::<Pick>::from_value(legacy).unwrap();
    assert_eq!(data.game.get("playerA"), Some(&Pick::Scissor));
    assert_eq!(data.game.get("playerB"), Some(&Pick::Scissor));
    assert!(data.score.is_none());
}

#[test]
fn null_score_is_treated_as_absent() {
    let data = RoundData::<Pick>::from_value(json!({
        "game": {"playerA": "Rock"},
        "score": null
    }))
    .unwrap();
    assert!(data.score.is_none());
}

#[test]
fn result_with_null_score_keeps_previous_scores() {
    let store = SessionStore::<NumberGuesser>::new();
    store.on_open();
    store
        .on_frame(r#"{"type":"RESULT","text":"playerA","data":{"game":{"playerA":[3]},"score":{"playerA":2,"playerB":1}}}"#)
        .unwrap();

    store
        .on_frame(r#"{"type":"RESULT","text":"playerB","data":{"game":{"playerB":[8]},"score":null}}"#)
        .unwrap();

    let state = store.snapshot();
    assert_eq!(state.winner_id, "playerB");
    assert_eq!(state.game_data.get("playerB"), Some(&vec![8]));
    assert!(state.game_data.get("playerA").is_none());
    assert_eq!(state.scores, score_table(&[("playerA", 2), ("playerB", 1)]));
}

#[test]
fn outbound_frames_match_server_expectations() {
    let cases = [
        (Envelope::new(MessageKind::PlayerTurn, "42"), r#"{"type":"PLAYER_TURN","text":"42"}"#),
        (Envelope::new(MessageKind::Replay, ""), r#"{"type":"REPLAY","text":""}"#),
        (Envelope::new(MessageKind::Game, "Paper"), r#"{"type":"GAME","text":"Paper"}"#),
        (Envelope::new(MessageKind::Reset, ""), r#"{"type":"RESET","text":""}"#),
    ];
    for (envelope, expected) in cases {
        assert_eq!(envelope.encode().unwrap(), expected);
    }
}

#[test]
fn result_data_encodes_both_board_shapes() {
    let mut board = GameBoard::default();
    board.players.insert("playerA".to_string(), vec![1_i64]);
    let flat = RoundData {
        game: board.clone(),
        score: Some(score_table(&[("playerA", 0)])),
    };
    assert_eq!(
        flat.to_value().unwrap(),
        json!({"game": {"playerA": [1]}, "score": {"playerA": 0}})
    );

    board.target = Some(1);
    let nested = RoundData { game: board, score: None };
    let value = nested.to_value().unwrap();
    assert_eq!(value, json!({"game": {"targetNumber": 1, "player": {"playerA": [1]}}}));
    assert_eq!(RoundData::<Vec<i64>>::from_value(value).unwrap(), nested);
}
