//! Pure mapping from `(state, inbound envelope)` to the next state.
//!
//! [`reduce`] never touches I/O and never mutates its input. Fields that a
//! message kind does not mention are carried over unchanged. Any error means
//! the caller keeps the previous snapshot.

use tracing::{debug, warn};

use crate::error::{Result, SessionError};
use crate::protocol::{Envelope, MessageKind, RoundData};
use crate::rules::{GameRules, GameUpdate};
use crate::state::SessionState;

/// Compute the state that follows `state` after receiving `envelope`.
///
/// # Errors
///
/// Returns [`SessionError::ProtocolDecode`] if the envelope is recognized but
/// its payload is unusable: a `RESULT` without well-formed `data`, or a `GAME`
/// message the game's rules cannot interpret.
pub fn reduce<G: GameRules>(state: &SessionState<G>, envelope: &Envelope) -> Result<SessionState<G>> {
    let mut next = state.clone();
    match envelope.kind {
        MessageKind::Opponent => {
            next.opponent_id = envelope.text.clone();
        }
        MessageKind::Timer => {
            next.turn_timer = Some(envelope.text.clone());
        }
        MessageKind::Result => {
            let data = envelope
                .data
                .clone()
                .ok_or_else(|| SessionError::decode("RESULT without data"))?;
            let data = RoundData::<G::Contribution>::from_value(data)?;
            next.round_finished = true;
            next.winner_id = envelope.text.clone();
            next.game_data = data.game;
            if let Some(score) = data.score {
                next.scores = score;
            }
            learn_local_seat(&mut next);
        }
        MessageKind::Game => match G::interpret_game(&envelope.text)? {
            GameUpdate::RoundConfig(config) => {
                next.round_config = config;
            }
            GameUpdate::OpponentContribution(contribution) => {
                if next.opponent_id.is_empty() {
                    debug!(game = G::NAME, "opponent pick before opponent assignment, ignoring");
                } else {
                    next.game_data
                        .players
                        .insert(next.opponent_id.clone(), contribution);
                }
            }
        },
        MessageKind::Info => {
            next.info_text = envelope.text.clone();
        }
        MessageKind::ModalInfo => {
            next.modal_text = envelope.text.clone();
        }
        MessageKind::Replay => reset_for_replay(&mut next),
        MessageKind::Reset if G::RESET_IS_REPLAY => reset_for_replay(&mut next),
        MessageKind::OpponentLeft => reconcile_opponent_left(&mut next),
        MessageKind::Reset | MessageKind::PlayerTurn | MessageKind::Chat | MessageKind::Unknown => {
            debug!(kind = %envelope.kind, game = G::NAME, "no state effect");
        }
    }
    Ok(next)
}

fn reset_for_replay<G: GameRules>(state: &mut SessionState<G>) {
    state.info_text.clear();
    state.round_finished = false;
}

/// Identify the local seat from a result's score table.
///
/// With a known opponent, the only other key is the local player. Anything
/// else leaves the seat as it was.
fn learn_local_seat<G: GameRules>(state: &mut SessionState<G>) {
    if state.opponent_id.is_empty() {
        return;
    }
    let local = {
        let mut others = state.scores.keys().filter(|id| **id != state.opponent_id);
        match (others.next(), others.next()) {
            (Some(local), None) => local.clone(),
            _ => return,
        }
    };
    if local != state.local_player_id {
        debug!(player = %local, "local seat identified");
        state.local_player_id = local;
    }
}

/// Drop the departed opponent and return the session to waiting-for-opponent.
///
/// The remaining player's score is reset to zero. That player is the known
/// local seat, or the single remaining entry when the seat is not yet known.
/// With no entry left, or several and no known seat, scores are left as is.
/// The connection status and the local seat survive.
pub(crate) fn reconcile_opponent_left<G: GameRules>(state: &mut SessionState<G>) {
    let departed = std::mem::take(&mut state.opponent_id);
    state.game_data.players.remove(&departed);
    state.scores.remove(&departed);

    let remaining = if state.scores.contains_key(&state.local_player_id) {
        Some(state.local_player_id.clone())
    } else if state.scores.len() == 1 {
        state.scores.keys().next().cloned()
    } else {
        None
    };
    match remaining {
        Some(player) => {
            state.scores.insert(player, 0);
        }
        None if state.scores.is_empty() => {
            debug!(departed = %departed, "opponent left with no remaining score entry");
        }
        None => {
            warn!(
                departed = %departed,
                entries = state.scores.len(),
                "opponent left but the remaining seat is ambiguous; scores kept"
            );
        }
    }

    state.turn_timer = None;
    state.round_finished = false;
    state.local_submission = None;
    state.winner_id.clear();
    state.info_text.clear();
    state.modal_text.clear();
    state.round_config = G::RoundConfig::default();
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::games::{GuessRange, NumberGuesser, Pick, RockPaperScissors};
    use crate::protocol::Scores;
    use serde_json::json;

    fn apply<G: GameRules>(state: &SessionState<G>, frame: &str) -> SessionState<G> {
        reduce(state, &Envelope::decode(frame).unwrap()).unwrap()
    }

    fn scores(entries: &[(&str, i64)]) -> Scores {
        entries.iter().map(|(k, v)| ((*k).to_string(), *v)).collect()
    }

    #[test]
    fn opponent_sets_id() {
        let state = SessionState::<NumberGuesser>::default();
        let next = apply(&state, r#"{"type":"OPPONENT","text":"bob"}"#);
        assert_eq!(next.opponent_id, "bob");
        assert_eq!(state.opponent_id, "", "input must not change");
    }

    #[test]
    fn timer_and_info_are_idempotent() {
        let state = SessionState::<NumberGuesser>::default();
        for frame in [
            r#"{"type":"TIMER","text":"00:09"}"#,
            r#"{"type":"INFO","text":"your turn"}"#,
        ] {
            let once = apply(&state, frame);
            let twice = apply(&once, frame);
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn game_sets_guess_range() {
        let state = SessionState::<NumberGuesser>::default();
        let next = apply(&state, r#"{"type":"GAME","text":"1-100"}"#);
        assert_eq!(next.round_config, GuessRange { min: 1, max: 100 });
    }

    #[test]
    fn bad_guess_range_is_an_error() {
        let state = SessionState::<NumberGuesser>::default();
        let env = Envelope::new(MessageKind::Game, "one-hundred");
        assert!(reduce(&state, &env).unwrap_err().is_decode());
    }

    #[test]
    fn result_replaces_board_and_scores() {
        let mut state = SessionState::<NumberGuesser>::default();
        state.opponent_id = "bob".into();
        let next = apply(
            &state,
            r#"{"type":"RESULT","text":"bob","data":{"game":{"bob":[42]},"score":{"bob":1,"alice":0}}}"#,
        );
        assert!(next.round_finished);
        assert_eq!(next.winner_id, "bob");
        assert_eq!(next.game_data.get("bob"), Some(&vec![42]));
        assert_eq!(next.scores, scores(&[("bob", 1), ("alice", 0)]));
        assert_eq!(next.local_player_id, "alice");
    }

    #[test]
    fn result_without_data_is_an_error() {
        let state = SessionState::<NumberGuesser>::default();
        let env = Envelope::new(MessageKind::Result, "bob");
        assert!(reduce(&state, &env).unwrap_err().is_decode());
    }

    #[test]
    fn legacy_result_keeps_scores() {
        let mut state = SessionState::<RockPaperScissors>::default();
        state.scores = scores(&[("alice", 2)]);
        let env = Envelope::with_data(
            MessageKind::Result,
            "alice",
            json!({"alice": "Rock", "bob": "Scissor"}),
        );
        let next = reduce(&state, &env).unwrap();
        assert_eq!(next.game_data.get("bob"), Some(&Pick::Scissor));
        assert_eq!(next.scores, scores(&[("alice", 2)]));
    }

    #[test]
    fn replay_clears_info_and_finish_only() {
        let mut state = SessionState::<NumberGuesser>::default();
        state.round_finished = true;
        state.info_text = "bob wins".into();
        state.scores = scores(&[("bob", 1)]);
        state.turn_timer = Some("3".into());
        let next = apply(&state, r#"{"type":"REPLAY","text":""}"#);
        assert!(!next.round_finished);
        assert!(next.info_text.is_empty());
        assert_eq!(next.scores, state.scores);
        assert_eq!(next.turn_timer, state.turn_timer);
    }

    #[test]
    fn reset_is_replay_only_for_legacy_game() {
        let frame = r#"{"type":"RESET","text":""}"#;

        let mut rps = SessionState::<RockPaperScissors>::default();
        rps.round_finished = true;
        assert!(!apply(&rps, frame).round_finished);

        let mut guesser = SessionState::<NumberGuesser>::default();
        guesser.round_finished = true;
        assert!(apply(&guesser, frame).round_finished);
    }

    #[test]
    fn legacy_game_records_opponent_pick() {
        let mut state = SessionState::<RockPaperScissors>::default();
        let ignored = apply(&state, r#"{"type":"GAME","text":"Paper"}"#);
        assert!(ignored.game_data.is_empty());

        state.opponent_id = "bob".into();
        let next = apply(&state, r#"{"type":"GAME","text":"Paper"}"#);
        assert_eq!(next.game_data.get("bob"), Some(&Pick::Paper));
    }

    #[test]
    fn passive_kinds_change_nothing() {
        let mut state = SessionState::<NumberGuesser>::default();
        state.info_text = "hi".into();
        for frame in [
            r#"{"type":"PLAYER_TURN","text":"5"}"#,
            r#"{"type":"CHAT","text":"gg"}"#,
            r#"{"type":"SPECTATE","text":"x","data":[1,2,3]}"#,
        ] {
            assert_eq!(apply(&state, frame), state);
        }
    }

    #[test]
    fn opponent_left_resets_remaining_seat() {
        let mut state = SessionState::<NumberGuesser>::default();
        state.opponent_id = "bob".into();
        state.scores = scores(&[("bob", 1), ("alice", 3)]);
        state.game_data.players.insert("bob".into(), vec![1]);
        state.game_data.players.insert("alice".into(), vec![2]);
        state.round_finished = true;
        state.winner_id = "bob".into();
        state.local_submission = Some(2);
        state.round_config = GuessRange { min: 1, max: 10 };
        state.modal_text = "bob left".into();
        state.connection = crate::state::ConnectionStatus::Connected;

        let next = apply(&state, r#"{"type":"OPPONENT-LEFT","text":""}"#);
        assert_eq!(next.scores, scores(&[("alice", 0)]));
        assert!(next.game_data.get("bob").is_none());
        assert_eq!(next.game_data.get("alice"), Some(&vec![2]));
        assert!(next.opponent_id.is_empty());
        assert!(!next.round_finished);
        assert!(next.winner_id.is_empty());
        assert!(next.local_submission.is_none());
        assert!(next.modal_text.is_empty());
        assert_eq!(next.round_config, GuessRange::default());
        assert!(next.is_connected());
    }

    #[test]
    fn opponent_left_prefers_known_local_seat() {
        let mut state = SessionState::<NumberGuesser>::default();
        state.opponent_id = "bob".into();
        state.local_player_id = "carol".into();
        state.scores = scores(&[("alice", 4), ("bob", 1), ("carol", 2)]);

        let next = apply(&state, r#"{"type":"OPPONENT-LEFT"}"#);
        assert_eq!(next.scores, scores(&[("alice", 4), ("carol", 0)]));
        assert_eq!(next.local_player_id, "carol");
    }

    #[test]
    fn opponent_left_with_ambiguous_or_empty_scores() {
        let mut state = SessionState::<NumberGuesser>::default();
        state.opponent_id = "bob".into();
        state.scores = scores(&[("alice", 4), ("bob", 1), ("carol", 2)]);
        let next = apply(&state, r#"{"type":"OPPONENT-LEFT"}"#);
        assert_eq!(next.scores, scores(&[("alice", 4), ("carol", 2)]));

        let mut empty = SessionState::<NumberGuesser>::default();
        empty.opponent_id = "bob".into();
        let next = apply(&empty, r#"{"type":"OPPONENT-LEFT"}"#);
        assert!(next.scores.is_empty());
    }

    #[test]
    fn opponent_left_without_opponent_keeps_single_entry_zeroed() {
        let mut state = SessionState::<NumberGuesser>::default();
        state.scores = scores(&[("alice", 5)]);
        let next = apply(&state, r#"{"type":"OPPONENT-LEFT"}"#);
        assert_eq!(next.scores, scores(&[("alice", 0)]));
    }
}
