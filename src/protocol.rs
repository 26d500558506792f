//! Wire-compatible protocol types for the duel session protocol.
//!
//! Every frame is a UTF-8 JSON text message shaped as
//! `{"type": <kind>, "text": <string>, "data"?: <payload>}`. The `data`
//! field is kept as raw JSON in [`Envelope`] and only decoded into a typed
//! [`RoundData`] by the reducer, because its shape depends on the game.

use std::collections::BTreeMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, SessionError};

// ── Type aliases ────────────────────────────────────────────────────

/// Server-assigned player identifier.
pub type PlayerId = String;

/// Cumulative score per player.
pub type Scores = BTreeMap<PlayerId, i64>;

// ── Message kinds ───────────────────────────────────────────────────

/// The closed set of envelope kinds.
///
/// Kinds not listed here deserialize to [`MessageKind::Unknown`] so that a
/// server speaking a newer vocabulary does not break older clients.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// Advisory text for the info line.
    #[serde(rename = "INFO")]
    Info,
    /// Advisory text for a modal dialog.
    #[serde(rename = "MODAL-INFO")]
    ModalInfo,
    /// Reserved for chat; never acted on.
    #[serde(rename = "CHAT")]
    Chat,
    /// Round configuration (number guesser) or a legacy pick broadcast.
    #[serde(rename = "GAME")]
    Game,
    /// Opponent assignment.
    #[serde(rename = "OPPONENT")]
    Opponent,
    /// Countdown tick.
    #[serde(rename = "TIMER")]
    Timer,
    /// Round result with winner, board and scores.
    #[serde(rename = "RESULT")]
    Result,
    /// Legacy replay request / acknowledgement.
    #[serde(rename = "RESET")]
    Reset,
    /// Replay request / acknowledgement.
    #[serde(rename = "REPLAY")]
    Replay,
    /// The opponent left mid-session.
    #[serde(rename = "OPPONENT-LEFT")]
    OpponentLeft,
    /// A player's submission for the current round.
    #[serde(rename = "PLAYER_TURN")]
    PlayerTurn,
    /// Any kind outside the recognized vocabulary.
    #[serde(other, skip_serializing)]
    Unknown,
}

impl MessageKind {
    /// Returns the exact string used for this kind on the wire.
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::ModalInfo => "MODAL-INFO",
            Self::Chat => "CHAT",
            Self::Game => "GAME",
            Self::Opponent => "OPPONENT",
            Self::Timer => "TIMER",
            Self::Result => "RESULT",
            Self::Reset => "RESET",
            Self::Replay => "REPLAY",
            Self::OpponentLeft => "OPPONENT-LEFT",
            Self::PlayerTurn => "PLAYER_TURN",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire_str())
    }
}

// ── Envelope ────────────────────────────────────────────────────────

/// The single message wrapper exchanged in both directions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    /// Selects how `text` and `data` are interpreted.
    #[serde(rename = "type")]
    pub kind: MessageKind,
    /// Free-form text payload. Missing on the wire means empty.
    #[serde(default)]
    pub text: String,
    /// Structured payload, only meaningful for `RESULT`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Envelope {
    /// Create an envelope without structured data.
    pub fn new(kind: MessageKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            data: None,
        }
    }

    /// Create an envelope carrying structured data.
    pub fn with_data(kind: MessageKind, text: impl Into<String>, data: Value) -> Self {
        Self {
            kind,
            text: text.into(),
            data: Some(data),
        }
    }

    /// Parse one inbound text frame.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ProtocolDecode`] if the frame is not a JSON
    /// object with a string `type` field.
    pub fn decode(frame: &str) -> Result<Self> {
        serde_json::from_str(frame).map_err(SessionError::decode)
    }

    /// Serialize this envelope into one outbound text frame.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Serialization`] if encoding fails, which
    /// includes attempting to send [`MessageKind::Unknown`].
    pub fn encode(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ── Round payloads ──────────────────────────────────────────────────

/// Per-player contributions for the current round.
///
/// The number guesser reveals the secret number together with the result, so
/// the board optionally carries it as `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameBoard<C> {
    /// The number every player was guessing, once revealed.
    pub target: Option<i64>,
    /// Player id → contribution.
    pub players: BTreeMap<PlayerId, C>,
}

impl<C> Default for GameBoard<C> {
    fn default() -> Self {
        Self {
            target: None,
            players: BTreeMap::new(),
        }
    }
}

impl<C> GameBoard<C> {
    /// Contribution recorded for `player`, if any.
    pub fn get(&self, player: &str) -> Option<&C> {
        self.players.get(player)
    }

    /// Returns `true` when no player has contributed.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

impl<C: DeserializeOwned> GameBoard<C> {
    /// Decode either a flat `{player: contribution}` board or the nested
    /// `{"targetNumber": n, "player": {...}}` form.
    fn from_value(value: Value) -> std::result::Result<Self, serde_json::Error> {
        let nested = value
            .as_object()
            .is_some_and(|map| map.get("player").is_some_and(Value::is_object));
        if nested {
            let wire: NestedBoard<C> = serde_json::from_value(value)?;
            Ok(Self {
                target: wire.target_number,
                players: wire.player,
            })
        } else {
            Ok(Self {
                target: None,
                players: serde_json::from_value(value)?,
            })
        }
    }
}

impl<C: Serialize> Serialize for GameBoard<C> {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self.target {
            Some(target) => NestedBoardRef {
                target_number: target,
                player: &self.players,
            }
            .serialize(serializer),
            None => self.players.serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
#[serde(bound = "C: DeserializeOwned")]
struct NestedBoard<C> {
    #[serde(rename = "targetNumber", default)]
    target_number: Option<i64>,
    player: BTreeMap<PlayerId, C>,
}

#[derive(Serialize)]
struct NestedBoardRef<'a, C> {
    #[serde(rename = "targetNumber")]
    target_number: i64,
    player: &'a BTreeMap<PlayerId, C>,
}

/// Decoded `data` of a `RESULT` envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundData<C> {
    /// Every player's contribution for the finished round.
    pub game: GameBoard<C>,
    /// Cumulative scores, absent in legacy results.
    pub score: Option<Scores>,
}

impl<C: DeserializeOwned> RoundData<C> {
    /// Decode the raw `data` value of a `RESULT` envelope.
    ///
    /// Accepts `{"game": <board>, "score": {...}}` as well as a bare board
    /// with no score table.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ProtocolDecode`] if the value matches neither
    /// shape for this game's contribution type.
    pub fn from_value(value: Value) -> Result<Self> {
        let Value::Object(mut map) = value else {
            return Err(SessionError::decode("result data must be a JSON object"));
        };
        if let Some(game) = map.remove("game") {
            let score = match map.remove("score") {
                None | Some(Value::Null) => None,
                Some(score) => Some(serde_json::from_value(score).map_err(SessionError::decode)?),
            };
            let game = GameBoard::from_value(game).map_err(SessionError::decode)?;
            Ok(Self { game, score })
        } else {
            let game = GameBoard::from_value(Value::Object(map)).map_err(SessionError::decode)?;
            Ok(Self { game, score: None })
        }
    }
}

impl<C: Serialize> RoundData<C> {
    /// Encode into the `data` value of a `RESULT` envelope.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Serialization`] if a contribution fails to
    /// serialize.
    pub fn to_value(&self) -> Result<Value> {
        let mut map = serde_json::Map::new();
        map.insert("game".into(), serde_json::to_value(&self.game)?);
        if let Some(score) = &self.score {
            map.insert("score".into(), serde_json::to_value(score)?);
        }
        Ok(Value::Object(map))
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn every_kind_matches_its_wire_string() {
        let kinds = [
            MessageKind::Info,
            MessageKind::ModalInfo,
            MessageKind::Chat,
            MessageKind::Game,
            MessageKind::Opponent,
            MessageKind::Timer,
            MessageKind::Result,
            MessageKind::Reset,
            MessageKind::Replay,
            MessageKind::OpponentLeft,
            MessageKind::PlayerTurn,
        ];
        for kind in kinds {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_wire_str()));
        }
    }

    #[test]
    fn unrecognized_kind_decodes_as_unknown() {
        let env = Envelope::decode(r#"{"type":"EMOTE","text":"wave"}"#).unwrap();
        assert_eq!(env.kind, MessageKind::Unknown);
        assert_eq!(env.text, "wave");
    }

    #[test]
    fn unknown_kind_cannot_be_encoded() {
        let env = Envelope::new(MessageKind::Unknown, "");
        assert!(matches!(env.encode(), Err(SessionError::Serialization(_))));
    }

    #[test]
    fn missing_text_defaults_to_empty() {
        let env = Envelope::decode(r#"{"type":"REPLAY"}"#).unwrap();
        assert_eq!(env.kind, MessageKind::Replay);
        assert!(env.text.is_empty());
        assert!(env.data.is_none());
    }

    #[test]
    fn outbound_frame_omits_absent_data() {
        let frame = Envelope::new(MessageKind::PlayerTurn, "42").encode().unwrap();
        assert_eq!(frame, r#"{"type":"PLAYER_TURN","text":"42"}"#);
    }

    #[test]
    fn malformed_frames_are_decode_errors() {
        for frame in ["", "not json", "[]", r#"{"text":"x"}"#, r#"{"type":5}"#] {
            let err = Envelope::decode(frame).unwrap_err();
            assert!(err.is_decode(), "frame {frame:?} gave {err:?}");
        }
    }

    #[test]
    fn round_data_flat_board_with_scores() {
        let data: RoundData<Vec<i64>> = RoundData::from_value(json!({
            "game": {"playerA": [4], "playerB": [7]},
            "score": {"playerA": 2, "playerB": 1}
        }))
        .unwrap();
        assert_eq!(data.game.target, None);
        assert_eq!(data.game.get("playerA"), Some(&vec![4]));
        assert_eq!(data.score.unwrap().get("playerB"), Some(&1));
    }

    #[test]
    fn round_data_nested_board_keeps_target() {
        let data: RoundData<Vec<i64>> = RoundData::from_value(json!({
            "game": {"targetNumber": 42, "player": {"bob": [10, 42]}},
            "score": {"bob": 1}
        }))
        .unwrap();
        assert_eq!(data.game.target, Some(42));
        assert_eq!(data.game.get("bob"), Some(&vec![10, 42]));
    }

    #[test]
    fn round_data_bare_board_has_no_scores() {
        let data: RoundData<String> =
            RoundData::from_value(json!({"alice": "Rock", "bob": "Paper"})).unwrap();
        assert!(data.score.is_none());
        assert_eq!(data.game.players.len(), 2);
    }

    #[test]
    fn round_data_rejects_mismatched_contribution() {
        let err = RoundData::<Vec<i64>>::from_value(json!({
            "game": {"bob": "Rock"},
            "score": {"bob": 1}
        }))
        .unwrap_err();
        assert!(err.is_decode());

        let err = RoundData::<Vec<i64>>::from_value(json!("RESULT")).unwrap_err();
        assert!(err.is_decode());
    }

    #[test]
    fn nested_board_serializes_back_to_nested_form() {
        let mut board = GameBoard::default();
        board.target = Some(9);
        board.players.insert("bob".to_string(), vec![3_i64, 9]);
        let data = RoundData {
            game: board,
            score: None,
        };
        assert_eq!(
            data.to_value().unwrap(),
            json!({"game": {"targetNumber": 9, "player": {"bob": [3, 9]}}})
        );
    }
}
