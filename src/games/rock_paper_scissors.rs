//! Rock / paper / scissors.
//!
//! This game speaks the legacy outbound vocabulary: a pick is sent as `GAME`
//! and a replay as `RESET`. Inbound, a `GAME` message is the opponent's pick
//! broadcast and `RESET` is treated exactly like `REPLAY`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SessionError};
use crate::protocol::MessageKind;
use crate::rules::{GameRules, GameUpdate};

/// A single rock / paper / scissors choice.
///
/// Wire names are capitalized; `"Scissor"` (singular) is what servers send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pick {
    Rock,
    Paper,
    #[serde(rename = "Scissor", alias = "Scissors")]
    Scissor,
}

impl Pick {
    /// All picks, in wire order.
    pub const ALL: [Pick; 3] = [Pick::Rock, Pick::Paper, Pick::Scissor];

    /// Returns the exact string used for this pick on the wire.
    pub fn as_wire_str(&self) -> &'static str {
        match self {
            Self::Rock => "Rock",
            Self::Paper => "Paper",
            Self::Scissor => "Scissor",
        }
    }

    /// Returns `true` if `self` wins against `other`.
    pub fn beats(&self, other: Pick) -> bool {
        matches!(
            (self, other),
            (Self::Rock, Self::Scissor) | (Self::Paper, Self::Rock) | (Self::Scissor, Self::Paper)
        )
    }
}

impl fmt::Display for Pick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire_str())
    }
}

impl FromStr for Pick {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "Rock" => Ok(Self::Rock),
            "Paper" => Ok(Self::Paper),
            "Scissor" | "Scissors" => Ok(Self::Scissor),
            other => Err(SessionError::decode(format!("unknown pick {other:?}"))),
        }
    }
}

/// Marker type selecting the rock / paper / scissors rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RockPaperScissors;

impl GameRules for RockPaperScissors {
    type Submission = Pick;
    type RoundConfig = ();
    type Contribution = Pick;

    const NAME: &'static str = "rock-paper-scissors";
    const SUBMIT_KIND: MessageKind = MessageKind::Game;
    const REPLAY_KIND: MessageKind = MessageKind::Reset;
    const RESET_IS_REPLAY: bool = true;

    fn encode_submission(submission: &Pick) -> String {
        submission.as_wire_str().to_string()
    }

    fn decode_submission(text: &str) -> Result<Pick> {
        text.parse()
    }

    fn interpret_game(text: &str) -> Result<GameUpdate<Self>> {
        text.parse().map(GameUpdate::OpponentContribution)
    }
}
