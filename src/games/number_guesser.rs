//! Numeric guessing game.
//!
//! The server announces an inclusive range as `GAME` text `"<min>-<max>"`,
//! each player answers with `PLAYER_TURN` carrying a decimal guess, and the
//! result board maps each player to their guess history.

use crate::error::{Result, SessionError};
use crate::protocol::MessageKind;
use crate::rules::{GameRules, GameUpdate};

/// Inclusive guess range for the current round.
///
/// The neutral value `{0, 0}` means no range has been announced.
///
/// ```
/// use duel_session_client::GuessRange;
///
/// let range = GuessRange::parse("-5-5").unwrap();
/// assert_eq!((range.min, range.max), (-5, 5));
/// assert!(range.is_set() && range.contains(0));
/// assert!(!GuessRange::default().is_set());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuessRange {
    /// Smallest valid guess.
    pub min: i64,
    /// Largest valid guess.
    pub max: i64,
}

impl GuessRange {
    /// Returns `true` if a range has been announced for this round.
    pub fn is_set(&self) -> bool {
        *self != Self::default()
    }

    /// Returns `true` if `guess` lies within the range.
    pub fn contains(&self, guess: i64) -> bool {
        (self.min..=self.max).contains(&guess)
    }

    /// Parse the `"<min>-<max>"` form used by the server.
    ///
    /// A leading minus sign on `min` is allowed, so `"-10-10"` is `[-10, 10]`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ProtocolDecode`] if either bound is missing or
    /// not an integer, or if `min > max`.
    pub fn parse(text: &str) -> Result<Self> {
        let text = text.trim();
        // Skip the first char so a negative `min` is not taken as the separator.
        let split_at = text
            .char_indices()
            .skip(1)
            .find(|&(_, c)| c == '-')
            .map(|(i, _)| i)
            .ok_or_else(|| SessionError::decode(format!("guess range {text:?} has no separator")))?;
        let (min, max) = text.split_at(split_at);
        let max = max.get(1..).unwrap_or_default();
        let min: i64 = min
            .trim()
            .parse()
            .map_err(|e| SessionError::decode(format!("guess range min {min:?}: {e}")))?;
        let max: i64 = max
            .trim()
            .parse()
            .map_err(|e| SessionError::decode(format!("guess range max {max:?}: {e}")))?;
        if min > max {
            return Err(SessionError::decode(format!(
                "guess range {min}-{max} is inverted"
            )));
        }
        Ok(Self { min, max })
    }
}

/// Marker type selecting the number guesser rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NumberGuesser;

impl GameRules for NumberGuesser {
    type Submission = i64;
    type RoundConfig = GuessRange;
    /// Every guess the player made this round, oldest first.
    type Contribution = Vec<i64>;

    const NAME: &'static str = "number-guesser";
    const SUBMIT_KIND: MessageKind = MessageKind::PlayerTurn;
    const REPLAY_KIND: MessageKind = MessageKind::Replay;

    fn encode_submission(submission: &i64) -> String {
        submission.to_string()
    }

    fn decode_submission(text: &str) -> Result<i64> {
        text.trim()
            .parse()
            .map_err(|e| SessionError::decode(format!("guess {text:?}: {e}")))
    }

    fn interpret_game(text: &str) -> Result<GameUpdate<Self>> {
        GuessRange::parse(text).map(GameUpdate::RoundConfig)
    }
}
