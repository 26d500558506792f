//! Per-game policy plugged into the generic reducer.
//!
//! Both games share one synchronization state machine. What differs between
//! them is captured by [`GameRules`]: the shape of a submission, of the round
//! configuration and of a player's per-round contribution, how an inbound
//! `GAME` message is interpreted, and which kinds the game sends.

use std::fmt::Debug;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;
use crate::protocol::MessageKind;

/// What an inbound `GAME` message means for a particular game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameUpdate<G: GameRules> {
    /// New round parameters from the server.
    RoundConfig(G::RoundConfig),
    /// The opponent's contribution, broadcast before the result.
    OpponentContribution(G::Contribution),
}

/// Game-specific policy for the session synchronizer.
///
/// Implementors are zero-sized marker types; all methods are associated
/// functions so that the reducer stays a pure function of state and message.
pub trait GameRules: Debug + Clone + PartialEq + Send + Sync + 'static {
    /// The local player's choice for a round.
    type Submission: Debug + Clone + PartialEq + Send + Sync + 'static;

    /// Round parameters announced by the server. `Default` is the neutral value.
    type RoundConfig: Debug + Clone + PartialEq + Default + Send + Sync + 'static;

    /// One player's per-round entry on the result board.
    type Contribution: Debug
        + Clone
        + PartialEq
        + Serialize
        + DeserializeOwned
        + Send
        + Sync
        + 'static;

    /// Short human-readable game name used in logs.
    const NAME: &'static str;

    /// Kind used when sending a submission.
    const SUBMIT_KIND: MessageKind;

    /// Kind used when requesting a replay.
    const REPLAY_KIND: MessageKind;

    /// Whether an inbound `RESET` is a legacy alias for `REPLAY`.
    const RESET_IS_REPLAY: bool = false;

    /// Render a submission as envelope text.
    fn encode_submission(submission: &Self::Submission) -> String;

    /// Parse envelope text back into a submission.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ProtocolDecode`](crate::SessionError::ProtocolDecode)
    /// if `text` is not a valid submission for this game.
    fn decode_submission(text: &str) -> Result<Self::Submission>;

    /// Interpret the text of an inbound `GAME` message.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ProtocolDecode`](crate::SessionError::ProtocolDecode)
    /// if the text cannot be understood; the reducer then leaves the state
    /// untouched.
    fn interpret_game(text: &str) -> Result<GameUpdate<Self>>;
}
