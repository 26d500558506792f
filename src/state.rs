//! The observable session snapshot.

use crate::protocol::{GameBoard, Scores};
use crate::rules::GameRules;

/// Whether the transport is currently open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connected,
}

/// Everything a UI needs to render one game session.
///
/// A snapshot is never edited in place once published: every transition
/// builds a new value that replaces the previous one wholesale.
/// [`SessionState::default`] is the neutral state used at construction and
/// after the transport closes.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState<G: GameRules> {
    /// Transport status.
    pub connection: ConnectionStatus,
    /// Countdown text, present only while the server runs a timer.
    pub turn_timer: Option<String>,
    /// True between a result and the next replay or opponent departure.
    pub round_finished: bool,
    /// The local player's committed choice for the round in progress.
    pub local_submission: Option<G::Submission>,
    /// Round parameters; `Default` when none are announced.
    pub round_config: G::RoundConfig,
    /// Per-player contributions from the last result.
    pub game_data: GameBoard<G::Contribution>,
    /// Cumulative scores of every player seen this session.
    pub scores: Scores,
    /// Current opponent, empty if none is assigned.
    pub opponent_id: String,
    /// The local seat, learned from result score tables. Empty until known.
    pub local_player_id: String,
    /// Winner of the most recent round, empty before any result.
    pub winner_id: String,
    /// Advisory info line.
    pub info_text: String,
    /// Advisory modal text.
    pub modal_text: String,
}

impl<G: GameRules> Default for SessionState<G> {
    fn default() -> Self {
        Self {
            connection: ConnectionStatus::Disconnected,
            turn_timer: None,
            round_finished: false,
            local_submission: None,
            round_config: G::RoundConfig::default(),
            game_data: GameBoard::default(),
            scores: Scores::new(),
            opponent_id: String::new(),
            local_player_id: String::new(),
            winner_id: String::new(),
            info_text: String::new(),
            modal_text: String::new(),
        }
    }
}

impl<G: GameRules> SessionState<G> {
    /// Returns `true` while the transport is open.
    pub fn is_connected(&self) -> bool {
        self.connection == ConnectionStatus::Connected
    }

    /// Returns `true` once an opponent has been assigned.
    pub fn has_opponent(&self) -> bool {
        !self.opponent_id.is_empty()
    }

    /// Score of the local seat, if it is known.
    pub fn local_score(&self) -> Option<i64> {
        self.scores.get(&self.local_player_id).copied()
    }

    /// Score of the current opponent, if any.
    pub fn opponent_score(&self) -> Option<i64> {
        self.scores.get(&self.opponent_id).copied()
    }

    /// Returns `true` if the local player won the last finished round.
    pub fn local_player_won(&self) -> bool {
        self.round_finished && !self.local_player_id.is_empty() && self.winner_id == self.local_player_id
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::games::{GuessRange, NumberGuesser, RockPaperScissors};

    #[test]
    fn default_is_neutral() {
        let state = SessionState::<NumberGuesser>::default();
        assert_eq!(state.connection, ConnectionStatus::Disconnected);
        assert!(!state.is_connected());
        assert!(state.turn_timer.is_none());
        assert!(!state.round_finished);
        assert!(state.local_submission.is_none());
        assert_eq!(state.round_config, GuessRange::default());
        assert!(state.game_data.is_empty());
        assert!(state.scores.is_empty());
        assert!(!state.has_opponent());
        assert!(state.winner_id.is_empty());
        assert!(state.info_text.is_empty());
        assert!(state.modal_text.is_empty());
    }

    #[test]
    fn score_lookups_follow_seats() {
        let mut state = SessionState::<RockPaperScissors>::default();
        state.opponent_id = "bob".into();
        state.local_player_id = "alice".into();
        state.scores.insert("bob".into(), 3);
        state.scores.insert("alice".into(), 1);
        assert_eq!(state.opponent_score(), Some(3));
        assert_eq!(state.local_score(), Some(1));
    }

    #[test]
    fn local_win_needs_a_finished_round() {
        let mut state = SessionState::<RockPaperScissors>::default();
        state.local_player_id = "alice".into();
        state.winner_id = "alice".into();
        assert!(!state.local_player_won());
        state.round_finished = true;
        assert!(state.local_player_won());
    }
}
