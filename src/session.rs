//! The observable session cell and its lifecycle bindings.
//!
//! [`SessionStore`] owns the single [`SessionState`] of one session inside a
//! [`tokio::sync::watch`] channel. It turns the three transport lifecycle
//! signals (opened, closed, frame received) into state transitions, and it
//! applies the optimistic half of the two user commands.
//!
//! The store performs no I/O. [`GameSessionClient`](crate::client::GameSessionClient)
//! drives it from its transport loop, but it can equally be driven by hand:
//!
//! ```
//! use duel_session_client::games::NumberGuesser;
//! use duel_session_client::session::SessionStore;
//!
//! let store = SessionStore::<NumberGuesser>::new();
//! store.on_open();
//! store.on_frame(r#"{"type":"OPPONENT","text":"bob"}"#).unwrap();
//! assert_eq!(store.snapshot().opponent_id, "bob");
//!
//! let frame = store.submit_turn(42).unwrap().encode().unwrap();
//! assert_eq!(frame, r#"{"type":"PLAYER_TURN","text":"42"}"#);
//! ```

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::error::{Result, SessionError};
use crate::protocol::{Envelope, MessageKind};
use crate::reducer::reduce;
use crate::rules::GameRules;
use crate::state::{ConnectionStatus, SessionState};

/// Holder of one session's state.
///
/// Every transition replaces the whole snapshot under the channel's write
/// lock, so subscribers never observe a half-applied update. Subscribers are
/// notified on every replacement with the full snapshot.
#[derive(Debug)]
pub struct SessionStore<G: GameRules> {
    tx: watch::Sender<SessionState<G>>,
}

impl<G: GameRules> Default for SessionStore<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: GameRules> SessionStore<G> {
    /// Create a store holding the neutral state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::default());
        Self { tx }
    }

    /// A clone of the current snapshot.
    pub fn snapshot(&self) -> SessionState<G> {
        self.tx.borrow().clone()
    }

    /// Register a subscriber. The receiver starts at the current snapshot.
    pub fn subscribe(&self) -> watch::Receiver<SessionState<G>> {
        self.tx.subscribe()
    }

    /// Returns `true` between `on_open` and the next `on_close`.
    pub fn is_connected(&self) -> bool {
        self.tx.borrow().is_connected()
    }

    // ── Lifecycle ───────────────────────────────────────────────────

    /// The transport opened. Nothing is sent; the server drives the session.
    pub fn on_open(&self) {
        self.replace(|state| {
            state.connection = ConnectionStatus::Connected;
        });
        debug!(game = G::NAME, "session connected");
    }

    /// The transport closed. The whole session is invalidated.
    pub fn on_close(&self) {
        self.tx.send_replace(SessionState::default());
        debug!(game = G::NAME, "session reset after close");
    }

    /// A text frame arrived.
    ///
    /// Returns the kind of the applied envelope.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::ProtocolDecode`] if the frame is not a valid
    /// envelope or its payload is unusable. The state is left untouched.
    pub fn on_frame(&self, frame: &str) -> Result<MessageKind> {
        let envelope = Envelope::decode(frame)?;
        self.apply(&envelope)?;
        Ok(envelope.kind)
    }

    /// Run the reducer for an already decoded envelope.
    ///
    /// # Errors
    ///
    /// Returns the reducer's error; the state is left untouched.
    pub fn apply(&self, envelope: &Envelope) -> Result<()> {
        if envelope.kind == MessageKind::Unknown {
            debug!(text = %envelope.text, "ignoring message of unknown kind");
        }
        let mut outcome = Ok(());
        self.tx.send_if_modified(|state| match reduce(state, envelope) {
            Ok(next) => {
                *state = next;
                true
            }
            Err(e) => {
                outcome = Err(e);
                false
            }
        });
        if let Err(e) = &outcome {
            warn!(kind = %envelope.kind, error = %e, "inbound message skipped");
        }
        outcome
    }

    // ── Commands ────────────────────────────────────────────────────

    /// Commit the local player's choice and build the frame announcing it.
    ///
    /// Sets `local_submission` and clears the timer and advisory texts before
    /// the server has acknowledged anything.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::TransportNotReady`] if the session is not
    /// connected; nothing is changed in that case.
    pub fn submit_turn(&self, submission: G::Submission) -> Result<Envelope> {
        let envelope = Envelope::new(G::SUBMIT_KIND, G::encode_submission(&submission));
        self.command(move |state| {
            state.local_submission = Some(submission);
            state.turn_timer = None;
            state.info_text.clear();
            state.modal_text.clear();
        })?;
        Ok(envelope)
    }

    /// Clear the round-local fields and build the replay request frame.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::TransportNotReady`] if the session is not
    /// connected; nothing is changed in that case.
    pub fn request_replay(&self) -> Result<Envelope> {
        self.command(|state| {
            state.local_submission = None;
            state.turn_timer = None;
            state.info_text.clear();
            state.modal_text.clear();
            state.round_config = G::RoundConfig::default();
        })?;
        Ok(Envelope::new(G::REPLAY_KIND, ""))
    }

    /// Undo an unacknowledged optimistic submission.
    pub fn roll_back_submission(&self) {
        self.tx.send_if_modified(|state| {
            if state.local_submission.is_none() {
                return false;
            }
            let mut next = state.clone();
            next.local_submission = None;
            *state = next;
            true
        });
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn replace(&self, edit: impl FnOnce(&mut SessionState<G>)) {
        self.tx.send_modify(|state| {
            let mut next = state.clone();
            edit(&mut next);
            *state = next;
        });
    }

    fn command(&self, edit: impl FnOnce(&mut SessionState<G>)) -> Result<()> {
        let applied = self.tx.send_if_modified(|state| {
            if !state.is_connected() {
                return false;
            }
            let mut next = state.clone();
            edit(&mut next);
            *state = next;
            true
        });
        if applied {
            Ok(())
        } else {
            Err(SessionError::TransportNotReady)
        }
    }
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

    fn connected<G: GameRules>() -> SessionStore<G> {
        let store = SessionStore::new();
        store.on_open();
        store
    }

    #[test]
    fn open_and_close_toggle_connection() {
        let store = SessionStore::<NumberGuesser>::new();
        assert!(!store.is_connected());
        store.on_open();
        assert!(store.is_connected());
        store.on_frame(r#"{"type":"OPPONENT","text":"bob"}"#).unwrap();
        store.on_close();
        assert_eq!(store.snapshot(), SessionState::default());
    }

    #[test]
    fn malformed_frame_leaves_state_untouched() {
        let store = connected::<NumberGuesser>();
        store.on_frame(r#"{"type":"INFO","text":"hello"}"#).unwrap();
        let before = store.snapshot();
        for frame in ["{", r#"{"type":"GAME","text":"x-y"}"#, r#"{"type":"RESULT","text":"bob"}"#] {
            assert!(store.on_frame(frame).unwrap_err().is_decode());
        }
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn unknown_kind_is_not_an_error() {
        let store = connected::<NumberGuesser>();
        let before = store.snapshot();
        let kind = store.on_frame(r#"{"type":"LEADERBOARD","text":""}"#).unwrap();
        assert_eq!(kind, MessageKind::Unknown);
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn submit_applies_optimistic_update() {
        let store = connected::<NumberGuesser>();
        store.on_frame(r#"{"type":"TIMER","text":"7"}"#).unwrap();
        store.on_frame(r#"{"type":"MODAL-INFO","text":"hurry"}"#).unwrap();

        let envelope = store.submit_turn(17).unwrap();
        assert_eq!(envelope.kind, MessageKind::PlayerTurn);
        assert_eq!(NumberGuesser::decode_submission(&envelope.text).unwrap(), 17);

        let state = store.snapshot();
        assert_eq!(state.local_submission, Some(17));
        assert!(state.turn_timer.is_none());
        assert!(state.modal_text.is_empty());
    }

    #[test]
    fn commands_need_a_connection() {
        let store = SessionStore::<RockPaperScissors>::new();
        assert!(matches!(
            store.submit_turn(Pick::Rock),
            Err(SessionError::TransportNotReady)
        ));
        assert!(matches!(
            store.request_replay(),
            Err(SessionError::TransportNotReady)
        ));
        assert_eq!(store.snapshot(), SessionState::default());
    }

    #[test]
    fn replay_request_clears_round_fields() {
        let store = connected::<NumberGuesser>();
        store.on_frame(r#"{"type":"GAME","text":"1-50"}"#).unwrap();
        store.submit_turn(20).unwrap();
        store.on_frame(r#"{"type":"INFO","text":"too low"}"#).unwrap();

        let envelope = store.request_replay().unwrap();
        assert_eq!(envelope, Envelope::new(MessageKind::Replay, ""));
        let state = store.snapshot();
        assert!(state.local_submission.is_none());
        assert!(state.info_text.is_empty());
        assert_eq!(state.round_config, GuessRange::default());
        assert!(state.is_connected());
    }

    #[test]
    fn legacy_game_uses_legacy_kinds() {
        let store = connected::<RockPaperScissors>();
        let submit = store.submit_turn(Pick::Scissor).unwrap();
        assert_eq!(submit.encode().unwrap(), r#"{"type":"GAME","text":"Scissor"}"#);
        let replay = store.request_replay().unwrap();
        assert_eq!(replay.encode().unwrap(), r#"{"type":"RESET","text":""}"#);
    }

    #[test]
    fn rollback_clears_submission() {
        let store = connected::<NumberGuesser>();
        store.submit_turn(3).unwrap();
        store.roll_back_submission();
        assert!(store.snapshot().local_submission.is_none());
    }

    #[test]
    fn subscribers_see_every_replacement() {
        let store = connected::<NumberGuesser>();
        let mut rx = store.subscribe();
        assert!(!rx.has_changed().unwrap());

        store.on_frame(r#"{"type":"OPPONENT","text":"bob"}"#).unwrap();
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().opponent_id, "bob");

        let _ = store.on_frame("garbage");
        assert!(!rx.has_changed().unwrap());

        store.on_close();
        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().is_connected());
    }
}
