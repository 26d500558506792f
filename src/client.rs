//! Async client that binds a [`SessionStore`] to a [`Transport`].
//!
//! [`GameSessionClient`] is a thin handle that communicates with a background
//! transport loop task via an unbounded MPSC channel. State snapshots are
//! observed through a [`tokio::sync::watch::Receiver`]; recoverable errors are
//! reported on a bounded channel returned from [`GameSessionClient::start`].
//!
//! # Example
//!
//! ```rust,ignore
//! let transport = WebSocketTransport::connect("ws://localhost:3000/ws").await?;
//! let (client, mut errors) = NumberGuesserClient::start(transport, SessionConfig::new());
//! let mut state = client.subscribe();
//!
//! while state.changed().await.is_ok() {
//!     let snapshot = state.borrow_and_update().clone();
//!     if snapshot.round_config.is_set() && snapshot.local_submission.is_none() {
//!         client.submit_turn(snapshot.round_config.min)?;
//!     }
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, watch};
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::error::{Result, SessionError};
use crate::games::{NumberGuesser, RockPaperScissors};
use crate::policy::{acknowledges_submission, NoAckTimeout, SubmissionPolicy, TimeoutAction};
use crate::protocol::Envelope;
use crate::rules::GameRules;
use crate::session::SessionStore;
use crate::state::SessionState;
use crate::transport::Transport;

/// Default capacity of the bounded error channel.
const DEFAULT_ERROR_CHANNEL_CAPACITY: usize = 64;

/// Default timeout for the graceful shutdown.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(1);

/// Client for the number guessing game.
pub type NumberGuesserClient = GameSessionClient<NumberGuesser>;

/// Client for rock / paper / scissors.
pub type RockPaperScissorsClient = GameSessionClient<RockPaperScissors>;

// ── Configuration ───────────────────────────────────────────────────

/// Configuration for a [`GameSessionClient`].
///
/// # Example
///
/// ```
/// use duel_session_client::client::SessionConfig;
/// use duel_session_client::policy::RetryThenRollback;
/// use std::time::Duration;
///
/// let config = SessionConfig::new()
///     .with_error_channel_capacity(16)
///     .with_shutdown_timeout(Duration::from_secs(5))
///     .with_submission_policy(RetryThenRollback::new(Duration::from_secs(2), 3));
/// assert_eq!(config.error_channel_capacity, 16);
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Capacity of the bounded error channel.
    ///
    /// When the host does not drain errors fast enough, further errors are
    /// dropped (with a warning logged) so the transport loop never blocks.
    ///
    /// Defaults to **64**. Values below 1 are clamped to 1.
    pub error_channel_capacity: usize,
    /// Timeout for the graceful shutdown.
    ///
    /// Defaults to **1 second**. A zero timeout aborts the transport loop
    /// immediately.
    pub shutdown_timeout: Duration,
    /// Acknowledgement policy for optimistic submissions.
    ///
    /// Defaults to [`NoAckTimeout`].
    pub submission_policy: Arc<dyn SubmissionPolicy>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self {
            error_channel_capacity: DEFAULT_ERROR_CHANNEL_CAPACITY,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            submission_policy: Arc::new(NoAckTimeout),
        }
    }

    /// Set the capacity of the bounded error channel. Clamped to at least 1.
    #[must_use]
    pub fn with_error_channel_capacity(mut self, capacity: usize) -> Self {
        self.error_channel_capacity = capacity.max(1);
        self
    }

    /// Set the timeout for the graceful shutdown.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Set the acknowledgement policy for optimistic submissions.
    #[must_use]
    pub fn with_submission_policy(mut self, policy: impl SubmissionPolicy) -> Self {
        self.submission_policy = Arc::new(policy);
        self
    }
}

// ── Outbound commands ───────────────────────────────────────────────

/// A frame queued by the handle for the transport loop.
#[derive(Debug)]
enum Outbound {
    Submission(Envelope),
    Replay(Envelope),
}

/// A submission that has been sent but not yet answered.
struct PendingSubmission {
    envelope: Envelope,
    attempt: u32,
    deadline: Option<Instant>,
}

impl PendingSubmission {
    /// A timeout too large to represent as an instant means no deadline.
    fn arm(envelope: Envelope, attempt: u32, policy: &dyn SubmissionPolicy) -> Self {
        let deadline = policy.ack_timeout(attempt).and_then(|t| {
            let deadline = Instant::now().checked_add(t);
            if deadline.is_none() {
                debug!(attempt, "acknowledgement timeout out of range, waiting without deadline");
            }
            deadline
        });
        Self {
            envelope,
            attempt,
            deadline,
        }
    }
}

// ── Client handle ───────────────────────────────────────────────────

/// Async client handle for one game session.
///
/// Created via [`GameSessionClient::start`], which spawns a background
/// transport loop and returns this handle together with an error receiver.
///
/// Commands apply their optimistic state change synchronously and queue the
/// frame for the transport loop. They return immediately (no round-trip
/// await).
pub struct GameSessionClient<G: GameRules> {
    /// Sender half of the command channel to the transport loop.
    cmd_tx: mpsc::UnboundedSender<Outbound>,
    /// Session state shared with the transport loop.
    store: Arc<SessionStore<G>>,
    /// Handle to the background transport loop task.
    task: Option<tokio::task::JoinHandle<()>>,
    /// Oneshot sender to signal the transport loop to shut down gracefully.
    shutdown_tx: Option<oneshot::Sender<()>>,
    /// Timeout for the graceful shutdown.
    shutdown_timeout: Duration,
}

impl<G: GameRules> GameSessionClient<G> {
    /// Bind a connected transport and start the session.
    ///
    /// Handing over the transport is the *opened* signal: the state becomes
    /// `Connected` before this returns. The transport is moved into the loop,
    /// so it can be bound to exactly one session.
    ///
    /// # Returns
    ///
    /// A tuple of `(client_handle, error_receiver)`. The error receiver yields
    /// [`SessionError`]s that were recovered locally (malformed frames,
    /// transport failures, submission timeouts).
    #[must_use = "the error receiver must be used to observe session errors"]
    pub fn start(transport: impl Transport, config: SessionConfig) -> (Self, mpsc::Receiver<SessionError>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<Outbound>();
        // Clamp capacity to at least 1 (tokio panics on 0).
        let capacity = config.error_channel_capacity.max(1);
        let (error_tx, error_rx) = mpsc::channel::<SessionError>(capacity);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let store = Arc::new(SessionStore::new());
        store.on_open();

        let task = tokio::spawn(transport_loop(
            transport,
            cmd_rx,
            error_tx,
            Arc::clone(&store),
            shutdown_rx,
            config.submission_policy,
        ));

        let client = Self {
            cmd_tx,
            store,
            task: Some(task),
            shutdown_tx: Some(shutdown_tx),
            shutdown_timeout: config.shutdown_timeout,
        };

        (client, error_rx)
    }

    // ── Public API methods ──────────────────────────────────────────

    /// Submit the local player's choice for the current round.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::TransportNotReady`] if the session is not
    /// connected. Nothing is changed or sent in that case.
    pub fn submit_turn(&self, submission: G::Submission) -> Result<()> {
        self.ensure_loop_alive()?;
        let envelope = self.store.submit_turn(submission)?;
        self.queue(Outbound::Submission(envelope))
    }

    /// Ask the server for another round.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::TransportNotReady`] if the session is not
    /// connected. Nothing is changed or sent in that case.
    pub fn request_replay(&self) -> Result<()> {
        self.ensure_loop_alive()?;
        let envelope = self.store.request_replay()?;
        self.queue(Outbound::Replay(envelope))
    }

    /// Shut down the session, closing the transport and stopping the
    /// background task. The state is reset to neutral afterwards.
    pub async fn shutdown(&mut self) {
        debug!("GameSessionClient: shutdown requested");

        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }

        // Await the transport loop with a timeout. If it doesn't exit in time,
        // abort it so the task cannot detach and run indefinitely.
        if let Some(mut task) = self.task.take() {
            match tokio::time::timeout(self.shutdown_timeout, &mut task).await {
                Ok(Ok(())) => {}
                Ok(Err(join_err)) => {
                    warn!("transport loop terminated with join error: {join_err}");
                }
                Err(_) => {
                    warn!("transport loop did not exit within timeout; aborting task");
                    task.abort();
                    if let Err(join_err) = task.await {
                        debug!("transport loop aborted: {join_err}");
                    }
                }
            }
        }

        if self.store.is_connected() {
            self.store.on_close();
        }
    }

    // ── State accessors ─────────────────────────────────────────────

    /// A clone of the current snapshot.
    pub fn state(&self) -> SessionState<G> {
        self.store.snapshot()
    }

    /// Register a subscriber notified on every state replacement.
    pub fn subscribe(&self) -> watch::Receiver<SessionState<G>> {
        self.store.subscribe()
    }

    /// Returns `true` while the transport is open.
    pub fn is_connected(&self) -> bool {
        self.store.is_connected()
    }

    // ── Internal helpers ────────────────────────────────────────────

    fn ensure_loop_alive(&self) -> Result<()> {
        if self.cmd_tx.is_closed() {
            return Err(SessionError::TransportNotReady);
        }
        Ok(())
    }

    fn queue(&self, outbound: Outbound) -> Result<()> {
        self.cmd_tx
            .send(outbound)
            .map_err(|_| SessionError::TransportNotReady)
    }
}

impl<G: GameRules> std::fmt::Debug for GameSessionClient<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSessionClient")
            .field("game", &G::NAME)
            .field("connected", &self.is_connected())
            .field("has_task", &self.task.is_some())
            .finish()
    }
}

impl<G: GameRules> Drop for GameSessionClient<G> {
    fn drop(&mut self) {
        // `Drop` is synchronous so we cannot await a graceful shutdown; abort
        // the task and publish the closed state for remaining subscribers.
        if let Some(task) = self.task.take() {
            task.abort();
            self.store.on_close();
        }
    }
}

// ── Transport loop ──────────────────────────────────────────────────

/// Background transport loop that multiplexes send/receive via `tokio::select!`.
///
/// Exits when:
/// - The command channel closes (client handle dropped)
/// - The shutdown signal fires
/// - The transport returns `None` (server closed connection)
/// - A transport error occurs
///
/// Every exit path resets the session state.
async fn transport_loop<G: GameRules>(
    mut transport: impl Transport,
    mut cmd_rx: mpsc::UnboundedReceiver<Outbound>,
    error_tx: mpsc::Sender<SessionError>,
    store: Arc<SessionStore<G>>,
    mut shutdown_rx: oneshot::Receiver<()>,
    policy: Arc<dyn SubmissionPolicy>,
) {
    debug!(game = G::NAME, "transport loop started");

    let mut pending: Option<PendingSubmission> = None;

    loop {
        let deadline = pending.as_ref().and_then(|p| p.deadline);

        tokio::select! {
            // Queued commands go first so a submission is armed before any
            // reply to it is read.
            biased;

            // Branch 1: outgoing command from the client handle
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(Outbound::Submission(envelope)) => {
                        if let Err(e) = send_envelope(&mut transport, &envelope).await {
                            fail(&error_tx, &store, e).await;
                            break;
                        }
                        pending = Some(PendingSubmission::arm(envelope, 1, policy.as_ref()));
                    }
                    Some(Outbound::Replay(envelope)) => {
                        pending = None;
                        if let Err(e) = send_envelope(&mut transport, &envelope).await {
                            fail(&error_tx, &store, e).await;
                            break;
                        }
                    }
                    // Command channel closed: client handle dropped.
                    None => {
                        debug!("command channel closed, shutting down transport loop");
                        let _ = transport.close().await;
                        store.on_close();
                        break;
                    }
                }
            }

            // Branch 2: shutdown signal
            _ = &mut shutdown_rx => {
                debug!("shutdown signal received");
                let _ = transport.close().await;
                store.on_close();
                break;
            }

            // Branch 3: incoming frame from the server
            incoming = transport.recv() => {
                match incoming {
                    Some(Ok(text)) => match store.on_frame(&text) {
                        Ok(kind) => {
                            if pending.is_some() && acknowledges_submission(kind) {
                                debug!(%kind, "pending submission acknowledged");
                                pending = None;
                            }
                        }
                        Err(e) => {
                            debug!(raw = %text, "skipping inbound frame: {e}");
                            report(&error_tx, e);
                        }
                    },
                    Some(Err(e)) => {
                        error!("transport receive error: {e}");
                        fail(&error_tx, &store, e).await;
                        break;
                    }
                    // Transport closed cleanly.
                    None => {
                        debug!("transport closed by server");
                        store.on_close();
                        break;
                    }
                }
            }

            // Branch 4: pending submission deadline
            () = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                let Some(expired) = pending.take() else {
                    continue;
                };
                match policy.on_timeout(expired.attempt) {
                    TimeoutAction::Resend => {
                        let attempt = expired.attempt.saturating_add(1);
                        debug!(attempt, "resending unacknowledged submission");
                        if let Err(e) = send_envelope(&mut transport, &expired.envelope).await {
                            fail(&error_tx, &store, e).await;
                            break;
                        }
                        pending = Some(PendingSubmission::arm(expired.envelope, attempt, policy.as_ref()));
                    }
                    TimeoutAction::Rollback => {
                        warn!(attempts = expired.attempt, "submission not acknowledged, rolling back");
                        store.roll_back_submission();
                        report(&error_tx, SessionError::SubmissionTimedOut { attempts: expired.attempt });
                    }
                    TimeoutAction::Keep => {
                        warn!(attempts = expired.attempt, "submission not acknowledged");
                        report(&error_tx, SessionError::SubmissionTimedOut { attempts: expired.attempt });
                    }
                }
            }
        }
    }

    debug!("transport loop exited");
}

/// Serialize and send one envelope.
async fn send_envelope(transport: &mut impl Transport, envelope: &Envelope) -> Result<()> {
    let frame = envelope.encode()?;
    debug!(kind = %envelope.kind, "sending frame");
    transport.send(frame).await
}

/// Report a recoverable error. If the channel is full, log a warning and drop
/// the error to avoid blocking the transport loop.
fn report(error_tx: &mpsc::Sender<SessionError>, err: SessionError) {
    match error_tx.try_send(err) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(dropped)) => {
            warn!("error channel full, dropping error: {dropped}");
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            debug!("error channel closed, receiver dropped");
        }
    }
}

/// Report a transport failure and end the session.
///
/// Uses `send().await` instead of `try_send` because this is always the last
/// error of a session and must not be silently dropped.
async fn fail<G: GameRules>(error_tx: &mpsc::Sender<SessionError>, store: &SessionStore<G>, err: SessionError) {
    store.on_close();
    if error_tx.send(err).await.is_err() {
        debug!("error channel closed, receiver dropped");
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing
)]
mod tests {
    use super::*;
    use crate::games::Pick;
    use crate::policy::RetryThenRollback;
    use crate::protocol::MessageKind;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex as StdMutex;

    // ── Mock transport ──────────────────────────────────────────────

    /// A mock transport that records sent frames and replays scripted ones.
    struct MockTransport {
        incoming: VecDeque<Option<Result<String>>>,
        sent: Arc<StdMutex<Vec<String>>>,
        closed: Arc<AtomicBool>,
    }

    impl MockTransport {
        fn new(incoming: Vec<Option<Result<String>>>) -> (Self, Arc<StdMutex<Vec<String>>>, Arc<AtomicBool>) {
            let sent = Arc::new(StdMutex::new(Vec::new()));
            let closed = Arc::new(AtomicBool::new(false));
            let transport = Self {
                incoming: VecDeque::from(incoming),
                sent: Arc::clone(&sent),
                closed: Arc::clone(&closed),
            };
            (transport, sent, closed)
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&mut self, message: String) -> Result<()> {
            self.sent.lock().unwrap().push(message);
            Ok(())
        }

        async fn recv(&mut self) -> Option<Result<String>> {
            if let Some(item) = self.incoming.pop_front() {
                item
            } else {
                // All scripted frames delivered; hang so the loop stays alive.
                std::future::pending().await
            }
        }

        async fn close(&mut self) -> Result<()> {
            self.closed.store(true, Ordering::Relaxed);
            Ok(())
        }
    }

    /// Transport whose `send` always fails.
    struct BrokenSendTransport;

    #[async_trait]
    impl Transport for BrokenSendTransport {
        async fn send(&mut self, _message: String) -> Result<()> {
            Err(SessionError::TransportSend("broken pipe".into()))
        }

        async fn recv(&mut self) -> Option<Result<String>> {
            std::future::pending().await
        }

        async fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn frame(kind: &str, text: &str) -> Option<Result<String>> {
        Some(Ok(format!(r#"{{"type":"{kind}","text":"{text}"}}"#)))
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    // ── Tests ───────────────────────────────────────────────────────

    #[tokio::test]
    async fn start_marks_session_connected() {
        let (transport, sent, _closed) = MockTransport::new(vec![]);
        let (mut client, _errors) = NumberGuesserClient::start(transport, SessionConfig::new());

        assert!(client.is_connected());
        settle().await;
        assert!(sent.lock().unwrap().is_empty(), "nothing is sent on open");

        client.shutdown().await;
        assert!(!client.is_connected());
    }

    #[tokio::test]
    async fn inbound_frames_update_state() {
        let (transport, _sent, _closed) =
            MockTransport::new(vec![frame("OPPONENT", "bob"), frame("GAME", "1-100")]);
        let (mut client, _errors) = NumberGuesserClient::start(transport, SessionConfig::new());

        settle().await;
        let state = client.state();
        assert_eq!(state.opponent_id, "bob");
        assert_eq!(state.round_config.max, 100);

        client.shutdown().await;
    }

    #[tokio::test]
    async fn submit_turn_sends_player_turn() {
        let (transport, sent, _closed) = MockTransport::new(vec![]);
        let (mut client, _errors) = NumberGuesserClient::start(transport, SessionConfig::new());

        client.submit_turn(42).unwrap();
        assert_eq!(client.state().local_submission, Some(42));

        settle().await;
        {
            let messages = sent.lock().unwrap();
            let sent: Envelope = serde_json::from_str(&messages[0]).unwrap();
            assert_eq!(sent.kind, MessageKind::PlayerTurn);
            assert_eq!(NumberGuesser::decode_submission(&sent.text).unwrap(), 42);
        }

        client.shutdown().await;
    }

    #[tokio::test]
    async fn request_replay_sends_reset_for_legacy_game() {
        let (transport, sent, _closed) = MockTransport::new(vec![]);
        let (mut client, _errors) = RockPaperScissorsClient::start(transport, SessionConfig::new());

        client.submit_turn(Pick::Rock).unwrap();
        client.request_replay().unwrap();
        settle().await;

        {
            let messages = sent.lock().unwrap();
            assert_eq!(messages[0], r#"{"type":"GAME","text":"Rock"}"#);
            assert_eq!(messages[1], r#"{"type":"RESET","text":""}"#);
        }
        assert!(client.state().local_submission.is_none());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn server_close_resets_state() {
        let (transport, _sent, _closed) = MockTransport::new(vec![
            frame("OPPONENT", "bob"),
            frame("INFO", "welcome"),
            None,
        ]);
        let (mut client, _errors) = NumberGuesserClient::start(transport, SessionConfig::new());

        settle().await;
        assert_eq!(client.state(), SessionState::default());
        assert!(matches!(
            client.submit_turn(1),
            Err(SessionError::TransportNotReady)
        ));

        client.shutdown().await;
    }

    #[tokio::test]
    async fn malformed_frame_is_reported_and_skipped() {
        let (transport, _sent, _closed) = MockTransport::new(vec![
            frame("OPPONENT", "bob"),
            Some(Ok("{not json".into())),
            frame("TIMER", "5"),
        ]);
        let (mut client, mut errors) = NumberGuesserClient::start(transport, SessionConfig::new());

        let err = errors.recv().await.unwrap();
        assert!(err.is_decode());
        settle().await;

        let state = client.state();
        assert_eq!(state.opponent_id, "bob");
        assert_eq!(state.turn_timer.as_deref(), Some("5"));
        assert!(client.is_connected());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn receive_error_ends_session() {
        let (transport, _sent, _closed) = MockTransport::new(vec![
            frame("OPPONENT", "bob"),
            Some(Err(SessionError::TransportReceive("reset by peer".into()))),
        ]);
        let (mut client, mut errors) = NumberGuesserClient::start(transport, SessionConfig::new());

        let err = errors.recv().await.unwrap();
        assert!(matches!(err, SessionError::TransportReceive(_)));
        assert!(!client.is_connected());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn send_failure_ends_session() {
        let (mut client, mut errors) =
            NumberGuesserClient::start(BrokenSendTransport, SessionConfig::new());

        client.submit_turn(7).unwrap();
        let err = errors.recv().await.unwrap();
        assert!(matches!(err, SessionError::TransportSend(_)));
        assert_eq!(client.state(), SessionState::default());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_closes_transport() {
        let (transport, _sent, closed) = MockTransport::new(vec![]);
        let (mut client, _errors) = NumberGuesserClient::start(transport, SessionConfig::new());

        client.shutdown().await;
        assert!(closed.load(Ordering::Relaxed));
        assert!(matches!(
            client.request_replay(),
            Err(SessionError::TransportNotReady)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn unacknowledged_submission_is_resent_then_rolled_back() {
        let (transport, sent, _closed) = MockTransport::new(vec![]);
        let config = SessionConfig::new()
            .with_submission_policy(RetryThenRollback::new(Duration::from_secs(2), 2));
        let (mut client, mut errors) = NumberGuesserClient::start(transport, config);

        client.submit_turn(9).unwrap();

        let err = errors.recv().await.unwrap();
        assert!(matches!(err, SessionError::SubmissionTimedOut { attempts: 2 }));
        assert_eq!(sent.lock().unwrap().len(), 2);
        assert!(client.state().local_submission.is_none());
        assert!(client.is_connected());

        client.shutdown().await;
    }

    #[tokio::test]
    async fn unrepresentable_ack_timeout_waits_without_deadline() {
        let (transport, sent, _closed) = MockTransport::new(vec![]);
        let config = SessionConfig::new()
            .with_submission_policy(RetryThenRollback::new(Duration::MAX, 3));
        let (mut client, mut errors) = NumberGuesserClient::start(transport, config);

        client.submit_turn(5).unwrap();
        settle().await;
        assert!(client.is_connected());
        assert!(client.state().is_connected());
        assert!(errors.try_recv().is_err());

        client.submit_turn(6).unwrap();
        settle().await;
        assert_eq!(sent.lock().unwrap().len(), 2);
        assert_eq!(client.state().local_submission, Some(6));

        client.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn result_already_buffered_acknowledges_queued_submission() {
        let (transport, sent, _closed) = MockTransport::new(vec![Some(Ok(
            r#"{"type":"RESULT","text":"bob","data":{"game":{"bob":[9]},"score":{"bob":1}}}"#.into(),
        ))]);
        let config = SessionConfig::new()
            .with_submission_policy(RetryThenRollback::new(Duration::from_secs(2), 2));
        let (mut client, mut errors) = NumberGuesserClient::start(transport, config);

        // Queued before the loop first runs, while the result is already readable.
        client.submit_turn(9).unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert_eq!(sent.lock().unwrap().len(), 1, "acknowledged submission was resent");
        assert!(errors.try_recv().is_err());
        let state = client.state();
        assert!(state.round_finished);
        assert_eq!(state.local_submission, Some(9));

        client.shutdown().await;
    }

    #[tokio::test]
    async fn config_defaults() {
        let config = SessionConfig::new();
        assert_eq!(config.error_channel_capacity, 64);
        assert_eq!(config.shutdown_timeout, Duration::from_secs(1));
        assert_eq!(config.submission_policy.ack_timeout(1), None);
    }

    #[tokio::test]
    async fn error_channel_capacity_is_clamped_to_one() {
        let config = SessionConfig::new().with_error_channel_capacity(0);
        assert_eq!(config.error_channel_capacity, 1);
    }
}
