#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::indexing_slicing,
    dead_code
)]
//! Shared test utilities for duel session client integration tests.
//!
//! Provides a channel-driven [`MockTransport`] whose inbound frames are pushed
//! by the test while the session runs, plus helpers for building server
//! frames.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use async_trait::async_trait;
use duel_session_client::protocol::{Envelope, GameBoard, MessageKind, RoundData, Scores};
use duel_session_client::{SessionError, Transport};
use serde::Serialize;
use tokio::sync::mpsc;

// ── MockTransport ───────────────────────────────────────────────────

/// A mock transport driven by the test through a [`ServerSide`] handle.
pub struct MockTransport {
    /// Frames pushed by the test (`None` = clean close).
    incoming: mpsc::UnboundedReceiver<Option<Result<String, SessionError>>>,
    /// Recorded outgoing frames from the client.
    sent: Arc<StdMutex<Vec<String>>>,
    /// Whether `close()` has been called.
    closed: Arc<AtomicBool>,
}

/// The test's view of the server end of a [`MockTransport`].
pub struct ServerSide {
    tx: mpsc::UnboundedSender<Option<Result<String, SessionError>>>,
    pub sent: Arc<StdMutex<Vec<String>>>,
    pub closed: Arc<AtomicBool>,
}

impl MockTransport {
    pub fn new() -> (Self, ServerSide) {
        let (tx, incoming) = mpsc::unbounded_channel();
        let sent = Arc::new(StdMutex::new(Vec::new()));
        let closed = Arc::new(AtomicBool::new(false));
        let transport = Self {
            incoming,
            sent: Arc::clone(&sent),
            closed: Arc::clone(&closed),
        };
        (transport, ServerSide { tx, sent, closed })
    }
}

impl ServerSide {
    /// Deliver one raw text frame to the client.
    pub fn push(&self, frame: impl Into<String>) {
        self.tx.send(Some(Ok(frame.into()))).unwrap();
    }

    /// Deliver a transport-level receive error.
    pub fn fail(&self, reason: &str) {
        self.tx
            .send(Some(Err(SessionError::TransportReceive(reason.into()))))
            .unwrap();
    }

    /// Close the connection from the server side.
    pub fn hang_up(&self) {
        self.tx.send(None).unwrap();
    }

    /// Every frame the client has sent so far, decoded.
    pub fn sent_envelopes(&self) -> Vec<Envelope> {
        self.sent
            .lock()
            .unwrap()
            .iter()
            .map(|frame| Envelope::decode(frame).unwrap())
            .collect()
    }

    /// Wait until the client has sent at least `count` frames.
    pub async fn wait_for_sent(&self, count: usize) -> Vec<Envelope> {
        tokio::time::timeout(std::time::Duration::from_secs(2), async {
            while self.sent.lock().unwrap().len() < count {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("client never sent {count} frames"));
        self.sent_envelopes()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, message: String) -> Result<(), SessionError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    async fn recv(&mut self) -> Option<Result<String, SessionError>> {
        match self.incoming.recv().await {
            Some(item) => item,
            // Test dropped its ServerSide; hang until shutdown.
            None => std::future::pending().await,
        }
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        self.closed.store(true, Ordering::Relaxed);
        Ok(())
    }
}

// ── Frame helpers ───────────────────────────────────────────────────

/// JSON text frame for an envelope without data.
pub fn frame(kind: MessageKind, text: &str) -> String {
    Envelope::new(kind, text).encode().unwrap()
}

/// JSON text frame for a `RESULT` with a flat board and a score table.
pub fn result_frame<C: Serialize + Clone>(
    winner: &str,
    board: &[(&str, C)],
    scores: &[(&str, i64)],
) -> String {
    let data = RoundData {
        game: GameBoard {
            target: None,
            players: board
                .iter()
                .map(|(id, c)| ((*id).to_string(), c.clone()))
                .collect(),
        },
        score: Some(score_table(scores)),
    };
    Envelope::with_data(MessageKind::Result, winner, data.to_value().unwrap())
        .encode()
        .unwrap()
}

pub fn score_table(entries: &[(&str, i64)]) -> Scores {
    entries.iter().map(|(id, s)| ((*id).to_string(), *s)).collect()
}

/// Install a test subscriber once. Honors `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_test_writer()
        .try_init();
}
