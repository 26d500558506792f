//! # Loopback Transport Example
//!
//! Shows how to implement the [`Transport`] trait with a simple in-process
//! loopback channel, then plays one round of rock / paper / scissors against
//! a scripted fake server. This is useful for:
//!
//! - **Testing**: exercise your UI against the session without a real server
//! - **Custom backends**: adapt any I/O layer (TCP, QUIC, WebRTC data channels)
//!
//! ## Running
//!
//! ```sh
//! cargo run --example loopback
//! ```

use async_trait::async_trait;
use duel_session_client::protocol::{Envelope, GameBoard, MessageKind, RoundData};
use duel_session_client::{Pick, RockPaperScissorsClient, SessionConfig, SessionError, Transport};
use tokio::sync::mpsc;

// ─────────────────────────────────────────────────────────────────────
// Step 1: Define a channel-based "loopback" transport
// ─────────────────────────────────────────────────────────────────────

/// The client half of the loopback, handed to `RockPaperScissorsClient::start`.
pub struct LoopbackTransport {
    /// Frames the client sends go here (server reads from the other end).
    tx: mpsc::UnboundedSender<String>,
    /// Frames the server sends arrive here.
    rx: mpsc::UnboundedReceiver<String>,
}

/// The server half of the loopback, used to drive the conversation.
pub struct LoopbackServer {
    rx: mpsc::UnboundedReceiver<String>,
    tx: mpsc::UnboundedSender<String>,
}

impl LoopbackServer {
    fn send(&self, envelope: &Envelope) -> Result<(), Box<dyn std::error::Error>> {
        self.tx.send(envelope.encode()?)?;
        Ok(())
    }

    async fn recv(&mut self) -> Result<Envelope, Box<dyn std::error::Error>> {
        let frame = self.rx.recv().await.ok_or("client went away")?;
        tracing::info!("Server received: {frame}");
        Ok(Envelope::decode(&frame)?)
    }
}

/// Create a connected `(transport, server)` pair.
fn loopback_pair() -> (LoopbackTransport, LoopbackServer) {
    let (client_tx, server_rx) = mpsc::unbounded_channel();
    let (server_tx, client_rx) = mpsc::unbounded_channel();

    (
        LoopbackTransport {
            tx: client_tx,
            rx: client_rx,
        },
        LoopbackServer {
            rx: server_rx,
            tx: server_tx,
        },
    )
}

// ─────────────────────────────────────────────────────────────────────
// Step 2: Implement the Transport trait
// ─────────────────────────────────────────────────────────────────────

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send(&mut self, message: String) -> Result<(), SessionError> {
        self.tx
            .send(message)
            .map_err(|e| SessionError::TransportSend(e.to_string()))
    }

    /// Returns `None` once the server half is dropped, which is how the
    /// session learns the connection ended. Cancel-safe.
    async fn recv(&mut self) -> Option<Result<String, SessionError>> {
        self.rx.recv().await.map(Ok)
    }

    async fn close(&mut self) -> Result<(), SessionError> {
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────
// Step 3: Play one round against the fake server
// ─────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let (transport, mut server) = loopback_pair();
    let (mut client, mut errors) = RockPaperScissorsClient::start(transport, SessionConfig::new());
    let mut state = client.subscribe();

    // ── Fake server: pair the players ───────────────────────────────
    server.send(&Envelope::new(MessageKind::Opponent, "server-bot"))?;
    server.send(&Envelope::new(MessageKind::Info, "Make your pick"))?;
    state.wait_for(|s| s.has_opponent()).await?;

    // ── Client: submit a pick ───────────────────────────────────────
    client.submit_turn(Pick::Paper)?;
    let submitted = server.recv().await?;
    let local_pick: Pick = submitted.text.parse()?;

    // ── Fake server: reveal the bot's pick and score the round ──────
    let bot_pick = Pick::Rock;
    server.send(&Envelope::new(MessageKind::Game, bot_pick.as_wire_str()))?;

    let (winner, local_points) = if local_pick.beats(bot_pick) {
        ("you", 1)
    } else {
        ("server-bot", 0)
    };
    let mut board = GameBoard::default();
    board.players.insert("you".to_string(), local_pick);
    board.players.insert("server-bot".to_string(), bot_pick);
    let data = RoundData {
        game: board,
        score: Some(
            [("you".to_string(), local_points), ("server-bot".to_string(), 1 - local_points)]
                .into_iter()
                .collect(),
        ),
    };
    server.send(&Envelope::with_data(MessageKind::Result, winner, data.to_value()?))?;

    let result = state.wait_for(|s| s.round_finished).await?.clone();
    tracing::info!(
        "Round finished: winner={} local={} scores={:?}",
        result.winner_id,
        result.local_player_id,
        result.scores
    );

    // ── Rematch ─────────────────────────────────────────────────────
    client.request_replay()?;
    let replay = server.recv().await?;
    tracing::info!("Server got {} and resets the round", replay.kind);
    server.send(&Envelope::new(MessageKind::Reset, ""))?;
    state.wait_for(|s| !s.round_finished).await?;

    // ── Fake server: the bot leaves and the connection drops ────────
    server.send(&Envelope::new(MessageKind::OpponentLeft, ""))?;
    state.wait_for(|s| !s.has_opponent()).await?;
    tracing::info!("Opponent left, scores now {:?}", client.state().scores);

    drop(server);
    state.wait_for(|s| !s.is_connected()).await?;

    while let Ok(err) = errors.try_recv() {
        tracing::warn!("Session error: {err}");
    }

    client.shutdown().await;
    tracing::info!("Client shut down");
    Ok(())
}
