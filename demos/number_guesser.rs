//! # Number Guesser Example
//!
//! Plays the number guessing game against a live server:
//!
//! 1. Connect to the game server via WebSocket
//! 2. Wait for an opponent and the announced range
//! 3. Bisect the range based on the server's hints
//! 4. Ask for a rematch after every result
//! 5. Shut down gracefully on Ctrl+C or disconnect
//!
//! ## Running
//!
//! ```sh
//! # Start a game server on localhost:3000, then:
//! cargo run --example number_guesser
//!
//! # Override the server URL:
//! DUEL_SESSION_URL=ws://my-server:3000/number-guesser cargo run --example number_guesser
//! ```

use duel_session_client::{GuessRange, NumberGuesserClient, SessionConfig, WebSocketTransport};

/// Default server URL when `DUEL_SESSION_URL` is not set.
const DEFAULT_URL: &str = "ws://localhost:3000/number-guesser";

/// The remaining interval the next guess is drawn from.
#[derive(Debug, Clone, Copy)]
struct Search {
    low: i64,
    high: i64,
}

impl Search {
    fn new(range: GuessRange) -> Self {
        Self {
            low: range.min,
            high: range.max,
        }
    }

    fn next_guess(&self) -> i64 {
        self.low + (self.high - self.low) / 2
    }

    /// Narrow the interval from a hint such as "higher" or "too low".
    fn narrow(&mut self, last: i64, hint: &str) {
        let hint = hint.to_lowercase();
        let go_up = if hint.contains("higher") {
            true
        } else if hint.contains("lower") {
            false
        } else if hint.contains("low") {
            true
        } else if hint.contains("high") {
            false
        } else {
            return;
        };
        if go_up {
            self.low = last.saturating_add(1).min(self.high);
        } else {
            self.high = last.saturating_sub(1).max(self.low);
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // ── Logging ─────────────────────────────────────────────────────
    // Set `RUST_LOG=debug` for verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // ── Configuration ───────────────────────────────────────────────
    let url = std::env::var("DUEL_SESSION_URL").unwrap_or_else(|_| DEFAULT_URL.to_string());
    tracing::info!("Connecting to {url}");

    // ── Connect ─────────────────────────────────────────────────────
    let transport = WebSocketTransport::connect(&url).await?;
    let (mut client, mut errors) = NumberGuesserClient::start(transport, SessionConfig::new());
    let mut state = client.subscribe();

    let mut search: Option<Search> = None;

    // ── Session loop ────────────────────────────────────────────────
    loop {
        tokio::select! {
            // Branch 1: a new snapshot was published.
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = state.borrow_and_update().clone();

                if !snapshot.is_connected() {
                    tracing::warn!("Disconnected from server");
                    break;
                }

                if snapshot.round_finished {
                    if snapshot.local_submission.is_some() || search.is_some() {
                        let outcome = if snapshot.local_player_won() { "won" } else { "lost" };
                        tracing::info!(
                            "Round over: {outcome} (winner {}, target {:?}, score {:?} : {:?})",
                            snapshot.winner_id,
                            snapshot.game_data.target,
                            snapshot.local_score(),
                            snapshot.opponent_score(),
                        );
                        search = None;
                        client.request_replay()?;
                    }
                    continue;
                }

                if !snapshot.has_opponent() || !snapshot.round_config.is_set() {
                    continue;
                }

                let search = search.get_or_insert_with(|| {
                    tracing::info!(
                        "Playing {} in {}..={}",
                        snapshot.opponent_id,
                        snapshot.round_config.min,
                        snapshot.round_config.max
                    );
                    Search::new(snapshot.round_config)
                });

                match snapshot.local_submission {
                    // First guess of the round.
                    None => client.submit_turn(search.next_guess())?,
                    // Submitting clears the info line, so any text is a fresh hint.
                    Some(last) if !snapshot.info_text.is_empty() => {
                        tracing::info!("Guessed {last}: {}", snapshot.info_text);
                        search.narrow(last, &snapshot.info_text);
                        client.submit_turn(search.next_guess())?;
                    }
                    Some(_) => {}
                }
            }

            // Branch 2: recoverable errors from the transport loop.
            Some(err) = errors.recv() => {
                tracing::warn!("Session error: {err}");
            }

            // Branch 3: Ctrl+C to shut down gracefully.
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, shutting down");
                break;
            }
        }
    }

    // ── Cleanup ─────────────────────────────────────────────────────
    client.shutdown().await;
    tracing::info!("Client shut down");
    Ok(())
}
