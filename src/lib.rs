//! # Duel Session Client
//!
//! Client-side, message-driven session synchronizer for two-player,
//! turn-based games.
//!
//! The crate keeps one authoritative local mirror of a game session. The
//! mirror changes only when the server sends a message or when the local
//! player acts, and it is exposed to UIs as a stream of whole snapshots.
//!
//! ## Features
//!
//! - **One reducer, many games**: [`reducer::reduce`] is generic over
//!   [`GameRules`]; the number guesser and rock/paper/scissors ship in [`games`]
//! - **Never crashes on bad input**: malformed frames skip one update and are
//!   reported on an error channel; unknown message kinds are ignored
//! - **Transport-agnostic**: implement [`Transport`] for any backend; the
//!   default `transport-websocket` feature provides `WebSocketTransport`
//! - **Observable**: subscribe to a [`tokio::sync::watch`] receiver of
//!   [`SessionState`] snapshots
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! let transport = WebSocketTransport::connect("ws://localhost:3000/rps").await?;
//! let (mut client, mut errors) = RockPaperScissorsClient::start(transport, SessionConfig::new());
//!
//! client.submit_turn(Pick::Rock)?;
//! let mut state = client.subscribe();
//! state.wait_for(|s| s.round_finished).await?;
//! println!("winner: {}", client.state().winner_id);
//! ```

pub mod error;
pub mod games;
pub mod policy;
pub mod protocol;
pub mod reducer;
pub mod rules;
pub mod session;
pub mod state;
pub mod transport;
pub mod transports;

#[cfg(feature = "tokio-runtime")]
pub mod client;

// Re-export primary types for ergonomic imports.
pub use error::SessionError;
pub use games::{GuessRange, NumberGuesser, Pick, RockPaperScissors};
pub use protocol::{Envelope, MessageKind};
pub use rules::GameRules;
pub use session::SessionStore;
pub use state::{ConnectionStatus, SessionState};
pub use transport::Transport;

#[cfg(feature = "tokio-runtime")]
pub use client::{GameSessionClient, NumberGuesserClient, RockPaperScissorsClient, SessionConfig};

#[cfg(feature = "transport-websocket")]
pub use transports::WebSocketTransport;
