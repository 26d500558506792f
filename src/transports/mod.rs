//! Transport implementations for the duel session protocol.
//!
//! | Feature                | Transport              |
//! |------------------------|------------------------|
//! | `transport-websocket`  | [`WebSocketTransport`] |
//!
//! Any other backend can be plugged in by implementing
//! [`Transport`](crate::Transport); see `demos/loopback.rs`.

#[cfg(feature = "transport-websocket")]
pub mod websocket;

#[cfg(feature = "transport-websocket")]
pub use websocket::WebSocketTransport;
