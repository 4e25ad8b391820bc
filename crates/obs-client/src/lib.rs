//! obs-websocket client with request correlation, keep-alive, and
//! automatic reconnection.
//!
//! [`ObsClient`] owns one live connection: a write pump serialises
//! outbound frames, a read pump correlates responses to pending
//! requests, and a ping pump keeps the link alive. [`Supervisor`] wraps
//! the client in a reconnect loop with exponential backoff and exposes
//! connection health on a watch channel.

pub mod client;
pub(crate) mod handshake;
pub(crate) mod pumps;
pub mod supervisor;
pub mod types;

pub use client::{ObsClient, ObsError};
pub use supervisor::Supervisor;
pub use types::{ConnectionHealth, ConnectionState, ObsConfig, ReconnectConfig};
