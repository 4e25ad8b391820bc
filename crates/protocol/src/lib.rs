//! Wire protocol types for the obs-websocket v5 control surface.
//!
//! Scene switches travel over a persistent WebSocket carrying JSON
//! envelopes with numeric opcodes. This crate owns the envelope format,
//! the typed handshake and request payloads, and the challenge/response
//! authentication math. It performs no I/O.

pub mod auth;
pub mod constants;
pub mod envelope;
pub mod messages;

pub use constants::OpCode;
pub use envelope::Envelope;
