//! Scoreboard readings and the game-state machine.
//!
//! A scraped scoreboard produces noisy, periodically sampled
//! [`Reading`]s. The [`StateMachine`] turns them into discrete
//! [`StateTransition`]s (game start, break, intermission, pause) that
//! drive scene orchestration. How readings are acquired is the
//! provider's business; the machine only sees the [`ScoreboardSource`]
//! boundary.

pub mod machine;
pub mod reading;
pub mod state;

pub use machine::{StateMachine, StateMachineConfig};
pub use reading::{Reading, ScoreboardError, ScoreboardSource, parse_clock};
pub use state::{GameState, StateTransition, TransitionReason};
