//! Scene orchestration: turns game-state transitions and rule action
//! plans into timed, cancellable scene switches.
//!
//! At most one sequence runs per field; starting a replacement cancels
//! the incumbent and waits for it to stop before any new command goes
//! out. Every switch passes the redundancy cache, so identical
//! consecutive requests never reach the wire.

pub mod cache;
pub mod cadence;
pub mod config;
pub mod controller;
pub mod manual;
pub mod orchestrator;
pub mod sequence;
pub mod switcher;

#[cfg(test)]
pub(crate) mod testutil;

pub use cache::SceneSwitchCache;
pub use cadence::CadenceGovernor;
pub use config::{SceneConfig, TimingConfig};
pub use controller::FieldController;
pub use manual::ManualOverride;
pub use orchestrator::Orchestrator;
pub use sequence::SequenceSlot;
pub use switcher::{OrchestratorError, SceneSwitcher};
