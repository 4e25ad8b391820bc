//! Game states and transitions.

use std::time::Instant;

/// Discrete game state for one monitored field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GameState {
    /// No history yet (process just started).
    Unknown,
    /// No valid scoreboard data; nothing scheduled on the field.
    Intermission,
    /// Break countdown running between points.
    Break,
    /// Game clock running.
    GameActive,
    /// Game clock frozen mid-game.
    GamePaused,
}

impl GameState {
    /// Label used in log fields and rule facts.
    pub fn as_str(&self) -> &'static str {
        match self {
            GameState::Unknown => "unknown",
            GameState::Intermission => "intermission",
            GameState::Break => "break",
            GameState::GameActive => "game",
            GameState::GamePaused => "paused",
        }
    }
}

/// Why a transition fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransitionReason {
    /// Game timer jumped by more than the configured threshold.
    TimeJump,
    /// Game timer landed on a configured common start value.
    CommonStartValue,
    /// Break timer hit zero with the game clock armed.
    BreakZero,
    /// Plain timer-driven reclassification (a clock counting down, or
    /// data absence settling into intermission).
    Decreasing,
    /// The active timer froze for the configured sample count.
    PauseDetected,
    /// First differing sample after a detected pause.
    ResumeDetected,
}

impl TransitionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionReason::TimeJump => "time_jump",
            TransitionReason::CommonStartValue => "common_start_value",
            TransitionReason::BreakZero => "break_zero",
            TransitionReason::Decreasing => "decreasing",
            TransitionReason::PauseDetected => "pause_detected",
            TransitionReason::ResumeDetected => "resume_detected",
        }
    }
}

/// One state change, immutable once created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    pub from: GameState,
    pub to: GameState,
    pub reason: TransitionReason,
    pub at: Instant,
}
