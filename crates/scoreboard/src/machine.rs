//! Game-state machine over noisy scoreboard readings.
//!
//! One machine per monitored field. Each call to [`StateMachine::observe`]
//! consumes one reading and returns at most one transition; malformed
//! readings are rejected and the last known state held.

use tracing::{debug, info};

use crate::reading::Reading;
use crate::state::{GameState, StateTransition, TransitionReason};

/// Detection thresholds. These reflect one deployment's tuning and are
/// deliberately configuration, not constants.
#[derive(Debug, Clone)]
pub struct StateMachineConfig {
    /// Game-timer jump (either direction, seconds) that signals a new game.
    pub jump_threshold_secs: u32,
    /// Game lengths the timer starts from (seconds).
    pub common_start_values: Vec<u32>,
    /// Consecutive identical samples of the game timer that mean paused.
    pub pause_samples: u32,
    /// Consecutive invalid/absent readings before settling into
    /// intermission. Guards against one scrape glitch yanking the
    /// broadcast away mid-match.
    pub intermission_samples: u32,
}

impl Default for StateMachineConfig {
    fn default() -> Self {
        Self {
            jump_threshold_secs: 60,
            common_start_values: vec![300, 600, 720],
            pause_samples: 3,
            intermission_samples: 3,
        }
    }
}

/// Consecutive-identical-sample counter for pause detection.
///
/// `repeat_count` counts occurrences of `last_value`; it resets when the
/// value changes. The pause signal fires exactly when the count reaches
/// the configured threshold, so it cannot re-fire on further identical
/// samples.
#[derive(Debug, Default)]
struct PauseTracker {
    last_value: Option<u32>,
    repeat_count: u32,
}

impl PauseTracker {
    /// Feeds one sample; returns true when the threshold is hit exactly.
    fn observe(&mut self, value: u32, threshold: u32) -> bool {
        if self.last_value == Some(value) {
            self.repeat_count += 1;
        } else {
            self.last_value = Some(value);
            self.repeat_count = 1;
        }
        self.repeat_count == threshold
    }

    /// Whether this sample differs from the tracked value.
    fn differs(&self, value: u32) -> bool {
        self.last_value.is_some_and(|last| last != value)
    }

    fn reset(&mut self, value: Option<u32>) {
        self.last_value = value;
        self.repeat_count = value.map_or(0, |_| 1);
    }
}

/// State machine for one monitored field.
pub struct StateMachine {
    config: StateMachineConfig,
    state: GameState,
    prev_break: Option<u32>,
    prev_game: Option<u32>,
    pause: PauseTracker,
    absent_streak: u32,
    game_just_started: bool,
    cycles_in_state: u64,
    last_reason: Option<TransitionReason>,
}

impl StateMachine {
    pub fn new(config: StateMachineConfig) -> Self {
        Self {
            config,
            state: GameState::Unknown,
            prev_break: None,
            prev_game: None,
            pause: PauseTracker::default(),
            absent_streak: 0,
            game_just_started: false,
            cycles_in_state: 0,
            last_reason: None,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    /// Observations since the last transition.
    pub fn cycles_in_state(&self) -> u64 {
        self.cycles_in_state
    }

    pub fn last_reason(&self) -> Option<TransitionReason> {
        self.last_reason
    }

    /// Reads and clears the game-start marker. True for exactly one
    /// call after a game-start transition, so the breakout sequence
    /// cannot re-trigger on subsequent identical readings.
    pub fn take_game_just_started(&mut self) -> bool {
        std::mem::take(&mut self.game_just_started)
    }

    /// Consumes one reading and returns at most one transition.
    pub fn observe(&mut self, reading: &Reading) -> Option<StateTransition> {
        let transition = self.step(reading);

        match &transition {
            Some(t) => {
                info!(
                    from = t.from.as_str(),
                    to = t.to.as_str(),
                    reason = t.reason.as_str(),
                    "state transition"
                );
                self.state = t.to;
                self.last_reason = Some(t.reason);
                self.cycles_in_state = 0;
            }
            None => self.cycles_in_state = self.cycles_in_state.saturating_add(1),
        }

        // History only advances on readings that carried data.
        if reading.has_valid_teams() && reading.has_timers() {
            self.prev_break = reading.break_timer.or(self.prev_break);
            self.prev_game = reading.game_timer.or(self.prev_game);
        }

        transition
    }

    fn step(&mut self, reading: &Reading) -> Option<StateTransition> {
        // Absent or placeholder data: hold state, but settle into
        // intermission once the absence is sustained.
        if !reading.has_valid_teams() || !reading.has_timers() {
            self.absent_streak = self.absent_streak.saturating_add(1);
            debug!(streak = self.absent_streak, "reading without valid data");
            if self.state != GameState::Intermission
                && self.absent_streak >= self.config.intermission_samples
            {
                return Some(self.transition_to(GameState::Intermission, TransitionReason::Decreasing, reading));
            }
            return None;
        }
        self.absent_streak = 0;

        // Pause handling comes first: a frozen clock must not be
        // mistaken for a still-active game, and the first differing
        // sample after a pause resumes before anything else fires.
        match self.state {
            GameState::GameActive => {
                // Zero is a finished clock, not a frozen one.
                if let Some(game) = reading.game_timer
                    && game > 0
                    && self.pause.observe(game, self.config.pause_samples)
                {
                    return Some(self.transition_to(
                        GameState::GamePaused,
                        TransitionReason::PauseDetected,
                        reading,
                    ));
                }
            }
            GameState::GamePaused => {
                if let Some(game) = reading.game_timer {
                    if self.pause.differs(game) {
                        self.pause.reset(Some(game));
                        return Some(self.transition_to(
                            GameState::GameActive,
                            TransitionReason::ResumeDetected,
                            reading,
                        ));
                    }
                    self.pause.observe(game, self.config.pause_samples);
                }
                return None;
            }
            _ => {}
        }

        if let Some(t) = self.detect_game_start(reading) {
            return Some(t);
        }

        self.classify(reading)
    }

    /// Game-start heuristics, in priority order. Only armed outside an
    /// active game.
    fn detect_game_start(&mut self, reading: &Reading) -> Option<StateTransition> {
        if !matches!(
            self.state,
            GameState::Break | GameState::Intermission | GameState::Unknown
        ) {
            return None;
        }
        let game = reading.game_timer?;

        // 1. Discontinuity: the clock was reset for a new game. Both
        // directions count; a reset can land below the previous value.
        if let Some(prev) = self.prev_game
            && game.abs_diff(prev) > self.config.jump_threshold_secs
        {
            info!(prev, game, "game timer jump");
            return Some(self.game_start(TransitionReason::TimeJump, reading));
        }

        // 2. The clock sits on a common start value it wasn't on before.
        if self.config.common_start_values.contains(&game)
            && self.prev_game != Some(game)
            && matches!(self.state, GameState::Break | GameState::Intermission)
        {
            info!(game, "game timer on common start value");
            return Some(self.game_start(TransitionReason::CommonStartValue, reading));
        }

        // 3. Break expired with the game clock armed.
        if reading.break_timer == Some(0)
            && game > 0
            && self.prev_break.is_some_and(|prev| prev > 0)
        {
            info!(game, "break reached zero with game timer armed");
            return Some(self.game_start(TransitionReason::BreakZero, reading));
        }

        None
    }

    fn game_start(&mut self, reason: TransitionReason, reading: &Reading) -> StateTransition {
        self.game_just_started = true;
        self.pause.reset(reading.game_timer);
        self.transition_to(GameState::GameActive, reason, reading)
    }

    /// Plain timer-driven classification, also used to settle the very
    /// first reading after startup so a mid-match restart lands in the
    /// right state immediately.
    fn classify(&mut self, reading: &Reading) -> Option<StateTransition> {
        let break_active = reading.break_timer.is_some_and(|b| {
            b > 0 && self.prev_break.is_none_or(|prev| b <= prev)
        });
        let game_active = reading.game_timer.is_some_and(|g| {
            g > 0 && self.prev_game.is_none_or(|prev| g <= prev)
        });

        let next = if break_active {
            GameState::Break
        } else if game_active {
            GameState::GameActive
        } else {
            // Timers present but idle (zeros, or counting up weirdly):
            // hold the current state rather than flapping.
            return None;
        };

        if next == self.state {
            return None;
        }
        if next == GameState::GameActive {
            self.pause.reset(reading.game_timer);
        }
        Some(self.transition_to(next, TransitionReason::Decreasing, reading))
    }

    fn transition_to(
        &mut self,
        to: GameState,
        reason: TransitionReason,
        reading: &Reading,
    ) -> StateTransition {
        StateTransition {
            from: self.state,
            to,
            reason,
            at: reading.timestamp,
        }
    }
}

impl Default for StateMachine {
    fn default() -> Self {
        Self::new(StateMachineConfig::default())
    }
}
