//! Scene names and stage timings.
//!
//! Defaults reflect one deployment's tuning; every value is expected to
//! come from the daemon configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Scene names on the remote control surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub breakout: String,
    #[serde(rename = "default")]
    pub default_scene: String,
    pub game: String,
    pub interview: String,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            breakout: "breakout".into(),
            default_scene: "default".into(),
            game: "game".into(),
            interview: "interview".into(),
        }
    }
}

/// Stage durations and polling cadence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Seconds the breakout scene holds before cutting to default.
    pub breakout_hold_secs: f64,
    /// Seconds after the default cut before the game scene.
    pub breakout_extra_secs: f64,
    /// Rotation half-period: seconds per scene before alternating.
    pub rotation_period_secs: f64,
    /// Poll interval during a sequence or near an expected transition.
    pub fast_poll_ms: u64,
    /// Poll interval otherwise.
    pub slow_poll_ms: u64,
    /// Break-timer values (seconds) at or below which polling goes fast.
    pub break_hot_window_secs: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            breakout_hold_secs: 7.0,
            breakout_extra_secs: 30.0,
            rotation_period_secs: 40.0,
            fast_poll_ms: 100,
            slow_poll_ms: 1000,
            break_hot_window_secs: 5,
        }
    }
}

impl TimingConfig {
    pub fn breakout_hold(&self) -> Duration {
        Duration::from_secs_f64(self.breakout_hold_secs)
    }

    pub fn breakout_extra(&self) -> Duration {
        Duration::from_secs_f64(self.breakout_extra_secs)
    }

    pub fn rotation_period(&self) -> Duration {
        Duration::from_secs_f64(self.rotation_period_secs)
    }

    pub fn fast_poll(&self) -> Duration {
        Duration::from_millis(self.fast_poll_ms)
    }

    pub fn slow_poll(&self) -> Duration {
        Duration::from_millis(self.slow_poll_ms)
    }
}
