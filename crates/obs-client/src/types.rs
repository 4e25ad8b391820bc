//! Public types for the obs-websocket client and its supervisor.

use std::time::Duration;

/// Connection lifecycle state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// No connection and no attempt in progress.
    Disconnected,
    /// Transport connect in progress.
    Connecting,
    /// Transport open, Hello/Identify exchange in progress.
    Authenticating,
    /// Identified and usable.
    Connected,
    /// Connection lost, waiting out the backoff before the next attempt.
    Reconnecting { attempt: u32 },
}

/// Health snapshot published by the supervisor.
///
/// `degraded` flips once `consecutive_failures` crosses the configured
/// threshold. It is a signal for the surrounding process, not a stop
/// condition: the supervisor keeps retrying on its own schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionHealth {
    pub state: ConnectionState,
    pub consecutive_failures: u32,
    pub degraded: bool,
}

impl Default for ConnectionHealth {
    fn default() -> Self {
        Self {
            state: ConnectionState::Disconnected,
            consecutive_failures: 0,
            degraded: false,
        }
    }
}

/// Configuration for automatic reconnection with exponential backoff.
#[derive(Debug, Clone)]
pub struct ReconnectConfig {
    /// Initial delay before the first reconnection attempt.
    pub initial_delay: Duration,
    /// Maximum delay between attempts (backoff cap).
    pub max_delay: Duration,
    /// Multiplier for each subsequent attempt.
    pub backoff_factor: f64,
    /// Failures after which the health signal reports degraded.
    pub degraded_after: u32,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_factor: 1.5,
            degraded_after: 5,
        }
    }
}

impl ReconnectConfig {
    /// Calculates the delay for a given attempt number (1-based),
    /// with ±25% jitter to avoid synchronized retries.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(63) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exp);
        let capped = secs.min(self.max_delay.as_secs_f64());
        let jitter = capped * 0.25;
        let offset = (std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos() as f64
            / u32::MAX as f64)
            * 2.0
            - 1.0; // [-1.0, 1.0)
        let with_jitter = (capped + jitter * offset).max(0.05);
        Duration::from_secs_f64(with_jitter)
    }
}

/// Connection settings for one OBS instance.
#[derive(Debug, Clone)]
pub struct ObsConfig {
    /// WebSocket URL, e.g. `ws://127.0.0.1:4455`.
    pub url: String,
    /// Password for the challenge/response exchange. `None` when the
    /// server runs without authentication.
    pub password: Option<String>,
    pub reconnect: ReconnectConfig,
}
