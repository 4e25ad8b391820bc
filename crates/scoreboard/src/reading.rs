//! Raw scoreboard readings and the provider boundary.

use std::time::Instant;

/// Team-name placeholders the scoreboard shows before real data loads.
const PLACEHOLDER_TEAMS: &[&str] = &["abcd", "efghi", "team1", "team2", "null", "nan"];

/// One sampled snapshot of scoreboard data.
///
/// Produced by a [`ScoreboardSource`] once per poll and treated as
/// immutable input; timers are whole seconds remaining on the
/// scoreboard clocks, `None` when the element is missing or blank.
#[derive(Debug, Clone)]
pub struct Reading {
    pub team1: String,
    pub team2: String,
    pub break_timer: Option<u32>,
    pub game_timer: Option<u32>,
    pub timestamp: Instant,
}

impl Reading {
    /// Whether both team names look like real teams rather than
    /// placeholder or truncated scrape output.
    pub fn has_valid_teams(&self) -> bool {
        valid_team(&self.team1) && valid_team(&self.team2)
    }

    /// Whether the reading carries any timer at all.
    pub fn has_timers(&self) -> bool {
        self.break_timer.is_some() || self.game_timer.is_some()
    }

    /// A reading carrying no data, fed to the state machine when a poll
    /// fails so sustained provider outages still settle into
    /// intermission.
    pub fn absent(timestamp: Instant) -> Self {
        Self {
            team1: String::new(),
            team2: String::new(),
            break_timer: None,
            game_timer: None,
            timestamp,
        }
    }
}

fn valid_team(name: &str) -> bool {
    let name = name.trim();
    name.len() >= 2 && !PLACEHOLDER_TEAMS.contains(&name.to_ascii_lowercase().as_str())
}

/// Parses an `MM:SS` scoreboard clock into seconds.
pub fn parse_clock(text: &str) -> Option<u32> {
    let (minutes, seconds) = text.trim().split_once(':')?;
    let minutes: u32 = minutes.parse().ok()?;
    let seconds: u32 = seconds.parse().ok()?;
    if seconds >= 60 {
        return None;
    }
    Some(minutes * 60 + seconds)
}

/// Errors from a scoreboard provider.
#[derive(Debug, thiserror::Error)]
pub enum ScoreboardError {
    /// The provider could not be reached. Transient; retried.
    #[error("scoreboard unavailable: {0}")]
    Unavailable(String),

    /// The provider produced data that does not parse. Skipped; the
    /// state machine holds its last known state.
    #[error("invalid scoreboard data: {0}")]
    InvalidData(String),
}

/// Boundary to whatever acquires scoreboard data.
///
/// The core treats the source as its sole time authority for game state
/// and knows nothing about the acquisition mechanism behind it.
pub trait ScoreboardSource {
    fn poll(&mut self) -> impl Future<Output = Result<Reading, ScoreboardError>> + Send;
}
