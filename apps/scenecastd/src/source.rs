//! File-backed scoreboard source.
//!
//! The scraping component (out of process) writes one JSON snapshot per
//! field; this adapter turns it into [`Reading`]s. Clock values arrive
//! as the `MM:SS` strings shown on the scoreboard.

use std::path::PathBuf;
use std::time::Instant;

use scenecast_scoreboard::{Reading, ScoreboardError, ScoreboardSource, parse_clock};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct Snapshot {
    team1: String,
    team2: String,
    #[serde(default)]
    break_timer: Option<String>,
    #[serde(default)]
    game_timer: Option<String>,
}

pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ScoreboardSource for FileSource {
    async fn poll(&mut self) -> Result<Reading, ScoreboardError> {
        let data = tokio::fs::read_to_string(&self.path).await.map_err(|err| {
            ScoreboardError::Unavailable(format!("{}: {err}", self.path.display()))
        })?;
        let snapshot: Snapshot = serde_json::from_str(&data)
            .map_err(|err| ScoreboardError::InvalidData(err.to_string()))?;

        Ok(Reading {
            team1: snapshot.team1,
            team2: snapshot.team2,
            break_timer: parse_timer(snapshot.break_timer.as_deref())?,
            game_timer: parse_timer(snapshot.game_timer.as_deref())?,
            timestamp: Instant::now(),
        })
    }
}

/// Absent or blank clocks are `None`; a present value that does not
/// parse as `MM:SS` is invalid data.
fn parse_timer(raw: Option<&str>) -> Result<Option<u32>, ScoreboardError> {
    match raw {
        None => Ok(None),
        Some(text) if text.trim().is_empty() => Ok(None),
        Some(text) => parse_clock(text)
            .map(Some)
            .ok_or_else(|| ScoreboardError::InvalidData(format!("bad clock value: {text:?}"))),
    }
}
