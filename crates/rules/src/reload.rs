//! Rules file loading and hot reload.
//!
//! The watcher observes the rules file's parent directory so that
//! editors which replace the file (rename-over-write) are still seen.
//! A reload that fails to parse or validate is logged and discarded;
//! the previously active ruleset keeps serving.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::RecursiveMode;
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use tracing::{info, warn};

use crate::model::{ActiveRuleset, RuleError, RuleSet};

const DEBOUNCE_WINDOW: Duration = Duration::from_millis(200);

/// Loads and validates a rules file.
pub fn load_rules(path: impl AsRef<Path>) -> Result<RuleSet, RuleError> {
    let json = std::fs::read_to_string(path.as_ref())?;
    RuleSet::parse(&json)
}

/// Watches a rules file and swaps the active ruleset on change.
///
/// Dropping the watcher stops it.
pub struct RuleWatcher {
    _debouncer: Debouncer<notify::RecommendedWatcher>,
}

impl RuleWatcher {
    pub fn spawn(path: impl Into<PathBuf>, active: ActiveRuleset) -> Result<Self, RuleError> {
        let path: PathBuf = path.into();
        let watch_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let rules_path = path.clone();

        let mut debouncer = new_debouncer(DEBOUNCE_WINDOW, move |result: DebounceEventResult| {
            match result {
                Ok(events) => {
                    if !events.iter().any(|e| e.path == rules_path) {
                        return;
                    }
                    reload(&rules_path, &active);
                }
                Err(err) => warn!(error = %err, "rules watcher error"),
            }
        })?;
        debouncer
            .watcher()
            .watch(&watch_dir, RecursiveMode::NonRecursive)?;

        info!(path = %path.display(), "watching rules file");
        Ok(Self {
            _debouncer: debouncer,
        })
    }
}

fn reload(path: &Path, active: &ActiveRuleset) {
    match load_rules(path) {
        Ok(ruleset) => {
            info!(path = %path.display(), rules = ruleset.len(), "rules reloaded");
            active.swap(ruleset);
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "rules reload failed, keeping previous ruleset");
        }
    }
}
