//! Operator override via a filesystem sentinel.

use std::path::PathBuf;

use tracing::info;

/// Suspends automatic switching while a sentinel file exists.
///
/// Operators touch the file to take the field manual and remove it to
/// hand control back. Engage and release are logged once per edge.
#[derive(Debug)]
pub struct ManualOverride {
    path: PathBuf,
    engaged: bool,
}

impl ManualOverride {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            engaged: false,
        }
    }

    /// Samples the sentinel. Returns true while override is engaged.
    pub fn check(&mut self) -> bool {
        let present = self.path.exists();
        if present != self.engaged {
            if present {
                info!(sentinel = %self.path.display(), "manual override engaged, automatic switching suspended");
            } else {
                info!(sentinel = %self.path.display(), "manual override released");
            }
            self.engaged = present;
        }
        present
    }

    pub fn engaged(&self) -> bool {
        self.engaged
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_sentinel_presence() {
        let tmp = tempfile::tempdir().unwrap();
        let sentinel = tmp.path().join("pause");
        let mut override_ = ManualOverride::new(&sentinel);

        assert!(!override_.check());
        std::fs::write(&sentinel, b"").unwrap();
        assert!(override_.check());
        assert!(override_.engaged());
        std::fs::remove_file(&sentinel).unwrap();
        assert!(!override_.check());
    }
}
