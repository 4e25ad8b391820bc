//! Test doubles shared across this crate's test modules.

use std::sync::{Arc, Mutex};

use tokio::time::Instant;

use crate::switcher::{OrchestratorError, SceneSwitcher};

/// Records every switch request with its timestamp.
#[derive(Clone)]
pub(crate) struct RecordingSwitcher {
    calls: Arc<Mutex<Vec<Call>>>,
}

#[derive(Debug, Clone)]
pub(crate) struct Call {
    pub(crate) scene: String,
    pub(crate) nowait: bool,
    pub(crate) at: Instant,
}

impl RecordingSwitcher {
    pub(crate) fn new() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn record(&self, scene: &str, nowait: bool) {
        self.calls.lock().unwrap().push(Call {
            scene: scene.to_owned(),
            nowait,
            at: Instant::now(),
        });
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn scenes(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.scene).collect()
    }
}

impl SceneSwitcher for RecordingSwitcher {
    async fn switch(&self, scene: &str) -> Result<(), OrchestratorError> {
        self.record(scene, false);
        Ok(())
    }

    async fn switch_nowait(&self, scene: &str) -> Result<(), OrchestratorError> {
        self.record(scene, true);
        Ok(())
    }
}
