//! Redundant-switch suppression.

/// Remembers the last scene a switch was requested for.
///
/// Updated optimistically when a command is sent, not when the control
/// surface confirms it. A request for the cached scene produces no
/// outbound call.
#[derive(Debug, Default)]
pub struct SceneSwitchCache {
    last_requested: Option<String>,
}

impl SceneSwitchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the request should go out, recording it as the
    /// last requested scene.
    pub fn should_send(&mut self, scene: &str) -> bool {
        if self.last_requested.as_deref() == Some(scene) {
            return false;
        }
        self.last_requested = Some(scene.to_owned());
        true
    }

    pub fn last_requested(&self) -> Option<&str> {
        self.last_requested.as_deref()
    }

    /// Forgets the cached scene, forcing the next request through.
    /// Used after a reconnect, when the remote scene is unknown again.
    pub fn clear(&mut self) {
        self.last_requested = None;
    }
}
