//! The seam between the orchestrator and the protocol client.

/// Errors surfaced to the orchestrator from scene switching.
///
/// All of them are transient from the orchestrator's point of view:
/// the switch is logged and dropped, the connection supervisor owns
/// recovery.
#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("scene switch failed: {0}")]
    Switch(String),
}

/// Issues scene-switch commands against the control surface.
pub trait SceneSwitcher: Send + Sync + 'static {
    /// Switches scene and waits for the control surface to answer.
    fn switch(
        &self,
        scene: &str,
    ) -> impl Future<Output = Result<(), OrchestratorError>> + Send;

    /// Switches scene without waiting for an acknowledgment. The
    /// command is handed to the transport and the call returns; used on
    /// the latency-critical game-start path.
    fn switch_nowait(
        &self,
        scene: &str,
    ) -> impl Future<Output = Result<(), OrchestratorError>> + Send;
}
