//! Single-slot ownership of the active sequence.

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Holds at most one in-flight sequence.
///
/// Starting a replacement cancels the incumbent and awaits its
/// termination before the new task is spawned, so two sequences can
/// never send commands concurrently. Cancellation is cooperative: the
/// token is only observed between stages.
#[derive(Default)]
pub struct SequenceSlot {
    inner: Mutex<Option<Running>>,
}

impl SequenceSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs a new sequence, displacing any incumbent.
    pub async fn start<F, Fut>(&self, sequence: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut slot = self.inner.lock().await;
        if let Some(prev) = slot.take() {
            debug!("cancelling incumbent sequence");
            prev.cancel.cancel();
            let _ = prev.handle.await;
        }

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(sequence(cancel.clone()));
        *slot = Some(Running { cancel, handle });
    }

    /// Cancels the active sequence, if any, and waits for it to stop.
    pub async fn cancel_current(&self) {
        let mut slot = self.inner.lock().await;
        if let Some(prev) = slot.take() {
            prev.cancel.cancel();
            let _ = prev.handle.await;
        }
    }

    /// Whether a sequence is still running.
    pub async fn is_active(&self) -> bool {
        self.inner
            .lock()
            .await
            .as_ref()
            .is_some_and(|running| !running.handle.is_finished())
    }
}
