//! Reconnect supervisor: keeps one [`ObsClient`] alive forever.
//!
//! The supervisor owns the live client behind a mutex, reconnects with
//! exponential backoff on unexpected disconnects, and publishes
//! [`ConnectionHealth`] on a watch channel. Losing the connection is a
//! health signal, never a reason to stop: this is a long-lived service
//! and the loop retries on its own schedule until cancelled.

use std::sync::Arc;

use tokio::sync::{Mutex, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::{ObsClient, ObsError};
use crate::types::{ConnectionHealth, ConnectionState, ObsConfig};

/// Supervises the connection to a single OBS instance.
pub struct Supervisor {
    config: ObsConfig,
    client: Arc<Mutex<Option<ObsClient>>>,
    health_tx: watch::Sender<ConnectionHealth>,
    cancel: CancellationToken,
}

impl Supervisor {
    pub fn new(config: ObsConfig, cancel: CancellationToken) -> Self {
        let (health_tx, _) = watch::channel(ConnectionHealth::default());
        Self {
            config,
            client: Arc::new(Mutex::new(None)),
            health_tx,
            cancel,
        }
    }

    /// Subscribes to connection health updates.
    pub fn health(&self) -> watch::Receiver<ConnectionHealth> {
        self.health_tx.subscribe()
    }

    /// Switches the program scene, waiting for confirmation.
    pub async fn set_current_scene(&self, scene_name: &str) -> Result<(), ObsError> {
        match self.client.lock().await.as_ref() {
            Some(client) => client.set_current_scene(scene_name).await,
            None => Err(ObsError::NotConnected),
        }
    }

    /// Switches the program scene fire-and-forget.
    pub async fn set_current_scene_nowait(&self, scene_name: &str) -> Result<(), ObsError> {
        match self.client.lock().await.as_ref() {
            Some(client) => client.set_current_scene_nowait(scene_name).await,
            None => Err(ObsError::NotConnected),
        }
    }

    /// Runs the connect/monitor/reconnect loop until cancelled.
    pub async fn run(&self) {
        let mut attempt: u32 = 0;

        loop {
            if self.cancel.is_cancelled() {
                break;
            }

            match self.connect_once().await {
                Ok(gone_rx) => {
                    attempt = 0;
                    self.publish(ConnectionState::Connected, 0);
                    info!(url = %self.config.url, "connected to OBS");

                    tokio::select! {
                        _ = self.cancel.cancelled() => {
                            if let Some(client) = self.client.lock().await.take() {
                                client.close().await;
                            }
                            break;
                        }
                        _ = gone_rx => {
                            warn!("OBS connection lost");
                            self.client.lock().await.take();
                            self.publish(ConnectionState::Disconnected, 0);
                        }
                    }
                }
                Err(ObsError::AuthFailed) => {
                    // Bad credentials are fatal to the attempt, not the
                    // service. Surfaced as degraded; retried on the
                    // normal schedule in case the server config changes.
                    attempt = attempt.saturating_add(1);
                    warn!(attempt, "OBS rejected authentication");
                }
                Err(e) => {
                    attempt = attempt.saturating_add(1);
                    warn!(attempt, error = %e, "OBS connection attempt failed");
                }
            }

            if self.cancel.is_cancelled() {
                break;
            }

            attempt = attempt.max(1);
            let delay = self.config.reconnect.delay_for_attempt(attempt);
            self.publish(ConnectionState::Reconnecting { attempt }, attempt);
            debug!(
                attempt,
                delay_secs = format_args!("{:.1}", delay.as_secs_f64()),
                "waiting before reconnect"
            );

            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
        }

        self.publish(ConnectionState::Disconnected, 0);
    }

    /// One connect attempt. On success the live client is installed and
    /// the returned channel fires when the connection dies.
    async fn connect_once(&self) -> Result<oneshot::Receiver<()>, ObsError> {
        self.publish_state(ConnectionState::Connecting);
        let stream = crate::client::connect_transport(&self.config.url).await?;

        self.publish_state(ConnectionState::Authenticating);
        let client = ObsClient::identify(stream, self.config.password.as_deref()).await?;

        let (gone_tx, gone_rx) = oneshot::channel();
        client
            .set_disconnect_callback(Box::new(move || {
                let _ = gone_tx.send(());
            }))
            .await;

        *self.client.lock().await = Some(client);
        Ok(gone_rx)
    }

    fn publish(&self, state: ConnectionState, failures: u32) {
        let degraded = failures >= self.config.reconnect.degraded_after;
        self.health_tx.send_replace(ConnectionHealth {
            state,
            consecutive_failures: failures,
            degraded,
        });
    }

    fn publish_state(&self, state: ConnectionState) {
        let current = self.health_tx.borrow().clone();
        self.health_tx.send_replace(ConnectionHealth {
            state,
            ..current
        });
    }
}
