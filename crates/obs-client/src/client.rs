//! Live obs-websocket connection with request/response correlation.

use std::collections::HashMap;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio_tungstenite::tungstenite;

use scenecast_protocol::constants::{
    OpCode, REQUEST_SET_CURRENT_PROGRAM_SCENE, WS_MAX_MESSAGE_SIZE, WS_REQUEST_TIMEOUT,
};
use scenecast_protocol::envelope::Envelope;
use scenecast_protocol::messages::{Request, RequestResponse, SetCurrentProgramScene};

/// Errors from the obs-websocket client.
#[derive(Debug, thiserror::Error)]
pub enum ObsError {
    #[error("WebSocket error: {0}")]
    Ws(#[from] tungstenite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("request timed out")]
    Timeout,

    #[error("connection closed")]
    Closed,

    #[error("not connected")]
    NotConnected,

    #[error("authentication rejected by server")]
    AuthFailed,

    #[error("handshake failed: {0}")]
    Handshake(String),

    #[error("request {request_type} failed with code {code}: {comment}")]
    RequestFailed {
        request_type: String,
        code: i32,
        comment: String,
    },
}

/// Callback type for disconnect notification.
pub(crate) type DisconnectCallback = Arc<Mutex<Option<Box<dyn FnOnce() + Send + Sync>>>>;

pub(crate) type PendingMap = Arc<Mutex<HashMap<String, oneshot::Sender<RequestResponse>>>>;

/// One identified obs-websocket connection.
///
/// Requests are correlated by a generated `requestId`. [`ObsClient::request`]
/// waits for the matching response with a per-request timeout;
/// [`ObsClient::submit`] queues the frame and returns immediately with no
/// acknowledgment, which is the contract for latency-critical switches.
pub struct ObsClient {
    write_tx: mpsc::Sender<tungstenite::Message>,
    pending: PendingMap,
    on_disconnect: DisconnectCallback,
    _read_handle: tokio::task::JoinHandle<()>,
    _write_handle: tokio::task::JoinHandle<()>,
    _ping_handle: tokio::task::JoinHandle<()>,
    cancel: tokio_util::sync::CancellationToken,
}

impl std::fmt::Debug for ObsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObsClient").finish_non_exhaustive()
    }
}

impl ObsClient {
    /// Opens the transport, performs the Hello/Identify exchange, and
    /// returns a usable client.
    pub async fn connect(url: &str, password: Option<&str>) -> Result<Self, ObsError> {
        let stream = connect_transport(url).await?;
        Self::identify(stream, password).await
    }

    /// Opens the WebSocket transport without identifying. Split out so
    /// the supervisor can report Connecting and Authenticating phases
    /// separately.
    pub(crate) async fn identify(
        mut stream: crate::handshake::WsStream,
        password: Option<&str>,
    ) -> Result<Self, ObsError> {
        crate::handshake::identify(&mut stream, password).await?;

        let (write, read) = stream.split();

        let (write_tx, write_rx) = mpsc::channel::<tungstenite::Message>(256);
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let on_disconnect: DisconnectCallback = Arc::new(Mutex::new(None));
        let cancel = tokio_util::sync::CancellationToken::new();

        let write_handle = {
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::write::write_pump(write, write_rx, cancel))
        };

        let read_handle = {
            let pending = pending.clone();
            let on_disconnect = on_disconnect.clone();
            let write_tx = write_tx.clone();
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::read::read_pump(
                read,
                pending,
                on_disconnect,
                write_tx,
                cancel,
            ))
        };

        let ping_handle = {
            let write_tx = write_tx.clone();
            let cancel = cancel.clone();
            tokio::spawn(crate::pumps::ping::ping_pump(write_tx, cancel))
        };

        Ok(Self {
            write_tx,
            pending,
            on_disconnect,
            _read_handle: read_handle,
            _write_handle: write_handle,
            _ping_handle: ping_handle,
            cancel,
        })
    }

    /// Sends a request and waits for the correlated response.
    ///
    /// A response whose `requestStatus.result` is false maps to
    /// [`ObsError::RequestFailed`]. Timeouts are not retried here;
    /// callers decide.
    pub async fn request(
        &self,
        request_type: &str,
        request_data: Option<serde_json::Value>,
    ) -> Result<RequestResponse, ObsError> {
        let id = uuid::Uuid::new_v4().to_string();
        let json = encode_request(&id, request_type, request_data)?;

        let (tx, rx) = oneshot::channel();
        self.pending.lock().await.insert(id.clone(), tx);

        self.write_tx
            .send(tungstenite::Message::Text(json.into()))
            .await
            .map_err(|_| ObsError::Closed)?;

        let result = tokio::time::timeout(WS_REQUEST_TIMEOUT, rx).await;

        // Clean up the pending entry on any exit path.
        self.pending.lock().await.remove(&id);

        match result {
            Ok(Ok(resp)) => {
                if resp.request_status.result {
                    Ok(resp)
                } else {
                    Err(ObsError::RequestFailed {
                        request_type: resp.request_type,
                        code: resp.request_status.code,
                        comment: resp.request_status.comment.unwrap_or_default(),
                    })
                }
            }
            Ok(Err(_)) => Err(ObsError::Closed),
            Err(_) => Err(ObsError::Timeout),
        }
    }

    /// Queues a request without waiting for any response.
    ///
    /// No acknowledgment is ever observed: success means the frame was
    /// handed to the write pump. Used on the breakout path where
    /// waiting a round-trip would cost the shot.
    pub async fn submit(
        &self,
        request_type: &str,
        request_data: Option<serde_json::Value>,
    ) -> Result<(), ObsError> {
        let id = uuid::Uuid::new_v4().to_string();
        let json = encode_request(&id, request_type, request_data)?;

        self.write_tx
            .send(tungstenite::Message::Text(json.into()))
            .await
            .map_err(|_| ObsError::Closed)
    }

    /// Switches the program scene and waits for confirmation.
    pub async fn set_current_scene(&self, scene_name: &str) -> Result<(), ObsError> {
        let data = serde_json::to_value(SetCurrentProgramScene {
            scene_name: scene_name.to_string(),
        })?;
        self.request(REQUEST_SET_CURRENT_PROGRAM_SCENE, Some(data))
            .await?;
        Ok(())
    }

    /// Switches the program scene fire-and-forget.
    pub async fn set_current_scene_nowait(&self, scene_name: &str) -> Result<(), ObsError> {
        let data = serde_json::to_value(SetCurrentProgramScene {
            scene_name: scene_name.to_string(),
        })?;
        self.submit(REQUEST_SET_CURRENT_PROGRAM_SCENE, Some(data))
            .await
    }

    /// Sets the callback invoked once when the connection dies.
    pub async fn set_disconnect_callback(&self, cb: Box<dyn FnOnce() + Send + Sync>) {
        *self.on_disconnect.lock().await = Some(cb);
    }

    /// Gracefully closes the connection.
    pub async fn close(&self) {
        self.cancel.cancel();
        let _ = self.write_tx.send(tungstenite::Message::Close(None)).await;
    }
}

impl Drop for ObsClient {
    fn drop(&mut self) {
        self.cancel.cancel();
        self._read_handle.abort();
        self._write_handle.abort();
        self._ping_handle.abort();
    }
}

/// Opens the WebSocket transport with the protocol's size limits.
pub(crate) async fn connect_transport(url: &str) -> Result<crate::handshake::WsStream, ObsError> {
    let mut ws_config = tungstenite::protocol::WebSocketConfig::default();
    ws_config.max_message_size = Some(WS_MAX_MESSAGE_SIZE);
    ws_config.max_frame_size = Some(WS_MAX_MESSAGE_SIZE);
    let (stream, _) =
        tokio_tungstenite::connect_async_with_config(url, Some(ws_config), false).await?;
    Ok(stream)
}

fn encode_request(
    id: &str,
    request_type: &str,
    request_data: Option<serde_json::Value>,
) -> Result<String, ObsError> {
    let req = Request {
        request_type: request_type.to_string(),
        request_id: id.to_string(),
        request_data,
    };
    let env = Envelope::new(OpCode::Request, &req)?;
    Ok(serde_json::to_string(&env)?)
}
