//! WebSocket read pump: correlates responses and watches liveness.

use futures_util::StreamExt;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use scenecast_protocol::constants::{OpCode, WS_MAX_MESSAGE_SIZE, WS_PONG_WAIT};
use scenecast_protocol::envelope::Envelope;
use scenecast_protocol::messages::RequestResponse;

use crate::client::{DisconnectCallback, PendingMap};

/// Reads envelopes from the WebSocket and routes responses to their
/// pending requests.
///
/// Uses a read deadline to detect dead connections: if nothing at all
/// arrives within [`WS_PONG_WAIT`] the connection is considered dead
/// and the loop exits, which fires the disconnect callback and lets the
/// supervisor reconnect.
pub(crate) async fn read_pump<S>(
    mut read: S,
    pending: PendingMap,
    on_disconnect: DisconnectCallback,
    write_tx: mpsc::Sender<tungstenite::Message>,
    cancel: CancellationToken,
) where
    S: StreamExt<Item = Result<tungstenite::Message, tungstenite::Error>> + Unpin,
{
    let deadline = tokio::time::sleep(WS_PONG_WAIT);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,

            () = &mut deadline => {
                warn!("read deadline expired, connection dead");
                break;
            }

            msg = read.next() => {
                match msg {
                    Some(Ok(msg)) => {
                        // Any traffic proves the link is alive.
                        deadline.as_mut().reset(tokio::time::Instant::now() + WS_PONG_WAIT);

                        match msg {
                            tungstenite::Message::Text(text) => {
                                handle_text_message(&text, &pending).await;
                            }
                            tungstenite::Message::Ping(data) => {
                                trace!("received ping, sending pong");
                                let _ = write_tx.send(tungstenite::Message::Pong(data)).await;
                            }
                            tungstenite::Message::Pong(_) => {
                                trace!("received pong");
                            }
                            tungstenite::Message::Close(frame) => {
                                debug!(?frame, "received close frame");
                                break;
                            }
                            _ => {} // Binary; obs-websocket never sends these unsolicited
                        }
                    }
                    Some(Err(e)) => {
                        warn!("WebSocket read error: {e}");
                        break;
                    }
                    None => {
                        debug!("WebSocket stream ended");
                        break;
                    }
                }
            }
        }
    }

    // Unanswered requests would otherwise wait out their full timeout.
    pending.lock().await.clear();

    if let Some(cb) = on_disconnect.lock().await.take() {
        cb();
    }
}

async fn handle_text_message(text: &str, pending: &PendingMap) {
    if text.len() > WS_MAX_MESSAGE_SIZE {
        warn!("message too large ({} bytes), dropping", text.len());
        return;
    }

    let env: Envelope = match serde_json::from_str(text) {
        Ok(e) => e,
        Err(e) => {
            warn!("failed to parse envelope: {e}");
            return;
        }
    };

    match env.op {
        OpCode::RequestResponse => {
            let resp: RequestResponse = match env.parse_payload() {
                Ok(r) => r,
                Err(e) => {
                    warn!("failed to parse request response: {e}");
                    return;
                }
            };
            trace!(id = %resp.request_id, request_type = %resp.request_type, "response");

            let mut map = pending.lock().await;
            if let Some(tx) = map.remove(&resp.request_id) {
                let _ = tx.send(resp);
            } else {
                // Fire-and-forget requests land here by design.
                trace!("response without pending request");
            }
        }
        OpCode::Event => {
            trace!("event received");
        }
        other => {
            debug!(op = ?other, "unexpected opcode outside handshake");
        }
    }
}
