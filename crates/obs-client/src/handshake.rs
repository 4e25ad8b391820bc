//! Hello/Identify handshake.
//!
//! obs-websocket speaks first: the server pushes Hello as soon as the
//! transport opens, carrying challenge material when authentication is
//! enabled. The exchange runs on the raw stream before the pumps start
//! because Hello and Identified carry no correlation id.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, tungstenite};

use scenecast_protocol::auth;
use scenecast_protocol::constants::{
    EVENT_SUBSCRIPTIONS, OpCode, RPC_VERSION, WS_CLOSE_AUTH_FAILED, WS_HANDSHAKE_TIMEOUT,
};
use scenecast_protocol::envelope::Envelope;
use scenecast_protocol::messages::{Hello, Identified, Identify};

use crate::client::ObsError;

pub(crate) type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Drives the handshake to completion or failure.
pub(crate) async fn identify(stream: &mut WsStream, password: Option<&str>) -> Result<(), ObsError> {
    tokio::time::timeout(WS_HANDSHAKE_TIMEOUT, run(stream, password))
        .await
        .map_err(|_| ObsError::Handshake("timed out waiting for server".into()))?
}

async fn run(stream: &mut WsStream, password: Option<&str>) -> Result<(), ObsError> {
    let hello: Hello = match next_envelope(stream).await? {
        env if env.op == OpCode::Hello => env.parse_payload()?,
        env => {
            return Err(ObsError::Handshake(format!(
                "expected Hello, got {:?}",
                env.op
            )));
        }
    };

    let authentication = match (&hello.authentication, password) {
        (Some(challenge), Some(password)) => Some(auth::authentication_string(
            password,
            &challenge.salt,
            &challenge.challenge,
        )),
        (Some(_), None) => {
            return Err(ObsError::Handshake(
                "server requires authentication but no password is configured".into(),
            ));
        }
        (None, _) => None,
    };

    let identify = Identify {
        rpc_version: RPC_VERSION,
        authentication,
        event_subscriptions: EVENT_SUBSCRIPTIONS,
    };
    let env = Envelope::new(OpCode::Identify, &identify)?;
    stream
        .send(tungstenite::Message::Text(
            serde_json::to_string(&env)?.into(),
        ))
        .await?;

    let identified: Identified = match next_envelope(stream).await? {
        env if env.op == OpCode::Identified => env.parse_payload()?,
        env => {
            return Err(ObsError::Handshake(format!(
                "expected Identified, got {:?}",
                env.op
            )));
        }
    };

    tracing::debug!(
        rpc_version = identified.negotiated_rpc_version,
        server_version = %hello.obs_web_socket_version,
        "identified with OBS"
    );
    Ok(())
}

/// Reads frames until a text envelope arrives, answering pings along
/// the way. A close frame with code 4009 maps to `AuthFailed`.
async fn next_envelope(stream: &mut WsStream) -> Result<Envelope, ObsError> {
    loop {
        match stream.next().await {
            Some(Ok(tungstenite::Message::Text(text))) => {
                return Ok(serde_json::from_str(&text)?);
            }
            Some(Ok(tungstenite::Message::Ping(data))) => {
                stream.send(tungstenite::Message::Pong(data)).await?;
            }
            Some(Ok(tungstenite::Message::Close(frame))) => {
                if let Some(f) = &frame
                    && u16::from(f.code) == WS_CLOSE_AUTH_FAILED
                {
                    return Err(ObsError::AuthFailed);
                }
                return Err(ObsError::Closed);
            }
            Some(Ok(_)) => {} // Binary/pong, ignored
            Some(Err(e)) => return Err(e.into()),
            None => return Err(ObsError::Closed),
        }
    }
}
