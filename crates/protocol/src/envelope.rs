use serde::{Deserialize, Serialize};

use crate::constants::OpCode;

/// Envelope for all obs-websocket communication: `{"op": <n>, "d": {...}}`.
///
/// The `d` field uses `serde_json::value::RawValue` to defer payload
/// deserialization until the opcode has been inspected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope {
    pub op: OpCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub d: Option<Box<serde_json::value::RawValue>>,
}

impl Envelope {
    /// Creates an envelope with the given opcode and payload.
    pub fn new<T: Serialize>(op: OpCode, payload: &T) -> Result<Self, serde_json::Error> {
        let json = serde_json::to_string(payload)?;
        Ok(Self {
            op,
            d: Some(serde_json::value::RawValue::from_string(json)?),
        })
    }

    /// Deserializes the payload into the given type.
    pub fn parse_payload<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        match &self.d {
            Some(raw) => serde_json::from_str(raw.get()),
            None => serde_json::from_str("null"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Hello, Identified, Request, RequestResponse};

    #[test]
    fn envelope_round_trips_request() {
        let req = Request {
            request_type: "SetCurrentProgramScene".into(),
            request_id: "r-1".into(),
            request_data: Some(serde_json::json!({"sceneName": "Game Scene"})),
        };
        let env = Envelope::new(OpCode::Request, &req).unwrap();
        let json = serde_json::to_string(&env).unwrap();

        let back: Envelope = serde_json::from_str(&json).unwrap();
        assert_eq!(back.op, OpCode::Request);
        let parsed: Request = back.parse_payload().unwrap();
        assert_eq!(parsed.request_type, "SetCurrentProgramScene");
        assert_eq!(parsed.request_id, "r-1");
    }

    #[test]
    fn envelope_decodes_server_hello() {
        // Literal wire format as obs-websocket sends it.
        let json = r#"{
            "op": 0,
            "d": {
                "obsWebSocketVersion": "5.1.0",
                "rpcVersion": 1,
                "authentication": {
                    "challenge": "abc",
                    "salt": "def"
                }
            }
        }"#;
        let env: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.op, OpCode::Hello);
        let hello: Hello = env.parse_payload().unwrap();
        assert_eq!(hello.rpc_version, 1);
        let auth = hello.authentication.unwrap();
        assert_eq!(auth.challenge, "abc");
        assert_eq!(auth.salt, "def");
    }

    #[test]
    fn envelope_decodes_hello_without_auth() {
        let json = r#"{"op":0,"d":{"obsWebSocketVersion":"5.1.0","rpcVersion":1}}"#;
        let env: Envelope = serde_json::from_str(json).unwrap();
        let hello: Hello = env.parse_payload().unwrap();
        assert!(hello.authentication.is_none());
    }

    #[test]
    fn envelope_decodes_identified() {
        let json = r#"{"op":2,"d":{"negotiatedRpcVersion":1}}"#;
        let env: Envelope = serde_json::from_str(json).unwrap();
        assert_eq!(env.op, OpCode::Identified);
        let identified: Identified = env.parse_payload().unwrap();
        assert_eq!(identified.negotiated_rpc_version, 1);
    }

    #[test]
    fn envelope_decodes_request_response() {
        let json = r#"{
            "op": 7,
            "d": {
                "requestType": "SetCurrentProgramScene",
                "requestId": "r-9",
                "requestStatus": {"result": false, "code": 600, "comment": "no such scene"}
            }
        }"#;
        let env: Envelope = serde_json::from_str(json).unwrap();
        let resp: RequestResponse = env.parse_payload().unwrap();
        assert_eq!(resp.request_id, "r-9");
        assert!(!resp.request_status.result);
        assert_eq!(resp.request_status.code, 600);
        assert_eq!(resp.request_status.comment.as_deref(), Some("no such scene"));
    }
}
