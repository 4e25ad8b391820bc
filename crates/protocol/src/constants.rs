use std::time::Duration;

use serde::{Deserialize, Serialize};

/// RPC version this client speaks. obs-websocket v5 only defines 1.
pub const RPC_VERSION: u32 = 1;

/// Event subscription mask sent during Identify.
///
/// General (1) | Scenes (32): enough to observe program scene changes
/// without subscribing to high-volume categories.
pub const EVENT_SUBSCRIPTIONS: u32 = 33;

/// How often to send WebSocket pings.
pub const WS_PING_PERIOD: Duration = Duration::from_secs(10);

/// Time to wait for a pong (or any incoming message).
///
/// Acts as a read deadline: if *nothing* arrives within this window the
/// connection is considered dead and the supervisor reconnects.
pub const WS_PONG_WAIT: Duration = Duration::from_secs(30);

/// Timeout for awaited request/response operations.
pub const WS_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

/// Timeout for the Hello/Identify handshake as a whole.
pub const WS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Maximum inbound message size in bytes.
pub const WS_MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

/// Close code sent by the server when authentication fails.
pub const WS_CLOSE_AUTH_FAILED: u16 = 4009;

/// Request type for "set current program scene by name".
pub const REQUEST_SET_CURRENT_PROGRAM_SCENE: &str = "SetCurrentProgramScene";

/// obs-websocket v5 opcode.
///
/// Closed set: unknown opcodes fail to decode rather than being carried
/// around as raw integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum OpCode {
    Hello,
    Identify,
    Identified,
    Reidentify,
    Event,
    Request,
    RequestResponse,
}

impl From<OpCode> for u8 {
    fn from(op: OpCode) -> u8 {
        match op {
            OpCode::Hello => 0,
            OpCode::Identify => 1,
            OpCode::Identified => 2,
            OpCode::Reidentify => 3,
            OpCode::Event => 5,
            OpCode::Request => 6,
            OpCode::RequestResponse => 7,
        }
    }
}

impl TryFrom<u8> for OpCode {
    type Error = UnknownOpCode;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(OpCode::Hello),
            1 => Ok(OpCode::Identify),
            2 => Ok(OpCode::Identified),
            3 => Ok(OpCode::Reidentify),
            5 => Ok(OpCode::Event),
            6 => Ok(OpCode::Request),
            7 => Ok(OpCode::RequestResponse),
            other => Err(UnknownOpCode(other)),
        }
    }
}

/// Opcode outside the obs-websocket v5 set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown obs-websocket opcode {0}")]
pub struct UnknownOpCode(pub u8);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opcode_round_trip() {
        for op in [
            OpCode::Hello,
            OpCode::Identify,
            OpCode::Identified,
            OpCode::Reidentify,
            OpCode::Event,
            OpCode::Request,
            OpCode::RequestResponse,
        ] {
            let n: u8 = op.into();
            assert_eq!(OpCode::try_from(n).unwrap(), op);
        }
    }

    #[test]
    fn opcode_rejects_unassigned_values() {
        // 4 is unused in the v5 protocol; 8+ are undefined.
        assert_eq!(OpCode::try_from(4), Err(UnknownOpCode(4)));
        assert_eq!(OpCode::try_from(8), Err(UnknownOpCode(8)));
    }

    #[test]
    fn opcode_serde_uses_numbers() {
        let json = serde_json::to_string(&OpCode::Request).unwrap();
        assert_eq!(json, "6");
        let op: OpCode = serde_json::from_str("7").unwrap();
        assert_eq!(op, OpCode::RequestResponse);
        assert!(serde_json::from_str::<OpCode>("4").is_err());
    }
}
