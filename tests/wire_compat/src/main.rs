fn main() {
    println!("Run `cargo test -p wire-compat` to execute wire compatibility tests.");
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use scenecast_protocol::messages::{
        Hello, Identify, Request, RequestResponse, SetCurrentProgramScene,
    };
    use scenecast_protocol::{Envelope, OpCode};

    /// Returns the path to the fixtures directory.
    fn fixtures_dir() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("fixtures")
    }

    /// Loads a fixture as its raw JSON text.
    fn load_fixture(name: &str) -> String {
        let path = fixtures_dir().join(name);
        fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("failed to read fixture {}: {e}", path.display()))
    }

    /// Normalizes JSON values so that integer-valued floats compare equal.
    ///
    /// obs-websocket emits `100`, a Rust number may re-serialize as
    /// `100.0`. Both are semantically identical, so numbers are
    /// compared as f64.
    fn normalize_value(v: &serde_json::Value) -> serde_json::Value {
        match v {
            serde_json::Value::Number(n) => {
                if let Some(f) = n.as_f64() {
                    serde_json::json!(f)
                } else {
                    v.clone()
                }
            }
            serde_json::Value::Object(map) => {
                let normalized: serde_json::Map<String, serde_json::Value> = map
                    .iter()
                    .map(|(k, v)| (k.clone(), normalize_value(v)))
                    .collect();
                serde_json::Value::Object(normalized)
            }
            serde_json::Value::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(normalize_value).collect())
            }
            _ => v.clone(),
        }
    }

    /// Deserializes a fixture from its raw text, re-serializes it, and
    /// compares the JSON values (order-independent, float-normalized).
    /// Parsing from text rather than `Value` keeps the envelope's
    /// deferred `RawValue` payload on its normal wire path.
    fn roundtrip_test<T>(name: &str)
    where
        T: serde::de::DeserializeOwned + serde::Serialize,
    {
        let fixture = load_fixture(name);
        let parsed: T = serde_json::from_str(&fixture)
            .unwrap_or_else(|e| panic!("failed to deserialize {name}: {e}"));
        let reserialized = serde_json::to_string(&parsed)
            .unwrap_or_else(|e| panic!("failed to re-serialize {name}: {e}"));

        let fixture_value: serde_json::Value = serde_json::from_str(&fixture).unwrap();
        let reserialized_value: serde_json::Value = serde_json::from_str(&reserialized).unwrap();
        assert_eq!(
            normalize_value(&fixture_value),
            normalize_value(&reserialized_value),
            "roundtrip mismatch for {name}:\n  fixture: {fixture}\n  ours:    {reserialized}"
        );
    }

    // --- Envelope roundtrips ---

    #[test]
    fn fixture_hello_authenticated() {
        roundtrip_test::<Envelope>("hello_authenticated.json");
    }

    #[test]
    fn fixture_hello_open() {
        roundtrip_test::<Envelope>("hello_open.json");
    }

    #[test]
    fn fixture_identify() {
        roundtrip_test::<Envelope>("identify.json");
    }

    #[test]
    fn fixture_identified() {
        roundtrip_test::<Envelope>("identified.json");
    }

    #[test]
    fn fixture_set_scene_request() {
        roundtrip_test::<Envelope>("set_scene_request.json");
    }

    #[test]
    fn fixture_request_response_success() {
        roundtrip_test::<Envelope>("request_response_success.json");
    }

    #[test]
    fn fixture_request_response_failure() {
        roundtrip_test::<Envelope>("request_response_failure.json");
    }

    // --- Typed payload decode ---

    #[test]
    fn hello_payload_decodes_with_challenge() {
        let env: Envelope = serde_json::from_str(&load_fixture("hello_authenticated.json")).unwrap();
        assert_eq!(env.op, OpCode::Hello);
        let hello: Hello = env.parse_payload().unwrap();
        assert_eq!(hello.rpc_version, 1);
        let auth = hello.authentication.expect("challenge present");
        assert_eq!(auth.salt, "lM1GncleQOaCu9lT1yeUZhFYnqhsLLP1G5lAGo3ixaI=");
    }

    #[test]
    fn identify_payload_decodes() {
        let env: Envelope = serde_json::from_str(&load_fixture("identify.json")).unwrap();
        assert_eq!(env.op, OpCode::Identify);
        let identify: Identify = env.parse_payload().unwrap();
        assert_eq!(identify.event_subscriptions, 33);
        assert!(identify.authentication.is_some());
    }

    #[test]
    fn set_scene_request_payload_decodes() {
        let env: Envelope = serde_json::from_str(&load_fixture("set_scene_request.json")).unwrap();
        assert_eq!(env.op, OpCode::Request);
        let request: Request = env.parse_payload().unwrap();
        assert_eq!(request.request_type, "SetCurrentProgramScene");
        let data: SetCurrentProgramScene =
            serde_json::from_value(request.request_data.expect("request data")).unwrap();
        assert_eq!(data.scene_name, "game");
    }

    #[test]
    fn failed_response_payload_decodes() {
        let env: Envelope =
            serde_json::from_str(&load_fixture("request_response_failure.json")).unwrap();
        assert_eq!(env.op, OpCode::RequestResponse);
        let response: RequestResponse = env.parse_payload().unwrap();
        assert!(!response.request_status.result);
        assert_eq!(response.request_status.code, 600);
    }
}
