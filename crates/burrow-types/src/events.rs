use serde::{Deserialize, Serialize};

/// The three event kinds carried over the relay channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Message,
    Friend,
    Chat,
}

/// Frame sent FROM a client TO the relay. The body is opaque to the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientFrame {
    pub kind: EventKind,
    pub body: serde_json::Value,
}

/// Frame re-emitted to every other connected peer. `from` is a short opaque
/// token derived from the sender's connection id, not a user id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayFrame {
    pub kind: EventKind,
    pub body: serde_json::Value,
    pub from: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_frame_parses_lowercase_kinds() {
        let frame: ClientFrame =
            serde_json::from_str(r#"{"kind":"message","body":{"text":"hi"}}"#).unwrap();
        assert_eq!(frame.kind, EventKind::Message);
        assert_eq!(frame.body["text"], "hi");

        let frame: ClientFrame =
            serde_json::from_str(r#"{"kind":"friend","body":"refresh"}"#).unwrap();
        assert_eq!(frame.kind, EventKind::Friend);
    }

    #[test]
    fn relay_frame_carries_sender_tag() {
        let frame = RelayFrame {
            kind: EventKind::Chat,
            body: serde_json::json!({"chat_id": 7}),
            from: "a1b2c3d4".into(),
        };
        let json: serde_json::Value =
            serde_json::from_str(&serde_json::to_string(&frame).unwrap()).unwrap();
        assert_eq!(json["kind"], "chat");
        assert_eq!(json["from"], "a1b2c3d4");
        assert_eq!(json["body"]["chat_id"], 7);
    }
}
