//! Wire messages exchanged with the browser script.

use serde::{Deserialize, Serialize};

use crate::view::Event;

/// Client request to bind its connection to a registered channel.
#[derive(Debug, Deserialize)]
pub(crate) struct SubscribeRequest {
    #[serde(default)]
    pub subscribe: String,
}

/// Server push carrying a channel's re-rendered markup.
#[derive(Debug, Serialize)]
pub(crate) struct RenderUpdate<'a> {
    pub render: &'a str,
    pub id: &'a str,
}

/// Server push asking the browser to run a script against one element of a
/// channel's root.
#[derive(Debug, Serialize)]
pub(crate) struct ScriptAction<'a> {
    pub id: &'a str,
    pub selector: &'a str,
    pub action: &'a str,
}

/// A decoded inbound frame.
#[derive(Debug)]
pub(crate) enum ClientFrame {
    Subscribe(String),
    Event(Event),
}

/// Classify one inbound frame.
///
/// The subscribe shape is tried first; a frame whose discriminator field is
/// missing or empty falls through to the next shape. Anything that matches
/// neither decodes to `None` and is dropped without a response.
pub(crate) fn decode_client_frame(raw: &str) -> Option<ClientFrame> {
    if let Ok(request) = serde_json::from_str::<SubscribeRequest>(raw) {
        if !request.subscribe.is_empty() {
            return Some(ClientFrame::Subscribe(request.subscribe));
        }
    }
    if let Ok(event) = serde_json::from_str::<Event>(raw) {
        if !event.event.is_empty() {
            return Some(ClientFrame::Event(event));
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_subscribe_frames() {
        match decode_client_frame(r#"{"subscribe":"abc123"}"#) {
            Some(ClientFrame::Subscribe(id)) => assert_eq!(id, "abc123"),
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn decodes_interaction_events() {
        match decode_client_frame(r#"{"event":"increment","value":"1","channel":"c1"}"#) {
            Some(ClientFrame::Event(event)) => {
                assert_eq!(event.event, "increment");
                assert_eq!(event.value, "1");
                assert_eq!(event.channel, "c1");
            }
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn missing_event_fields_default_to_empty() {
        match decode_client_frame(r#"{"event":"ping"}"#) {
            Some(ClientFrame::Event(event)) => {
                assert_eq!(event.event, "ping");
                assert_eq!(event.value, "");
                assert_eq!(event.channel, "");
            }
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn subscribe_shape_wins_when_both_fields_are_present() {
        match decode_client_frame(r#"{"subscribe":"c1","event":"click"}"#) {
            Some(ClientFrame::Subscribe(id)) => assert_eq!(id, "c1"),
            other => panic!("unexpected decode: {other:?}"),
        }
    }

    #[test]
    fn empty_discriminators_fall_through() {
        assert!(decode_client_frame(r#"{"subscribe":""}"#).is_none());
        assert!(decode_client_frame(r#"{"event":"","channel":"c1"}"#).is_none());
        assert!(decode_client_frame("{}").is_none());
    }

    #[test]
    fn undecodable_frames_are_ignored() {
        assert!(decode_client_frame("not json").is_none());
        assert!(decode_client_frame("").is_none());
        assert!(decode_client_frame(r#"["subscribe","c1"]"#).is_none());
    }

    #[test]
    fn render_updates_encode_with_wire_field_names() {
        let payload = serde_json::to_string(&RenderUpdate {
            render: "<span>1</span>",
            id: "c1",
        })
        .expect("encode update");
        assert_eq!(payload, r#"{"render":"<span>1</span>","id":"c1"}"#);
    }
}
