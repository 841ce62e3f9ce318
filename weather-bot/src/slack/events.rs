//! Socket Mode envelopes and the event payloads the bot reacts to.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

/// Raw frame as received on the Socket Mode websocket.
#[derive(Debug, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub envelope_id: Option<String>,
    #[serde(default)]
    pub payload: Value,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Hello,
    Disconnect { reason: Option<String> },
    Event { envelope_id: String, event: SlackEvent },
    Interaction { envelope_id: String, payload: InteractionPayload },
    /// Any other envelope; acknowledged when it carries an id, otherwise dropped.
    Other { kind: String, envelope_id: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SlackEvent {
    Message(MessageEvent),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MessageEvent {
    pub channel: String,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub subtype: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
}

// Subtypes that never carry a fresh message from a person.
const NON_USER_SUBTYPES: &[&str] = &["bot_message", "message_changed", "message_deleted"];

impl MessageEvent {
    /// Messages written by a person, as opposed to bot posts, edits or deletions.
    /// User-authored subtypes such as `file_share` or `thread_broadcast` count.
    pub fn is_from_user(&self) -> bool {
        self.bot_id.is_none()
            && self.user.is_some()
            && !self.subtype.as_deref().is_some_and(|s| NON_USER_SUBTYPES.contains(&s))
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InteractionPayload {
    BlockActions(BlockActions),
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockActions {
    pub user: SlackUser,
    #[serde(default)]
    pub channel: Option<SlackChannel>,
    #[serde(default)]
    pub actions: Vec<BlockAction>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SlackUser {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SlackChannel {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockAction {
    pub action_id: String,
    #[serde(default)]
    pub value: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventCallback {
    event: SlackEvent,
}

impl Envelope {
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("Failed to parse Socket Mode envelope")
    }

    pub fn into_inbound(self) -> Result<Inbound> {
        let Envelope { kind, envelope_id, payload, reason } = self;

        let inbound = match (kind.as_str(), envelope_id) {
            ("hello", _) => Inbound::Hello,
            ("disconnect", _) => Inbound::Disconnect { reason },
            ("events_api", Some(envelope_id)) => {
                let callback: EventCallback = serde_json::from_value(payload)
                    .with_context(|| format!("Malformed events_api payload in {envelope_id}"))?;
                Inbound::Event { envelope_id, event: callback.event }
            }
            ("interactive", Some(envelope_id)) => {
                let payload = serde_json::from_value(payload)
                    .with_context(|| format!("Malformed interactive payload in {envelope_id}"))?;
                Inbound::Interaction { envelope_id, payload }
            }
            (_, envelope_id) => Inbound::Other { kind: kind.clone(), envelope_id },
        };

        Ok(inbound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inbound(text: &str) -> Inbound {
        Envelope::parse(text).unwrap().into_inbound().unwrap()
    }

    #[test]
    fn parses_hello_and_disconnect() {
        assert_eq!(inbound(r#"{"type":"hello","num_connections":1}"#), Inbound::Hello);
        assert_eq!(
            inbound(r#"{"type":"disconnect","reason":"refresh_requested"}"#),
            Inbound::Disconnect { reason: Some("refresh_requested".into()) }
        );
    }

    #[test]
    fn parses_message_event() {
        let got = inbound(
            r#"{
                "envelope_id": "env-1",
                "type": "events_api",
                "accepts_response_payload": false,
                "payload": {
                    "type": "event_callback",
                    "event": {
                        "type": "message",
                        "channel": "D123",
                        "user": "U42",
                        "text": "hi",
                        "ts": "1697630400.000100"
                    }
                }
            }"#,
        );

        let Inbound::Event { envelope_id, event: SlackEvent::Message(message) } = got else {
            panic!("expected a message event, got {got:?}");
        };
        assert_eq!(envelope_id, "env-1");
        assert_eq!(message.channel, "D123");
        assert_eq!(message.user.as_deref(), Some("U42"));
        assert!(message.is_from_user());
    }

    #[test]
    fn bot_and_edited_messages_are_not_from_user() {
        let bot: MessageEvent = serde_json::from_str(
            r#"{"channel":"D1","user":"U1","bot_id":"B1","text":"Hi <@U42>"}"#,
        )
        .unwrap();
        assert!(!bot.is_from_user());

        let edited: MessageEvent =
            serde_json::from_str(r#"{"channel":"D1","subtype":"message_changed"}"#).unwrap();
        assert!(!edited.is_from_user());

        let deleted: MessageEvent = serde_json::from_str(
            r#"{"channel":"D1","user":"U1","subtype":"message_deleted"}"#,
        )
        .unwrap();
        assert!(!deleted.is_from_user());

        let bot_message: MessageEvent =
            serde_json::from_str(r#"{"channel":"D1","user":"U1","subtype":"bot_message"}"#)
                .unwrap();
        assert!(!bot_message.is_from_user());
    }

    #[test]
    fn user_authored_subtypes_are_from_user() {
        for subtype in ["file_share", "thread_broadcast"] {
            let message: MessageEvent = serde_json::from_str(&format!(
                r#"{{"channel":"C1","user":"U42","subtype":"{subtype}","text":"look"}}"#
            ))
            .unwrap();
            assert!(message.is_from_user(), "{subtype} should be answered");
        }
    }

    #[test]
    fn other_event_types_are_unsupported() {
        let got = inbound(
            r#"{"envelope_id":"env-2","type":"events_api",
                "payload":{"event":{"type":"app_mention","channel":"C1"}}}"#,
        );
        assert_eq!(
            got,
            Inbound::Event { envelope_id: "env-2".into(), event: SlackEvent::Unsupported }
        );
    }

    #[test]
    fn parses_block_actions() {
        let got = inbound(
            r#"{
                "envelope_id": "env-3",
                "type": "interactive",
                "payload": {
                    "type": "block_actions",
                    "user": { "id": "U42", "username": "ada" },
                    "channel": { "id": "D123", "name": "directmessage" },
                    "actions": [{
                        "type": "plain_text_input",
                        "block_id": "abc",
                        "action_id": "pick_a_city",
                        "value": "London",
                        "action_ts": "1697630400.1"
                    }]
                }
            }"#,
        );

        let Inbound::Interaction { payload: InteractionPayload::BlockActions(actions), .. } = got
        else {
            panic!("expected block actions, got {got:?}");
        };
        assert_eq!(actions.user.id, "U42");
        assert_eq!(actions.channel.map(|c| c.id).as_deref(), Some("D123"));
        assert_eq!(actions.actions[0].action_id, "pick_a_city");
        assert_eq!(actions.actions[0].value.as_deref(), Some("London"));
    }

    #[test]
    fn unknown_envelope_keeps_its_id() {
        assert_eq!(
            inbound(r#"{"envelope_id":"env-4","type":"slash_commands","payload":{}}"#),
            Inbound::Other { kind: "slash_commands".into(), envelope_id: Some("env-4".into()) }
        );
    }

    #[test]
    fn malformed_payload_is_an_error() {
        let envelope = Envelope::parse(
            r#"{"envelope_id":"env-5","type":"interactive","payload":{"type":"block_actions"}}"#,
        )
        .unwrap();
        assert!(envelope.into_inbound().is_err());
    }
}
