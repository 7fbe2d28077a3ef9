//! Notification envelope parser.
//!
//! Decodes the transport wrapper (subscription handshake vs. event
//! notification) and the nested delivery-event payload. The inner `Message`
//! field is a JSON-encoded string; the event's join key lives at
//! `mail.messageId`. Decoding failures are reported per notification and never
//! abort processing of other notifications.

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::ParseError;
use crate::types::EventKind;

/// Decoded transport envelope.
#[derive(Debug, Clone)]
pub enum Envelope {
    /// Subscription handshake; the confirmation URL is only extracted here,
    /// confirming it is an operational action left to the caller.
    SubscriptionHandshake { confirmation_url: String },
    /// An actual delivery-lifecycle notification.
    Notification { event: DeliveryEvent },
    /// Any other envelope type; acknowledged and discarded.
    Other { kind: String },
}

/// A single parsed delivery-lifecycle event.
#[derive(Debug, Clone)]
pub struct DeliveryEvent {
    pub kind: EventKind,
    /// Provider-assigned message id; join key for the message record.
    pub provider_message_id: String,
    pub timestamp: Option<DateTime<Utc>>,
    /// Identifies this physical notification across redeliveries. The
    /// transport-assigned envelope `MessageId` when present, a deterministic
    /// derivation otherwise.
    pub dedup_key: String,
    /// Event-specific sub-object (`bounce`, `complaint`, ...) kept for logging.
    pub detail: Option<Value>,
}

/// Parses a raw webhook body into an [`Envelope`].
pub fn parse_envelope(raw: &[u8]) -> Result<Envelope, ParseError> {
    if raw.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(ParseError::EmptyBody);
    }

    let outer: Value =
        serde_json::from_slice(raw).map_err(|e| ParseError::InvalidJson(e.to_string()))?;

    let envelope_type = outer.get("Type").and_then(Value::as_str).unwrap_or("");
    match envelope_type {
        "SubscriptionConfirmation" => {
            let url = outer
                .get("SubscribeURL")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ParseError::InvalidJson("SubscriptionConfirmation without SubscribeURL".into())
                })?;
            Ok(Envelope::SubscriptionHandshake {
                confirmation_url: url.to_string(),
            })
        }
        "Notification" => {
            let inner = outer
                .get("Message")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|m| !m.is_empty())
                .ok_or(ParseError::MissingMessage)?;
            let payload: Value = serde_json::from_str(inner)
                .map_err(|e| ParseError::InvalidInnerJson(e.to_string()))?;
            let event = parse_event(&outer, &payload)?;
            Ok(Envelope::Notification { event })
        }
        other => Ok(Envelope::Other {
            kind: other.to_string(),
        }),
    }
}

fn parse_event(outer: &Value, payload: &Value) -> Result<DeliveryEvent, ParseError> {
    let raw_kind = payload
        .get("eventType")
        .or_else(|| payload.get("notificationType"))
        .and_then(Value::as_str)
        .unwrap_or("");
    let kind = EventKind::normalize(raw_kind);

    let mail = payload.get("mail").unwrap_or(&Value::Null);
    let provider_message_id = mail
        .get("messageId")
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty())
        .ok_or(ParseError::MissingMessageId)?
        .to_string();

    let raw_timestamp = mail.get("timestamp").and_then(Value::as_str);
    let timestamp = raw_timestamp
        .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
        .map(|t| t.with_timezone(&Utc));

    // Transport id when present; otherwise derive a stable key so replayed
    // payloads without one still collapse to a single application.
    let dedup_key = outer
        .get("MessageId")
        .and_then(Value::as_str)
        .filter(|id| !id.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            format!(
                "{}:{}:{}",
                provider_message_id,
                kind,
                raw_timestamp.unwrap_or("-")
            )
        });

    let detail = payload.get(kind.as_str()).cloned().filter(|d| !d.is_null());

    Ok(DeliveryEvent {
        kind,
        provider_message_id,
        timestamp,
        dedup_key,
        detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn notification(message: &str) -> String {
        serde_json::json!({
            "Type": "Notification",
            "MessageId": "sns-123",
            "Message": message,
        })
        .to_string()
    }

    #[test]
    fn parses_subscription_handshake() {
        let body = serde_json::json!({
            "Type": "SubscriptionConfirmation",
            "SubscribeURL": "https://sns.example.com/confirm?token=abc",
        })
        .to_string();

        match parse_envelope(body.as_bytes()).unwrap() {
            Envelope::SubscriptionHandshake { confirmation_url } => {
                assert_eq!(confirmation_url, "https://sns.example.com/confirm?token=abc");
            }
            other => panic!("unexpected envelope: {:?}", other),
        }
    }

    #[test]
    fn parses_bounce_notification() {
        let inner = serde_json::json!({
            "eventType": "Bounce",
            "mail": { "messageId": "abc123", "timestamp": "2024-05-01T10:00:00Z" },
            "bounce": { "bounceType": "Permanent" },
        })
        .to_string();

        match parse_envelope(notification(&inner).as_bytes()).unwrap() {
            Envelope::Notification { event } => {
                assert_eq!(event.kind, EventKind::Bounce);
                assert_eq!(event.provider_message_id, "abc123");
                assert_eq!(event.dedup_key, "sns-123");
                assert!(event.timestamp.is_some());
                assert!(event.detail.is_some());
            }
            other => panic!("unexpected envelope: {:?}", other),
        }
    }

    #[test]
    fn falls_back_to_notification_type_field() {
        let inner = serde_json::json!({
            "notificationType": "Complaint",
            "mail": { "messageId": "abc123" },
        })
        .to_string();

        match parse_envelope(notification(&inner).as_bytes()).unwrap() {
            Envelope::Notification { event } => assert_eq!(event.kind, EventKind::Complaint),
            other => panic!("unexpected envelope: {:?}", other),
        }
    }

    #[test]
    fn derives_dedup_key_when_transport_id_missing() {
        let inner = serde_json::json!({
            "eventType": "open",
            "mail": { "messageId": "abc123", "timestamp": "2024-05-01T10:00:00Z" },
        })
        .to_string();
        let body = serde_json::json!({ "Type": "Notification", "Message": inner }).to_string();

        match parse_envelope(body.as_bytes()).unwrap() {
            Envelope::Notification { event } => {
                assert_eq!(event.dedup_key, "abc123:open:2024-05-01T10:00:00Z");
            }
            other => panic!("unexpected envelope: {:?}", other),
        }
    }

    #[test]
    fn unknown_envelope_type_is_other() {
        let body = serde_json::json!({ "Type": "UnsubscribeConfirmation" }).to_string();
        match parse_envelope(body.as_bytes()).unwrap() {
            Envelope::Other { kind } => assert_eq!(kind, "UnsubscribeConfirmation"),
            other => panic!("unexpected envelope: {:?}", other),
        }
    }

    #[test]
    fn rejects_empty_body() {
        assert!(matches!(parse_envelope(b""), Err(ParseError::EmptyBody)));
        assert!(matches!(parse_envelope(b"   \n"), Err(ParseError::EmptyBody)));
    }

    #[test]
    fn rejects_invalid_outer_json() {
        assert!(matches!(
            parse_envelope(b"{not json"),
            Err(ParseError::InvalidJson(_))
        ));
    }

    #[test]
    fn rejects_missing_or_non_string_message() {
        let missing = serde_json::json!({ "Type": "Notification" }).to_string();
        assert!(matches!(
            parse_envelope(missing.as_bytes()),
            Err(ParseError::MissingMessage)
        ));

        let non_string =
            serde_json::json!({ "Type": "Notification", "Message": { "a": 1 } }).to_string();
        assert!(matches!(
            parse_envelope(non_string.as_bytes()),
            Err(ParseError::MissingMessage)
        ));

        let blank = serde_json::json!({ "Type": "Notification", "Message": "  " }).to_string();
        assert!(matches!(
            parse_envelope(blank.as_bytes()),
            Err(ParseError::MissingMessage)
        ));
    }

    #[test]
    fn rejects_unparseable_inner_message() {
        let body =
            serde_json::json!({ "Type": "Notification", "Message": "{broken" }).to_string();
        assert!(matches!(
            parse_envelope(body.as_bytes()),
            Err(ParseError::InvalidInnerJson(_))
        ));
    }

    #[test]
    fn rejects_event_without_message_id() {
        let inner = serde_json::json!({ "eventType": "Open", "mail": {} }).to_string();
        assert!(matches!(
            parse_envelope(notification(&inner).as_bytes()),
            Err(ParseError::MissingMessageId)
        ));
    }
}
