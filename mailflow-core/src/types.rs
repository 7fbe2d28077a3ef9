//! Core types: recipients, send request, outbound message, record status and
//! delivery-event kinds.

use serde::{Deserialize, Serialize};

/// Email recipient with address and optional display name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Subject and body of a message. Plain text is mandatory, HTML optional.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailContent {
    pub subject: String,
    pub body_text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body_html: Option<String>,
}

/// A validated send request as accepted by the send endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SendEmailRequest {
    pub sender: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    pub recipients: Vec<Recipient>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cc: Option<Vec<Recipient>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bcc: Option<Vec<Recipient>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<Vec<String>>,
    pub content: EmailContent,
}

impl SendEmailRequest {
    /// Formats the sender as `"Name <address>"` when a display name is set,
    /// plain address otherwise.
    pub fn formatted_sender(&self) -> String {
        match &self.sender_name {
            Some(name) => format!("{} <{}>", name, self.sender),
            None => self.sender.clone(),
        }
    }

    /// Builds the provider-facing message: formatted sender, bare addresses,
    /// optional parts only when supplied.
    pub fn to_outbound(&self) -> OutboundEmail {
        let addresses = |list: &Option<Vec<Recipient>>| {
            list.as_ref()
                .map(|rs| rs.iter().map(|r| r.email.clone()).collect())
        };
        OutboundEmail {
            source: self.formatted_sender(),
            to: self.recipients.iter().map(|r| r.email.clone()).collect(),
            cc: addresses(&self.cc),
            bcc: addresses(&self.bcc),
            reply_to: self.reply_to.clone(),
            subject: self.content.subject.clone(),
            body_text: self.content.body_text.clone(),
            body_html: self.content.body_html.clone(),
        }
    }
}

/// The message as handed to the provider, addressing already flattened.
#[derive(Debug, Clone)]
pub struct OutboundEmail {
    pub source: String,
    pub to: Vec<String>,
    pub cc: Option<Vec<String>>,
    pub bcc: Option<Vec<String>>,
    pub reply_to: Option<Vec<String>>,
    pub subject: String,
    pub body_text: String,
    pub body_html: Option<String>,
}

/// Lifecycle status of a message record.
///
/// `Pending -> Sending -> Sent -> {Delivered, Bounced, Complaint}`; `Failed`
/// is reachable only from `Sending`. `Bounced` and `Complaint` dominate
/// `Delivered` and never replace each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmailStatus {
    Pending,
    Sending,
    Sent,
    Delivered,
    Bounced,
    Complaint,
    Failed,
}

impl EmailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmailStatus::Pending => "Pending",
            EmailStatus::Sending => "Sending",
            EmailStatus::Sent => "Sent",
            EmailStatus::Delivered => "Delivered",
            EmailStatus::Bounced => "Bounced",
            EmailStatus::Complaint => "Complaint",
            EmailStatus::Failed => "Failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Pending" => Some(EmailStatus::Pending),
            "Sending" => Some(EmailStatus::Sending),
            "Sent" => Some(EmailStatus::Sent),
            "Delivered" => Some(EmailStatus::Delivered),
            "Bounced" => Some(EmailStatus::Bounced),
            "Complaint" => Some(EmailStatus::Complaint),
            "Failed" => Some(EmailStatus::Failed),
            _ => None,
        }
    }

}

impl std::fmt::Display for EmailStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Delivery-lifecycle event kind as reported by the provider, normalized
/// case-insensitively. Unrecognized kinds are kept for logging and otherwise
/// acknowledged and discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Send,
    Bounce,
    Complaint,
    Delivery,
    Open,
    Click,
    Reject,
    Other(String),
}

impl EventKind {
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "send" => EventKind::Send,
            "bounce" => EventKind::Bounce,
            "complaint" => EventKind::Complaint,
            "delivery" => EventKind::Delivery,
            "open" => EventKind::Open,
            "click" => EventKind::Click,
            "reject" => EventKind::Reject,
            other => EventKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::Send => "send",
            EventKind::Bounce => "bounce",
            EventKind::Complaint => "complaint",
            EventKind::Delivery => "delivery",
            EventKind::Open => "open",
            EventKind::Click => "click",
            EventKind::Reject => "reject",
            EventKind::Other(s) => s,
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formatted_sender_with_and_without_name() {
        let mut req = sample_request();
        assert_eq!(req.formatted_sender(), "Alice <alice@example.com>");
        req.sender_name = None;
        assert_eq!(req.formatted_sender(), "alice@example.com");
    }

    #[test]
    fn to_outbound_skips_absent_parts() {
        let req = sample_request();
        let out = req.to_outbound();
        assert_eq!(out.to, vec!["bob@example.com", "carol@example.com"]);
        assert!(out.cc.is_none());
        assert!(out.bcc.is_none());
        assert!(out.body_html.is_none());
    }

    #[test]
    fn event_kind_normalization_is_case_insensitive() {
        assert_eq!(EventKind::normalize("Bounce"), EventKind::Bounce);
        assert_eq!(EventKind::normalize("DELIVERY"), EventKind::Delivery);
        assert_eq!(EventKind::normalize(" open "), EventKind::Open);
        assert_eq!(
            EventKind::normalize("Rendering Failure"),
            EventKind::Other("rendering failure".to_string())
        );
    }

    #[test]
    fn status_round_trips() {
        for s in [
            EmailStatus::Pending,
            EmailStatus::Sending,
            EmailStatus::Sent,
            EmailStatus::Delivered,
            EmailStatus::Bounced,
            EmailStatus::Complaint,
            EmailStatus::Failed,
        ] {
            assert_eq!(EmailStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(EmailStatus::parse("nope"), None);
    }

    fn sample_request() -> SendEmailRequest {
        SendEmailRequest {
            sender: "alice@example.com".to_string(),
            sender_name: Some("Alice".to_string()),
            recipients: vec![
                Recipient {
                    email: "bob@example.com".to_string(),
                    name: Some("Bob".to_string()),
                },
                Recipient {
                    email: "carol@example.com".to_string(),
                    name: None,
                },
            ],
            cc: None,
            bcc: None,
            reply_to: None,
            content: EmailContent {
                subject: "Hello".to_string(),
                body_text: "Hi there".to_string(),
                body_html: None,
            },
        }
    }
}
