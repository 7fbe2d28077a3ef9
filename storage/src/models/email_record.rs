//! Message record model for persistence.
//!
//! Maps to the `email_logs` table: one row per accepted send attempt, holding
//! the immutable request snapshot, current status and engagement counters.

use chrono::{DateTime, Utc};
use mailflow_core::{EmailStatus, Recipient, SendEmailRequest};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EmailRecord {
    pub id: String,
    /// Provider-assigned id; null until the provider accepts the send, then
    /// set exactly once. Join key for all later delivery events.
    pub provider_message_id: Option<String>,
    pub sender: String,
    pub sender_name: Option<String>,
    /// JSON array of `{email, name?}`.
    pub recipients: String,
    pub cc: Option<String>,
    pub bcc: Option<String>,
    pub subject: String,
    pub status: String,
    pub is_success: bool,
    pub opens: i64,
    pub clicks: i64,
    pub bounces: i64,
    pub complaints: i64,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl EmailRecord {
    /// Builds the durable-intent row for a send request: `Sending` status,
    /// counters zero, provider id unset, generated UUID and current timestamp.
    pub fn pending(request: &SendEmailRequest) -> Result<Self, serde_json::Error> {
        let encode = |list: &Option<Vec<Recipient>>| -> Result<Option<String>, serde_json::Error> {
            list.as_ref().map(serde_json::to_string).transpose()
        };
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            provider_message_id: None,
            sender: request.sender.clone(),
            sender_name: request.sender_name.clone(),
            recipients: serde_json::to_string(&request.recipients)?,
            cc: encode(&request.cc)?,
            bcc: encode(&request.bcc)?,
            subject: request.content.subject.clone(),
            status: EmailStatus::Sending.as_str().to_string(),
            is_success: false,
            opens: 0,
            clicks: 0,
            bounces: 0,
            complaints: 0,
            error_message: None,
            created_at: Utc::now(),
        })
    }

    /// Decodes the persisted recipient list.
    pub fn recipient_list(&self) -> Result<Vec<Recipient>, serde_json::Error> {
        serde_json::from_str(&self.recipients)
    }

    pub fn email_status(&self) -> Option<EmailStatus> {
        EmailStatus::parse(&self.status)
    }
}
