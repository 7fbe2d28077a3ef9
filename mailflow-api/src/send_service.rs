//! Send orchestration: durable intent, one provider call, finalized outcome.

use mailflow_core::{EmailProvider, ProviderError, SendEmailRequest};
use serde::Serialize;
use std::sync::Arc;
use storage::{EmailRepository, StorageError};
use thiserror::Error;
use tracing::{error, info, instrument, warn};

/// What the caller gets back for an accepted send. The provider message id is
/// the only handle later notifications will reference.
#[derive(Debug, Clone, Serialize)]
pub struct SendReceipt {
    pub provider_message_id: String,
    pub status: String,
}

#[derive(Error, Debug)]
pub enum SendError {
    #[error("Invalid send request: {0}")]
    Invalid(String),

    #[error("{0}")]
    Provider(#[from] ProviderError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Turns a validated send request into a provider call, creating and advancing
/// one message record per request. Retrying the same logical request creates a
/// second, independent record; only notifications are deduplicated.
pub struct SendService {
    repo: EmailRepository,
    provider: Arc<dyn EmailProvider>,
}

impl SendService {
    pub fn new(repo: EmailRepository, provider: Arc<dyn EmailProvider>) -> Self {
        Self { repo, provider }
    }

    /// Orchestrates one send: persist the record in `Sending` status first (so
    /// a crash mid-call still leaves an auditable trail), issue exactly one
    /// provider call, then finalize the record as `Sent` or `Failed`. A
    /// failing intent write means the provider is never contacted.
    #[instrument(skip(self, request), fields(sender = %request.sender))]
    pub async fn send(&self, request: &SendEmailRequest) -> Result<SendReceipt, SendError> {
        validate(request)?;

        let record = self.repo.create_pending(request).await?;

        match self.provider.send(&request.to_outbound()).await {
            Ok(provider_message_id) => {
                self.repo
                    .finalize_sent(&record.id, &provider_message_id)
                    .await?;
                info!(
                    record_id = %record.id,
                    provider_message_id = %provider_message_id,
                    "Send accepted by provider"
                );
                Ok(SendReceipt {
                    provider_message_id,
                    status: "accepted".to_string(),
                })
            }
            Err(provider_error) => {
                warn!(record_id = %record.id, error = %provider_error, "Provider rejected send");
                if let Err(store_error) = self
                    .repo
                    .finalize_failed(&record.id, &provider_error.to_string())
                    .await
                {
                    error!(record_id = %record.id, error = %store_error, "Failed to record send failure");
                }
                Err(SendError::Provider(provider_error))
            }
        }
    }
}

fn validate(request: &SendEmailRequest) -> Result<(), SendError> {
    if request.sender.trim().is_empty() {
        return Err(SendError::Invalid("sender must not be empty".into()));
    }
    if request.recipients.is_empty() {
        return Err(SendError::Invalid("at least one recipient required".into()));
    }
    if request.recipients.iter().any(|r| r.email.trim().is_empty()) {
        return Err(SendError::Invalid("recipient email must not be empty".into()));
    }
    if request.content.subject.trim().is_empty() {
        return Err(SendError::Invalid("subject must not be empty".into()));
    }
    Ok(())
}
