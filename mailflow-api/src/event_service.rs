//! Notification reconciliation: parse the envelope, apply the event, report
//! an explicit outcome. Problems with individual notifications are data, not
//! errors; a batch of independent deliveries never short-circuits.

use mailflow_core::{parse_envelope, Envelope, ParseError};
use storage::{ApplyOutcome, EmailRepository, StorageError};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

/// Outcome of one webhook delivery, as reported back to the transport.
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    Applied {
        provider_message_id: String,
        status_changed: bool,
    },
    /// Already applied under the same dedup key; the earlier effect stands.
    Duplicate { provider_message_id: String },
    NoMatch { provider_message_id: String },
    /// Event kind with no effect, or an envelope type we do not handle.
    Ignored { kind: String },
    /// Handshake confirmation is an operational action; the URL is only
    /// extracted and logged here.
    Handshake { confirmation_url: String },
    /// The nested payload could not be decoded; reported, not fatal.
    ParseFailure { reason: String },
}

#[derive(Error, Debug)]
pub enum EventError {
    /// The transport itself sent an empty or non-JSON body; the one case
    /// where a client-error status is appropriate.
    #[error("Bad notification body: {0}")]
    BadRequest(ParseError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Applies parsed delivery events to the message record store.
pub struct EventService {
    repo: EmailRepository,
}

impl EventService {
    pub fn new(repo: EmailRepository) -> Self {
        Self { repo }
    }

    /// Handles one raw webhook body end to end.
    #[instrument(skip(self, body))]
    pub async fn handle_notification(&self, body: &[u8]) -> Result<ReconcileOutcome, EventError> {
        let envelope = match parse_envelope(body) {
            Ok(envelope) => envelope,
            Err(e @ (ParseError::EmptyBody | ParseError::InvalidJson(_))) => {
                return Err(EventError::BadRequest(e));
            }
            Err(e) => {
                warn!(error = %e, "Discarding undecodable notification");
                return Ok(ReconcileOutcome::ParseFailure {
                    reason: e.to_string(),
                });
            }
        };

        match envelope {
            Envelope::SubscriptionHandshake { confirmation_url } => {
                warn!(url = %confirmation_url, "Subscription handshake received; confirm out of band");
                Ok(ReconcileOutcome::Handshake { confirmation_url })
            }
            Envelope::Other { kind } => {
                info!(kind = %kind, "Ignoring unhandled envelope type");
                Ok(ReconcileOutcome::Ignored { kind })
            }
            Envelope::Notification { event } => {
                debug!(
                    provider_message_id = %event.provider_message_id,
                    event = %event.kind,
                    event_timestamp = ?event.timestamp,
                    detail = ?event.detail,
                    "Handling delivery event"
                );
                let outcome = self.repo.apply_event(&event).await?;
                let provider_message_id = event.provider_message_id;
                match outcome {
                    ApplyOutcome::Applied { status_changed } => {
                        info!(
                            provider_message_id = %provider_message_id,
                            event = %event.kind,
                            status_changed,
                            "Reconciled delivery event"
                        );
                        Ok(ReconcileOutcome::Applied {
                            provider_message_id,
                            status_changed,
                        })
                    }
                    ApplyOutcome::Duplicate => {
                        info!(
                            provider_message_id = %provider_message_id,
                            dedup_key = %event.dedup_key,
                            "Skipping redelivered notification"
                        );
                        Ok(ReconcileOutcome::Duplicate {
                            provider_message_id,
                        })
                    }
                    ApplyOutcome::NoMatch => {
                        warn!(
                            provider_message_id = %provider_message_id,
                            event = %event.kind,
                            "No matching record for event"
                        );
                        Ok(ReconcileOutcome::NoMatch {
                            provider_message_id,
                        })
                    }
                    ApplyOutcome::Ignored => Ok(ReconcileOutcome::Ignored {
                        kind: event.kind.to_string(),
                    }),
                }
            }
        }
    }
}
