//! # mailflow-core
//!
//! Core types and traits for the email delivery service: send request and
//! outbound message types, the delivery-event model, the notification envelope
//! parser, the [`EmailProvider`] trait, and tracing initialization.
//! Transport-agnostic; used by storage, ses-client and mailflow-api.

pub mod envelope;
pub mod error;
pub mod logger;
pub mod provider;
pub mod types;

pub use envelope::{parse_envelope, DeliveryEvent, Envelope};
pub use error::{ParseError, ProviderError};
pub use logger::init_tracing;
pub use provider::EmailProvider;
pub use types::{
    EmailContent, EmailStatus, EventKind, OutboundEmail, Recipient, SendEmailRequest,
};
