//! Provider seam: the send orchestrator depends on this trait, never on a
//! concrete HTTP client.

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::types::OutboundEmail;

/// External transactional-email delivery service. Implementations issue
/// exactly one provider call per `send` and either return the provider's
/// message id or a definitive failure; no internal retry.
#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send(&self, email: &OutboundEmail) -> Result<String, ProviderError>;
}
