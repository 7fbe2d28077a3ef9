//! # ses-client
//!
//! HTTP client for the SES-compatible transactional-email provider.
//! Implements [`EmailProvider`]: one POST per send, returning the provider's
//! message id or a definitive failure. Request signing is out of scope; the
//! endpoint authenticates with a bearer token.

use async_trait::async_trait;
use mailflow_core::{EmailProvider, OutboundEmail, ProviderError};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const SEND_PATH: &str = "/v2/email/outbound-emails";

#[derive(Clone)]
pub struct SesClient {
    client: Client,
    base_url: String,
    api_token: String,
}

impl SesClient {
    /// Client for the regional provider endpoint.
    pub fn new(api_token: String, region: &str) -> Self {
        Self::with_base_url(api_token, format!("https://email.{region}.amazonaws.com"))
    }

    /// Client for an explicit base URL (e.g. a mock server in tests).
    pub fn with_base_url(api_token: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_token,
        }
    }
}

#[async_trait]
impl EmailProvider for SesClient {
    async fn send(&self, email: &OutboundEmail) -> Result<String, ProviderError> {
        let url = format!("{}{}", self.base_url, SEND_PATH);
        let body = SendEmailBody::from(email);

        debug!(to = ?email.to, subject = %email.subject, "Dispatching send to provider");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ProviderError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(ProviderError::Rejected {
                status: status.as_u16(),
                message: text,
            });
        }

        let parsed: SendEmailResponse = serde_json::from_str(&text)
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))?;
        let message_id = parsed
            .message_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ProviderError::InvalidResponse("response without MessageId".into()))?;

        info!(provider_message_id = %message_id, "Provider accepted send");
        Ok(message_id)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailBody {
    from_email_address: String,
    destination: Destination,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_to_addresses: Option<Vec<String>>,
    content: Content,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Destination {
    to_addresses: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cc_addresses: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bcc_addresses: Option<Vec<String>>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Content {
    simple: SimpleContent,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SimpleContent {
    subject: MessagePart,
    body: Body,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct Body {
    text: MessagePart,
    #[serde(skip_serializing_if = "Option::is_none")]
    html: Option<MessagePart>,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct MessagePart {
    data: String,
    charset: &'static str,
}

impl MessagePart {
    fn utf8(data: String) -> Self {
        Self {
            data,
            charset: "UTF-8",
        }
    }
}

impl From<&OutboundEmail> for SendEmailBody {
    fn from(email: &OutboundEmail) -> Self {
        Self {
            from_email_address: email.source.clone(),
            destination: Destination {
                to_addresses: email.to.clone(),
                cc_addresses: email.cc.clone(),
                bcc_addresses: email.bcc.clone(),
            },
            reply_to_addresses: email.reply_to.clone(),
            content: Content {
                simple: SimpleContent {
                    subject: MessagePart::utf8(email.subject.clone()),
                    body: Body {
                        text: MessagePart::utf8(email.body_text.clone()),
                        html: email.body_html.clone().map(MessagePart::utf8),
                    },
                },
            },
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailResponse {
    message_id: Option<String>,
}
