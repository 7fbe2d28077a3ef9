//! Thin axum routing layer: translate HTTP to service calls and outcomes to
//! status codes. No invariants live here.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{Duration, Months, Utc};
use mailflow_core::{EmailProvider, SendEmailRequest};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::EmailRepository;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::event_service::{EventError, EventService, ReconcileOutcome};
use crate::send_service::{SendError, SendService};

#[derive(Clone)]
pub struct AppState {
    pub send_service: Arc<SendService>,
    pub event_service: Arc<EventService>,
    pub repo: EmailRepository,
    pub api_key: Option<String>,
}

impl AppState {
    pub fn new(
        repo: EmailRepository,
        provider: Arc<dyn EmailProvider>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            send_service: Arc::new(SendService::new(repo.clone(), provider)),
            event_service: Arc::new(EventService::new(repo.clone())),
            repo,
            api_key,
        }
    }
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/send/email", post(send_email))
        .route("/email/events", post(email_events))
        .route("/metrics/daily", get(daily_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> impl IntoResponse {
    StatusCode::OK
}

#[derive(Serialize)]
struct SendFailure {
    status: &'static str,
    error: String,
}

async fn send_email(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<SendEmailRequest>,
) -> Response {
    // External auth gate stand-in: allow/deny only, no token store.
    if let Some(expected) = &state.api_key {
        let supplied = headers.get("x-api-key").and_then(|v| v.to_str().ok());
        if supplied != Some(expected.as_str()) {
            return (
                StatusCode::FORBIDDEN,
                Json(SendFailure {
                    status: "failed",
                    error: "invalid api key".to_string(),
                }),
            )
                .into_response();
        }
    }

    match state.send_service.send(&request).await {
        Ok(receipt) => (StatusCode::OK, Json(receipt)).into_response(),
        Err(SendError::Invalid(message)) => (
            StatusCode::BAD_REQUEST,
            Json(SendFailure {
                status: "failed",
                error: message,
            }),
        )
            .into_response(),
        Err(SendError::Provider(provider_error)) => (
            StatusCode::BAD_GATEWAY,
            Json(SendFailure {
                status: "failed",
                error: provider_error.to_string(),
            }),
        )
            .into_response(),
        Err(SendError::Storage(store_error)) => {
            error!(error = %store_error, "Send failed on storage");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SendFailure {
                    status: "failed",
                    error: "storage unavailable".to_string(),
                }),
            )
                .into_response()
        }
    }
}

#[derive(Serialize)]
struct EventResponse {
    processed: bool,
    outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    provider_message_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    confirmation_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

impl From<ReconcileOutcome> for EventResponse {
    fn from(outcome: ReconcileOutcome) -> Self {
        let empty = Self {
            processed: false,
            outcome: "ignored",
            provider_message_id: None,
            confirmation_url: None,
            detail: None,
        };
        match outcome {
            ReconcileOutcome::Applied {
                provider_message_id,
                ..
            } => Self {
                processed: true,
                outcome: "applied",
                provider_message_id: Some(provider_message_id),
                ..empty
            },
            ReconcileOutcome::Duplicate {
                provider_message_id,
            } => Self {
                processed: true,
                outcome: "duplicate",
                provider_message_id: Some(provider_message_id),
                ..empty
            },
            ReconcileOutcome::NoMatch {
                provider_message_id,
            } => Self {
                processed: false,
                outcome: "no_match",
                provider_message_id: Some(provider_message_id),
                ..empty
            },
            ReconcileOutcome::Ignored { kind } => Self {
                processed: false,
                outcome: "ignored",
                detail: Some(kind),
                ..empty
            },
            ReconcileOutcome::Handshake { confirmation_url } => Self {
                processed: false,
                outcome: "subscription",
                confirmation_url: Some(confirmation_url),
                ..empty
            },
            ReconcileOutcome::ParseFailure { reason } => Self {
                processed: false,
                outcome: "parse_error",
                detail: Some(reason),
                ..empty
            },
        }
    }
}

/// The transport treats any non-2xx as "redeliver", so only a body it is
/// itself responsible for (missing/non-JSON) or a store failure earns one.
async fn email_events(State(state): State<AppState>, body: Bytes) -> Response {
    match state.event_service.handle_notification(&body).await {
        Ok(outcome) => (StatusCode::OK, Json(EventResponse::from(outcome))).into_response(),
        Err(EventError::BadRequest(parse_error)) => (
            StatusCode::BAD_REQUEST,
            Json(EventResponse {
                processed: false,
                outcome: "bad_request",
                provider_message_id: None,
                confirmation_url: None,
                detail: Some(parse_error.to_string()),
            }),
        )
            .into_response(),
        Err(EventError::Storage(store_error)) => {
            // Redelivery after a transient store failure is safe: application
            // is idempotent under the dedup key.
            error!(error = %store_error, "Event reconciliation failed on storage");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[derive(Deserialize)]
struct MetricsQuery {
    months: Option<u32>,
    days: Option<i64>,
}

async fn daily_metrics(
    State(state): State<AppState>,
    Query(query): Query<MetricsQuery>,
) -> Response {
    let now = Utc::now();
    let window_start = match (query.days, query.months) {
        // days comes from the query string; out-of-range or negative values
        // must answer, not panic the handler.
        (Some(days), _) => match Duration::try_days(days).filter(|_| days >= 0) {
            Some(window) => now - window,
            None => return StatusCode::BAD_REQUEST.into_response(),
        },
        (None, months) => {
            let months = months.unwrap_or(1);
            match now.checked_sub_months(Months::new(months)) {
                Some(start) => start,
                None => return StatusCode::BAD_REQUEST.into_response(),
            }
        }
    };

    match state.repo.daily_metrics(window_start).await {
        Ok(buckets) => (StatusCode::OK, Json(buckets)).into_response(),
        Err(store_error) => {
            error!(error = %store_error, "Metrics query failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
