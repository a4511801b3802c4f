//! HTTP routes.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header::WWW_AUTHENTICATE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tracing::{Instrument, error, info, info_span, warn};

use super::auth::{ApiKeys, AuthError};
use super::middleware::{RequestId, request_context, security_headers};
use crate::limiter::credential_prefix;
use crate::pipeline::CheckStatus;
use crate::types::{DEFAULT_OUTPUT_TOKENS, Language, SummaryRequest, SummaryResult, Tone};
use crate::{PrecisError, Summarizer};

/// Shared state passed to handlers.
#[derive(Clone)]
pub struct AppState {
    pub summarizer: Arc<Summarizer>,
    pub api_keys: Arc<ApiKeys>,
    pub max_text_length: usize,
    pub default_language: Language,
    pub request_timeout: Duration,
}

/// Build the router with all routes and middleware.
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/v1/healthz", get(healthz))
        .route("/v1/summarize", post(summarize))
        .with_state(state)
        .layer(axum::middleware::from_fn(security_headers))
        .layer(axum::middleware::from_fn(request_context))
        .layer(cors)
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    request_id: String,
}

/// Error response: `{error, message, request_id}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    kind: &'static str,
    message: String,
    request_id: String,
}

impl ApiError {
    fn new(
        status: StatusCode,
        kind: &'static str,
        message: impl Into<String>,
        request_id: &str,
    ) -> Self {
        Self {
            status,
            kind,
            message: message.into(),
            request_id: request_id.to_string(),
        }
    }

    fn validation(message: impl Into<String>, request_id: &str) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "validation_error",
            message,
            request_id,
        )
    }

    fn unauthorized(err: AuthError, request_id: &str) -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            err.message(),
            request_id,
        )
    }

    fn timeout(request_id: &str) -> Self {
        Self::new(
            StatusCode::GATEWAY_TIMEOUT,
            "timeout",
            "request timed out",
            request_id,
        )
    }

    fn from_error(err: PrecisError, request_id: &str) -> Self {
        match err {
            PrecisError::QuotaExceeded => Self::new(
                StatusCode::TOO_MANY_REQUESTS,
                "quota_exceeded",
                "rate limit exceeded, try again later",
                request_id,
            ),
            PrecisError::InvalidInput(message) => Self::validation(message, request_id),
            other => {
                error!(request_id, error = %other, "unhandled error");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "internal server error",
                    request_id,
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.kind,
            message: self.message,
            request_id: self.request_id,
        });
        let mut response = (self.status, body).into_response();
        if self.status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

// ============================================================================
// Handlers
// ============================================================================

async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "service": "precis",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "active",
        "endpoints": {
            "health": "/v1/healthz",
            "summarize": "/v1/summarize",
        },
    }))
}

#[derive(Debug, Serialize)]
struct HealthChecks {
    api: CheckStatus,
    llm_provider: CheckStatus,
    store: CheckStatus,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    latency_ms: u64,
    checks: HealthChecks,
}

async fn healthz(State(state): State<AppState>) -> Json<HealthResponse> {
    let report = state.summarizer.health().await;
    let status = if report.is_ok() { "ok" } else { "degraded" };
    info!(
        status,
        latency_ms = report.latency_ms,
        llm_provider = ?report.llm_provider,
        store = ?report.store,
        "health check completed"
    );
    Json(HealthResponse {
        status,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        latency_ms: report.latency_ms,
        checks: HealthChecks {
            api: CheckStatus::Ok,
            llm_provider: report.llm_provider,
            store: report.store,
        },
    })
}

/// Body of `POST /v1/summarize`.
#[derive(Debug, Deserialize)]
struct SummarizeBody {
    text: String,
    #[serde(default, alias = "lang")]
    language: Option<String>,
    #[serde(default, alias = "max_tokens")]
    max_output_tokens: Option<u32>,
    #[serde(default)]
    tone: Option<String>,
}

impl SummarizeBody {
    fn into_request(
        self,
        default_language: Language,
        max_text_length: usize,
    ) -> crate::Result<SummaryRequest> {
        let language = match self.language {
            Some(tag) => Language::from_str(&tag)?,
            None => default_language,
        };
        let tone = match self.tone {
            Some(tag) => Tone::from_str(&tag)?,
            None => Tone::default(),
        };
        let request = SummaryRequest::new(self.text.trim())
            .language(language)
            .max_output_tokens(self.max_output_tokens.unwrap_or(DEFAULT_OUTPUT_TOKENS))
            .tone(tone);
        request.validate(max_text_length)?;
        Ok(request)
    }
}

async fn summarize(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    headers: HeaderMap,
    body: Result<Json<SummarizeBody>, JsonRejection>,
) -> Result<Json<SummaryResult>, ApiError> {
    let credential = state
        .api_keys
        .authorize(&headers)
        .map_err(|e| ApiError::unauthorized(e, &request_id))?;

    let Json(body) = body.map_err(|e| ApiError::validation(e.body_text(), &request_id))?;
    let request = body
        .into_request(state.default_language, state.max_text_length)
        .map_err(|e| ApiError::from_error(e, &request_id))?;

    let span = info_span!("summarize", request_id = %request_id);
    async {
        info!(
            credential = credential_prefix(&credential),
            text_length = request.text.chars().count(),
            language = %request.language,
            max_output_tokens = request.max_output_tokens,
            tone = %request.tone,
            "summarization requested"
        );
        match tokio::time::timeout(
            state.request_timeout,
            state.summarizer.summarize(&credential, &request),
        )
        .await
        {
            Ok(Ok(result)) => Ok(Json(result)),
            Ok(Err(e)) => Err(ApiError::from_error(e, &request_id)),
            Err(_) => {
                warn!(
                    timeout_ms = state.request_timeout.as_millis() as u64,
                    "request timed out"
                );
                Err(ApiError::timeout(&request_id))
            }
        }
    }
    .instrument(span)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: &str) -> SummarizeBody {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn body_accepts_aliases() {
        let request = body(r#"{"text":"Hello there friend.","lang":"EN","max_tokens":50}"#)
            .into_request(Language::Auto, 1000)
            .unwrap();
        assert_eq!(request.language, Language::En);
        assert_eq!(request.max_output_tokens, 50);
        assert_eq!(request.tone, Tone::Neutral);
    }

    #[test]
    fn body_defaults() {
        let request = body(r#"{"text":"  padded text  "}"#)
            .into_request(Language::Es, 1000)
            .unwrap();
        assert_eq!(request.text, "padded text");
        assert_eq!(request.language, Language::Es);
        assert_eq!(request.max_output_tokens, DEFAULT_OUTPUT_TOKENS);
    }

    #[test]
    fn body_rejects_bad_values() {
        for json in [
            r#"{"text":"   "}"#,
            r#"{"text":"ok text","language":"xx"}"#,
            r#"{"text":"ok text","tone":"angry"}"#,
            r#"{"text":"ok text","max_output_tokens":5}"#,
            r#"{"text":"ok text","max_output_tokens":1001}"#,
        ] {
            assert!(
                matches!(
                    body(json).into_request(Language::Auto, 1000),
                    Err(PrecisError::InvalidInput(_))
                ),
                "{json}"
            );
        }
    }

    #[test]
    fn body_rejects_long_text() {
        let json = format!(r#"{{"text":"{}"}}"#, "a".repeat(101));
        assert!(body(&json).into_request(Language::Auto, 100).is_err());
    }

    #[test]
    fn quota_maps_to_429() {
        let response = ApiError::from_error(PrecisError::QuotaExceeded, "rid").into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn unauthorized_sets_challenge() {
        let response = ApiError::unauthorized(AuthError::Unknown, "rid").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[WWW_AUTHENTICATE], "Bearer");
    }
}
