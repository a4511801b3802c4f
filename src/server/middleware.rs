//! HTTP middleware: request ids, timing, security headers, CORS.

use std::time::Instant;

use axum::extract::Request;
use axum::http::{HeaderName, HeaderValue, Method};
use axum::middleware::Next;
use axum::response::Response;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::info;

use crate::{PrecisError, Result};

pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const RESPONSE_TIME_HEADER: &str = "x-response-time";

/// Per-request id, stored in request extensions.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Assign a request id, log start and finish, and stamp the id and
/// elapsed time on the response.
pub async fn request_context(mut request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    info!(request_id = %request_id, %method, %path, "request started");
    let start = Instant::now();
    let mut response = next.run(request).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let headers = response.headers_mut();
    if let Ok(v) = HeaderValue::from_str(&request_id) {
        headers.insert(HeaderName::from_static(REQUEST_ID_HEADER), v);
    }
    if let Ok(v) = HeaderValue::from_str(&format!("{latency_ms}ms")) {
        headers.insert(HeaderName::from_static(RESPONSE_TIME_HEADER), v);
    }

    info!(
        request_id = %request_id,
        %method,
        %path,
        status = response.status().as_u16(),
        latency_ms,
        "request completed"
    );
    response
}

/// Add the standard hardening headers to every response.
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    for (name, value) in [
        ("x-content-type-options", "nosniff"),
        ("x-frame-options", "DENY"),
        ("x-xss-protection", "1; mode=block"),
        ("referrer-policy", "strict-origin-when-cross-origin"),
    ] {
        headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }
    response
}

/// CORS layer for the configured origins. `*` allows any origin.
pub fn cors_layer(origins: &[String]) -> Result<CorsLayer> {
    let base = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return Ok(base.allow_origin(Any));
    }
    let parsed = origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o)
                .map_err(|e| PrecisError::Configuration(format!("invalid CORS origin '{o}': {e}")))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(base.allow_origin(AllowOrigin::list(parsed)))
}
