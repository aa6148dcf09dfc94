//! API Middleware - Error Responses, Request Logging and Security Headers
//!
//! Provides the shared HTTP plumbing for the soltree API:
//! - `ApiError`, the `{error, code, details?}` body every handler fails with
//! - Request/response logging with correlation IDs
//! - Security headers

use axum::{
    extract::{rejection::JsonRejection, Request},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::time::Instant;

use crate::common::logging::{generate_correlation_id, log_api_request, log_api_response};
use crate::services::ServiceError;
use crate::validation::ValidationError;

/// Header carrying the per-request correlation ID
pub const CORRELATION_ID_HEADER: &str = "x-correlation-id";

// ============================================================================
// Error Response
// ============================================================================

/// Error response for API errors
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: StatusCode,
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            status,
            error: error.into(),
            code: code.into(),
            details: None,
        }
    }

    pub fn not_found(error: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, "NOT_FOUND", error)
    }

    pub fn internal(error: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", error)
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        let details = match &err {
            ValidationError::InvalidParameter {
                field,
                value,
                min,
                max,
            } => serde_json::json!({ "field": field, "value": value, "min": min, "max": max }),
            ValidationError::InvariantViolation {
                rule,
                canopy_depth,
                max_depth,
            } => serde_json::json!({
                "rule": rule,
                "canopyDepth": canopy_depth,
                "maxDepth": max_depth
            }),
            ValidationError::InvalidText {
                field,
                len,
                min,
                max,
            } => serde_json::json!({ "field": field, "length": len, "min": min, "max": max }),
        };

        Self::new(StatusCode::BAD_REQUEST, err.code(), err.to_string()).with_details(details)
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => e.into(),
            ServiceError::NotFound(_) => Self::not_found(err.to_string()),
            ServiceError::StoreUnavailable(_) => {
                Self::new(StatusCode::SERVICE_UNAVAILABLE, err.code(), err.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "INVALID_BODY", rejection.body_text())
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Extract client IP from request headers
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    // Try X-Forwarded-For first (for proxied requests)
    if let Some(forwarded) = headers.get("x-forwarded-for") {
        if let Ok(value) = forwarded.to_str() {
            // Take the first IP in the chain
            return Some(value.split(',').next()?.trim().to_string());
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip") {
        if let Ok(value) = real_ip.to_str() {
            return Some(value.to_string());
        }
    }

    None
}

/// Request logging middleware
///
/// Reuses an incoming `x-correlation-id` when present and echoes it on the
/// response.
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let client_ip = extract_client_ip(request.headers());

    let correlation_id = request
        .headers()
        .get(CORRELATION_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(generate_correlation_id);

    log_api_request(&method, &path, client_ip.as_deref(), &correlation_id);

    let mut response = next.run(request).await;

    let duration_ms = started.elapsed().as_millis() as u64;
    log_api_response(
        &method,
        &path,
        response.status().as_u16(),
        duration_ms,
        &correlation_id,
    );

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(CORRELATION_ID_HEADER), value);
    }

    response
}

/// Security headers middleware
pub async fn security_headers_middleware(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert("x-content-type-options", HeaderValue::from_static("nosniff"));
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'self'"),
    );

    response
}

// ============================================================================
// Tests
// ============================================================================
