//! Webhook handler for identity-provider user lifecycle events.
//!
//! Authenticates the request, decodes the event and applies it to the user
//! store with a single write. Each step returns a `SyncError`, so every way
//! a request can fail is one of that enum's variants.

use axum::{
    body::Body,
    extract::State,
    http::{header::CONTENT_LENGTH, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use bytes::{Bytes, BytesMut};
use futures::StreamExt;
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use usersync_core::{apply_event, SyncError, SyncOutcome, UserEvent};

use crate::{
    config::WebhookSettings,
    crypto::{self, SignatureHeaders, WebhookSecret, HEADER_ID},
    AppState,
};

/// Body of a successful response.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    /// Always `true`.
    pub success: bool,
}

/// Body of a failed response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error description.
    pub error: String,
    /// Diagnostic trace, only present in development.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

/// Receives one user lifecycle event.
///
/// Returns `200 {"success":true}` once the event is applied or ignored, and
/// `400 {"error": ...}` for configuration, authentication, decoding or
/// storage failures. Rejected requests never reach the store.
#[instrument(
    name = "receive_user_event",
    skip(state, headers, body),
    fields(
        svix_id = headers.get(HEADER_ID).and_then(|v| v.to_str().ok()).unwrap_or("none"),
        content_length = declared_length(&headers),
    )
)]
pub async fn receive_user_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Body,
) -> Response {
    debug!("Processing webhook request");

    match process_event(&state, &headers, body).await {
        Ok(outcome) => {
            info!(outcome = %outcome, "Webhook processed");
            (StatusCode::OK, Json(SuccessResponse { success: true })).into_response()
        },
        Err(e) => {
            warn!(error = %e, code = e.code(), kind = ?e.kind(), "Webhook rejected");
            create_error_response(&e, &state.webhook)
        },
    }
}

/// Runs the processing steps in order, stopping at the first failure.
async fn process_event(
    state: &AppState,
    headers: &HeaderMap,
    body: Body,
) -> Result<SyncOutcome, SyncError> {
    let settings = &state.webhook;

    let body = read_body(headers, body, settings.max_payload_bytes).await?;
    let body = body.as_ref();

    let secret = load_secret(settings)?;

    let signature_headers = SignatureHeaders::from_header_map(headers)?;
    crypto::verify(
        &secret,
        body,
        &signature_headers,
        state.clock.unix_timestamp(),
        settings.tolerance,
    )?;
    debug!("Signature verified");

    let event = UserEvent::from_slice(body)?;
    debug!(
        event_type = event.event_type(),
        user_id = event.user_id().map(|id| id.as_str()).unwrap_or("none"),
        "Event decoded"
    );

    apply_event(state.store.as_ref(), event).await
}

/// Buffers the request body, refusing to hold more than `limit` bytes.
///
/// `limit` is the only bound applied; axum's default body limit does not
/// see the raw `Body`.
async fn read_body(headers: &HeaderMap, body: Body, limit: usize) -> Result<Bytes, SyncError> {
    if let Some(declared) = declared_length(headers) {
        if declared > limit {
            return Err(SyncError::PayloadTooLarge { size_bytes: declared, limit });
        }
    }

    let mut stream = body.into_data_stream();
    let mut buffer = BytesMut::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk
            .map_err(|e| SyncError::Decode { reason: format!("failed to read request body: {e}") })?;

        // Reports the bytes received so far; the sender may have had more.
        let received = buffer.len() + chunk.len();
        if received > limit {
            return Err(SyncError::PayloadTooLarge { size_bytes: received, limit });
        }
        buffer.extend_from_slice(&chunk);
    }

    Ok(buffer.freeze())
}

/// Returns the `Content-Length` the client declared, if parseable.
fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers.get(CONTENT_LENGTH)?.to_str().ok()?.trim().parse().ok()
}

/// Returns the configured signing secret.
fn load_secret(settings: &WebhookSettings) -> Result<WebhookSecret, SyncError> {
    let raw = settings.secret.as_deref().ok_or(SyncError::MissingSecret)?;
    Ok(WebhookSecret::parse(raw)?)
}

/// Creates the uniform failure response.
fn create_error_response(error: &SyncError, settings: &WebhookSettings) -> Response {
    let stack = settings.environment.exposes_diagnostics().then(|| diagnostic_trace(error));

    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: error.to_string(), stack }))
        .into_response()
}

/// Renders an error and its source chain for development responses.
fn diagnostic_trace(error: &(dyn std::error::Error + 'static)) -> String {
    let mut trace = format!("{error:?}");
    let mut source = error.source();
    while let Some(cause) = source {
        trace.push_str("\ncaused by: ");
        trace.push_str(&cause.to_string());
        source = cause.source();
    }
    trace
}

#[cfg(test)]
mod tests {
    use usersync_core::CoreError;

    use super::*;
    use crate::config::Environment;

    #[test]
    fn error_response_is_bad_request() {
        let settings = WebhookSettings::new(None);
        let response = create_error_response(&SyncError::MissingSecret, &settings);

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn diagnostic_trace_walks_sources() {
        let error = SyncError::Storage(CoreError::Database("connection refused".into()));

        let trace = diagnostic_trace(&error);

        assert!(trace.starts_with("Storage(Database(\"connection refused\"))"));
        assert!(trace.contains("caused by: Database error: connection refused"));
    }

    #[tokio::test]
    async fn read_body_enforces_limit_while_streaming() {
        let headers = HeaderMap::new();

        let err = read_body(&headers, Body::from(vec![b'x'; 64]), 32).await.unwrap_err();
        assert!(matches!(err, SyncError::PayloadTooLarge { size_bytes: 64, limit: 32 }));

        let body = read_body(&headers, Body::from(vec![b'x'; 32]), 32).await.unwrap();
        assert_eq!(body.len(), 32);
    }

    #[tokio::test]
    async fn read_body_rejects_declared_oversize_up_front() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_LENGTH, "4096".parse().unwrap());

        let err = read_body(&headers, Body::empty(), 1024).await.unwrap_err();

        assert!(matches!(err, SyncError::PayloadTooLarge { size_bytes: 4096, limit: 1024 }));
    }

    #[test]
    fn load_secret_distinguishes_missing_and_invalid() {
        let missing = load_secret(&WebhookSettings::new(None)).unwrap_err();
        assert!(matches!(missing, SyncError::MissingSecret));

        let invalid =
            load_secret(&WebhookSettings::new(Some("whsec_***".to_string()))).unwrap_err();
        assert!(matches!(invalid, SyncError::InvalidSecret { .. }));

        let settings = WebhookSettings::new(Some("whsec_c2VjcmV0".to_string()))
            .with_environment(Environment::Development);
        assert!(load_secret(&settings).is_ok());
    }
}
