use axum::{
    extract::{MatchedPath, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use std::time::Instant;
use tracing::{Instrument, info, info_span, warn};
use uuid::Uuid;

use crate::api::AppState;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// GET /metrics
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> Response {
    match &state.prometheus_handle {
        Some(handle) => handle.render().into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Metrics are disabled (observability.metrics_enabled = false)",
        )
            .into_response(),
    }
}

/// Reuses a caller-supplied request id when it is a UUID, otherwise mints one.
fn request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4)
        .to_string()
}

fn outcome(status: StatusCode) -> &'static str {
    if status.is_server_error() {
        "error"
    } else if status.is_client_error() {
        "client_error"
    } else if status.is_redirection() {
        "redirect"
    } else {
        "success"
    }
}

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let request_id = request_id(req.headers());

    let method = req.method().to_string();
    let path = req.uri().path().to_string();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|mp| mp.as_str().to_string());

    let span = info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %path,
        route = route.clone(),
        user_id = tracing::field::Empty,
    );

    async move {
        let mut response = next.run(req).await;

        let elapsed = start.elapsed();
        let status = response.status();

        // Short link tokens and recipe ids live in the raw path; label by template.
        let labels = [
            ("method", method),
            ("route", route.unwrap_or_else(|| "unmatched".to_string())),
            ("status", status.as_u16().to_string()),
        ];
        metrics::counter!("foodgram_http_requests_total", &labels).increment(1);
        metrics::histogram!("foodgram_http_request_duration_seconds", &labels)
            .record(elapsed.as_secs_f64());

        let duration_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);
        if status.is_server_error() {
            warn!(
                event = "http_request_finished",
                duration_ms,
                status_code = status.as_u16(),
                outcome = outcome(status),
                "Request failed"
            );
        } else {
            info!(
                event = "http_request_finished",
                duration_ms,
                status_code = status.as_u16(),
                outcome = outcome(status),
                "Request finished"
            );
        }

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER, value);
        }
        response
    }
    .instrument(span)
    .await
}

pub async fn security_headers_middleware(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "referrer-policy",
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_reuses_valid_uuid() {
        let id = Uuid::new_v4().to_string();
        let mut headers = HeaderMap::new();
        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_str(&id).unwrap());
        assert_eq!(request_id(&headers), id);

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("not-a-uuid"));
        assert_ne!(request_id(&headers), "not-a-uuid");
    }

    #[test]
    fn test_redirects_are_not_errors() {
        assert_eq!(outcome(StatusCode::FOUND), "redirect");
        assert_eq!(outcome(StatusCode::NOT_FOUND), "client_error");
        assert_eq!(outcome(StatusCode::BAD_GATEWAY), "error");
        assert_eq!(outcome(StatusCode::CREATED), "success");
    }
}
