//! Request logging for the health routes

use axum::{body::Body, Router};
use http::{Request, Response};
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::{debug_span, Span};

/// Wraps `router` in a trace layer. Probe traffic is frequent, so successful
/// requests log at debug and an unready answer at warn.
pub fn with_request_tracing(router: Router) -> Router {
    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(|request: &Request<Body>| {
                debug_span!(
                    "health_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    version = ?request.version(),
                )
            })
            .on_request(|request: &Request<Body>, _span: &Span| {
                tracing::debug!(
                    "started processing request {} {}",
                    request.method(),
                    request.uri().path()
                );
            })
            .on_response(|response: &Response<Body>, latency: Duration, _span: &Span| {
                let status = response.status();
                let latency_ms = latency.as_millis();

                if status.is_success() {
                    tracing::debug!(
                        status = status.as_u16(),
                        latency_ms = latency_ms,
                        "request completed successfully"
                    );
                } else if status == http::StatusCode::SERVICE_UNAVAILABLE {
                    tracing::warn!(
                        status = status.as_u16(),
                        latency_ms = latency_ms,
                        "service reported not ready"
                    );
                } else if status.is_client_error() {
                    tracing::warn!(
                        status = status.as_u16(),
                        latency_ms = latency_ms,
                        "client error response"
                    );
                } else {
                    tracing::error!(
                        status = status.as_u16(),
                        latency_ms = latency_ms,
                        "server error response"
                    );
                }
            })
            .on_failure(()),
    )
}
