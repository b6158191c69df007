use axum::{
    extract::{Request, State},
    http::HeaderValue,
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use tracing::Instrument;
use uuid::Uuid;

use crate::presentation::http::state::AppState;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied request id that is accepted as-is
const MAX_REQUEST_ID_LEN: usize = 128;

/// Correlation key of the current request, available to handlers as an extension
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

/// Times every request and records it with the performance monitor, together
/// with the latest cached process sample.
///
/// An incoming `x-request-id` is reused so upstream proxies can correlate,
/// otherwise a UUID v7 is assigned. The id is echoed on the response.
pub async fn request_metrics_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty() && s.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_owned)
        .unwrap_or_else(|| Uuid::now_v7().to_string());
    req.extensions_mut().insert(RequestId(request_id.clone()));

    let method = req.method().to_string();
    let url = req.uri().path().to_string();
    let span = tracing::info_span!("request", id = %request_id, %method, %url);

    let start_time = Instant::now();
    let mut response = next.run(req).instrument(span).await;
    let elapsed = start_time.elapsed();

    let sample = state.monitoring.sampler.latest();
    state
        .monitoring
        .performance
        .record_request(
            &request_id,
            &url,
            &method,
            response.status().as_u16(),
            elapsed,
            sample.map_or(0, |s| s.memory_bytes),
            sample.and_then(|s| s.cpu_usage),
        )
        .await;

    if let Ok(val) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, val);
    }
    response
}
