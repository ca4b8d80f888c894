//! Request timing middleware.
//!
//! Logs the duration of each HTTP request. Engine searches routinely take a
//! second or more, so the slow-request threshold is configurable.

use std::time::{Duration, Instant};

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

/// Requests taking longer than this are logged as warnings.
#[derive(Debug, Clone, Copy)]
pub struct SlowRequestThreshold(pub Duration);

/// Middleware that logs request timing.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, middleware};
/// use analysis_server::middleware::{timing_layer, SlowRequestThreshold};
///
/// let app = Router::new()
///     .route("/analyze", post(handler))
///     .layer(middleware::from_fn_with_state(
///         SlowRequestThreshold(Duration::from_secs(2)),
///         timing_layer,
///     ));
/// ```
pub async fn timing_layer(
    State(SlowRequestThreshold(threshold)): State<SlowRequestThreshold>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let uri = request.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status().as_u16();

    if duration > threshold {
        tracing::warn!(
            method = %method,
            path = %uri,
            status = status,
            duration_ms = duration.as_millis() as u64,
            "Slow request"
        );
    } else {
        tracing::debug!(
            method = %method,
            path = %uri,
            status = status,
            duration_ms = duration.as_millis() as u64,
            "Request completed"
        );
    }

    response
}
