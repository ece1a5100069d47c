use crate::core::error::BoardError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::time::Duration;

/// Per-request deadline
#[derive(Clone, Copy, Debug)]
pub struct RequestTimeout(pub Duration);

/// Abort handlers that run past the configured deadline with `408`
pub async fn timeout_middleware(
    State(RequestTimeout(limit)): State<RequestTimeout>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    match tokio::time::timeout(limit, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!(path = %path, timeout_ms = limit.as_millis() as u64, "Request timed out");
            BoardError::Timeout(format!("Request exceeded {} ms", limit.as_millis())).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware, routing::get, Router};
    use tower::util::ServiceExt; // For oneshot method

    fn app(limit: Duration) -> Router {
        Router::new()
            .route("/fast", get(|| async { "OK" }))
            .route(
                "/slow",
                get(|| async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    "late"
                }),
            )
            .layer(middleware::from_fn_with_state(
                RequestTimeout(limit),
                timeout_middleware,
            ))
    }

    #[tokio::test]
    async fn test_fast_request_passes() {
        let request = Request::builder().uri("/fast").body(Body::empty()).unwrap();
        let response = app(Duration::from_secs(1)).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_slow_request_times_out() {
        let request = Request::builder().uri("/slow").body(Body::empty()).unwrap();
        let response = app(Duration::from_millis(20)).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    }
}
