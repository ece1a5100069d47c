use crate::core::error::Result;
use std::future::Future;

/// Run a storage operation, retrying exactly once when the first failure is
/// retryable (see [`BoardError::is_retryable`](crate::core::error::BoardError::is_retryable)).
pub async fn retry_once<T, F, Fut>(operation: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match op().await {
        Err(e) if e.is_retryable() => {
            tracing::warn!(operation, error = %e, "Storage call failed, retrying once");
            op().await.map_err(|e| {
                tracing::error!(operation, error = %e, "Storage call failed after retry");
                e
            })
        }
        other => other,
    }
}
