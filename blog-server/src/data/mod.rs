pub mod comment_repository;
#[cfg(test)]
pub mod memory;
#[cfg(test)]
pub(crate) mod pg_fixture;
pub mod post_repository;
pub mod user_repository;

use crate::domain::DomainError;
use std::future::Future;
use std::time::Duration;

/// Runs one store call under `timeout`. An elapsed call is reported as
/// `StoreUnavailable` so the caller sees a 503 rather than a hung request.
pub(crate) async fn bounded<T, E, F>(
    timeout: Duration,
    operation: &'static str,
    call: F,
) -> Result<T, DomainError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<DomainError>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            let err = e.into();
            if err.to_status_code() >= 500 {
                tracing::error!("Store call {} failed: {}", operation, err);
            }
            Err(err)
        }
        Err(_) => {
            tracing::error!("Store call {} timed out after {:?}", operation, timeout);
            Err(DomainError::StoreUnavailable(format!(
                "{} timed out",
                operation
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn elapsed_call_is_store_unavailable() {
        let result: Result<(), DomainError> = bounded(
            Duration::from_millis(10),
            "slow",
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, DomainError>(())
            },
        )
        .await;

        assert!(matches!(result, Err(DomainError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn errors_are_converted() {
        let result: Result<(), DomainError> = bounded(
            Duration::from_secs(1),
            "pool",
            async { Err::<(), _>(sqlx::Error::PoolTimedOut) },
        )
        .await;

        assert!(matches!(result, Err(DomainError::StoreUnavailable(_))));
    }
}
