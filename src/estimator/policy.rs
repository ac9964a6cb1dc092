use crate::{
    config::OraclePolicy,
    errors::{EstimationError, OracleCall},
};
use std::future::Future;

/// Runs one network call under `policy`: each attempt may be cut short by the timeout, and a
/// failed attempt is retried until the retry budget is spent. The last error is returned.
pub(crate) async fn call_with_policy<T, E, F, Fut>(
    policy: &OraclePolicy,
    call: OracleCall,
    mut attempt: F,
) -> Result<T, EstimationError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<EstimationError>,
{
    let mut retries_left = policy.max_retries;
    loop {
        let outcome = match policy.timeout() {
            Some(after) => match tokio::time::timeout(after, attempt()).await {
                Ok(result) => result.map_err(Into::into),
                Err(_elapsed) => Err(EstimationError::Timeout { call, after }),
            },
            None => attempt().await.map_err(Into::into),
        };
        match outcome {
            Ok(value) => return Ok(value),
            Err(err) if retries_left > 0 => {
                retries_left = retries_left.saturating_sub(1);
                log::warn!(
                    "{call} failed: {err}; retrying in {:?} ({retries_left} retries left)",
                    policy.retry_delay()
                );
                tokio::time::sleep(policy.retry_delay()).await;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::PriceFeedError;
    use std::{
        sync::atomic::{AtomicU32, Ordering},
        time::Duration,
    };

    async fn failing_then_ok(calls: &AtomicU32, failures: u32) -> Result<u32, PriceFeedError> {
        let call = calls.fetch_add(1, Ordering::SeqCst);
        if call < failures {
            Err(PriceFeedError::MissingPrice("price".to_owned()))
        } else {
            Ok(call)
        }
    }

    #[tokio::test]
    async fn test_default_policy_fails_fast() {
        let calls = AtomicU32::new(0);
        let result = call_with_policy(&OraclePolicy::default(), OracleCall::FiatRate, || {
            failing_then_ok(&calls, 1)
        })
        .await;

        assert!(matches!(
            result,
            Err(EstimationError::PriceFeedError(PriceFeedError::MissingPrice(_)))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let policy = OraclePolicy {
            max_retries: 3,
            retry_delay_ms: 1,
            ..OraclePolicy::default()
        };
        let result = call_with_policy(&policy, OracleCall::FiatRate, || {
            failing_then_ok(&calls, 2)
        })
        .await
        .unwrap();

        assert_eq!(result, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_budget_is_bounded() {
        let calls = AtomicU32::new(0);
        let policy = OraclePolicy {
            max_retries: 2,
            ..OraclePolicy::default()
        };
        let result = call_with_policy(&policy, OracleCall::FiatRate, || {
            failing_then_ok(&calls, 10)
        })
        .await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_timeout() {
        let policy = OraclePolicy {
            timeout_ms: Some(10),
            ..OraclePolicy::default()
        };
        let result = call_with_policy(&policy, OracleCall::GasPrices, || async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, PriceFeedError>(())
        })
        .await;

        assert!(matches!(
            result,
            Err(EstimationError::Timeout {
                call: OracleCall::GasPrices,
                after,
            }) if after == Duration::from_millis(10)
        ));
    }
}
