use super::RetryPolicy;
use crate::config::RpcConfig;
use crate::errors::ReclaimError;
use crate::logger::{self, LogTag};
use crate::rpc::types::RpcCallError;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Process-wide gate in front of the ledger node
///
/// Waiters queue on the spacing lock, so at most one call starts per
/// `min_spacing` interval regardless of how many tasks are calling.
pub struct RateLimitedCaller {
    min_spacing: Duration,
    call_timeout: Duration,
    policy: RetryPolicy,
    last_call: Mutex<Option<Instant>>,
}

impl RateLimitedCaller {
    pub fn new(min_spacing: Duration, call_timeout: Duration, policy: RetryPolicy) -> Self {
        Self {
            min_spacing,
            call_timeout,
            policy,
            last_call: Mutex::new(None),
        }
    }

    pub fn from_config(config: &RpcConfig) -> Self {
        Self::new(
            Duration::from_millis(config.min_call_spacing_ms),
            Duration::from_secs(config.call_timeout_secs),
            RetryPolicy::from_config(&config.retry),
        )
    }

    /// Run `op` through spacing, deadline and retry handling
    ///
    /// Only throttling is retried. Running out of attempts yields
    /// `UpstreamRateLimited`; any other failure (timeouts included) is
    /// returned at once as `UpstreamUnavailable`.
    pub async fn call<T, F, Fut>(&self, method: &str, mut op: F) -> Result<T, ReclaimError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RpcCallError>>,
    {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            self.wait_for_slot(method).await;

            let outcome = match tokio::time::timeout(self.call_timeout, op()).await {
                Ok(result) => result,
                Err(_) => Err(RpcCallError::Timeout),
            };

            match outcome {
                Ok(value) => return Ok(value),
                Err(RpcCallError::RateLimited { retry_after }) => {
                    if attempt >= self.policy.max_attempts {
                        logger::error(
                            LogTag::Rpc,
                            &format!("{} still throttled after {} attempts", method, attempt),
                        );
                        return Err(ReclaimError::UpstreamRateLimited {
                            method: method.to_string(),
                            attempts: attempt,
                        });
                    }

                    let backoff = self.policy.delay_for(attempt - 1);
                    let delay = retry_after.map_or(backoff, |hint| hint.max(backoff));
                    logger::warning(
                        LogTag::Rpc,
                        &format!(
                            "{} throttled (attempt {}/{}), retrying in {}ms",
                            method,
                            attempt,
                            self.policy.max_attempts,
                            delay.as_millis()
                        ),
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(RpcCallError::Timeout) => {
                    logger::warning(
                        LogTag::Rpc,
                        &format!(
                            "{} gave no response within {}ms",
                            method,
                            self.call_timeout.as_millis()
                        ),
                    );
                    return Err(ReclaimError::upstream(
                        method,
                        format!("no response within {}ms", self.call_timeout.as_millis()),
                    ));
                }
                Err(other) => {
                    logger::debug(LogTag::Rpc, &format!("{} failed: {}", method, other));
                    return Err(ReclaimError::upstream(method, other.to_string()));
                }
            }
        }
    }

    async fn wait_for_slot(&self, method: &str) {
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            let elapsed = previous.elapsed();
            if elapsed < self.min_spacing {
                let wait = self.min_spacing - elapsed;
                logger::verbose(
                    LogTag::Rpc,
                    &format!("Spacing {}: waiting {}ms", method, wait.as_millis()),
                );
                tokio::time::sleep(wait).await;
            }
        }
        *last_call = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn caller(max_attempts: u32) -> RateLimitedCaller {
        RateLimitedCaller::new(
            Duration::from_millis(500),
            Duration::from_secs(15),
            RetryPolicy::new(max_attempts, Duration::from_secs(1), Duration::from_secs(16)),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttled_then_success_is_retried() {
        let caller = caller(5);
        let attempts = AtomicU32::new(0);

        let started = Instant::now();
        let result = caller
            .call("getLatestBlockhash", || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(RpcCallError::RateLimited { retry_after: None })
                    } else {
                        Ok(42u64)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
        // 1s + 2s of backoff
        assert!(started.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_retries_surface_rate_limited() {
        let caller = caller(3);
        let attempts = AtomicU32::new(0);

        let err = caller
            .call("getMultipleAccounts", || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>(RpcCallError::RateLimited { retry_after: None }) }
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UpstreamRateLimited);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_failures_are_not_retried() {
        let caller = caller(5);
        let attempts = AtomicU32::new(0);

        let err = caller
            .call("getAccountInfo", || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async {
                    Err::<(), _>(RpcCallError::Rpc {
                        code: -32602,
                        message: "invalid params".to_string(),
                    })
                }
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_maps_to_unavailable() {
        let caller = RateLimitedCaller::new(
            Duration::ZERO,
            Duration::from_millis(100),
            RetryPolicy::default(),
        );

        let err = caller
            .call("getLatestBlockhash", || async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok::<_, RpcCallError>(())
            })
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::UpstreamUnavailable);
    }

    #[tokio::test(start_paused = true)]
    async fn test_calls_are_spaced_across_tasks() {
        let caller = Arc::new(caller(1));
        let started = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..3 {
            let caller = caller.clone();
            handles.push(tokio::spawn(async move {
                caller
                    .call("getMinimumBalanceForRentExemption", || async {
                        Ok::<_, RpcCallError>(Instant::now())
                    })
                    .await
                    .unwrap()
            }));
        }

        let mut starts = Vec::new();
        for handle in handles {
            starts.push(handle.await.unwrap());
        }
        starts.sort();

        assert!(starts[1] - starts[0] >= Duration::from_millis(500));
        assert!(starts[2] - starts[1] >= Duration::from_millis(500));
        assert!(started.elapsed() >= Duration::from_millis(1000));
    }
}
