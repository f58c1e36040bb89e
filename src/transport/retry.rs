use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

use super::HttpResponse;
use crate::{Result, TranscriptError};

/// Bounded exponential-backoff settings for one network call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt; 0 disables retrying
    pub max_attempts: u32,

    /// Delay before the first retry, doubled for each one after it
    #[serde(with = "millis")]
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    pub fn disabled() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Wait before retry number `attempt` (0-indexed): `base_delay * 2^attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .checked_mul(2u32.saturating_pow(attempt))
            .unwrap_or(Duration::MAX)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(0, Duration::from_millis(1000))
    }
}

/// 429 and every 5xx are worth another attempt; other statuses are final
pub fn is_retryable(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

/// Run `operation` until it yields a non-retryable status or the retry budget is spent.
///
/// The last response is returned as-is even when it is a failure. The token is
/// checked before every attempt and raced against both the call and the
/// backoff wait; once it fires the result is always [`TranscriptError::Cancelled`].
pub async fn send_with_retry<F, Fut>(
    policy: &RetryPolicy,
    cancel: &CancellationToken,
    mut operation: F,
) -> Result<HttpResponse>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<HttpResponse>>,
{
    let mut attempt = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(TranscriptError::Cancelled);
        }

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TranscriptError::Cancelled),
            response = operation() => response?,
        };

        if !is_retryable(response.status) || attempt >= policy.max_attempts {
            return Ok(response);
        }

        let delay = policy.delay_for(attempt);
        tracing::warn!(
            "Retryable HTTP {} (attempt {}/{}), backing off for {:?}",
            response.status,
            attempt + 1,
            policy.max_attempts + 1,
            delay
        );

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TranscriptError::Cancelled),
            _ = sleep(delay) => {}
        }

        attempt += 1;
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
