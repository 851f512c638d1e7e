//! Bounded retry around reasoning-service calls.
//!
//! Transient overload gets a linear backoff (attempt number times the base
//! delay); anything else propagates immediately. When the last attempt is
//! still transient, the failure surfaces as the distinct overloaded
//! condition so callers can render a specific message.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use super::client::LlmError;

/// Retry policy applied uniformly to every outbound completion call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
        }
    }

    /// Run `op` until it succeeds, fails non-transiently, or attempts run
    /// out.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T, LlmError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LlmError>>,
    {
        let max_attempts = self.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() => {
                    if attempt == max_attempts {
                        return Err(LlmError::Overloaded {
                            attempts: max_attempts,
                        });
                    }
                    let delay = self.base_delay * attempt;
                    warn!(
                        attempt,
                        delay_secs = delay.as_secs(),
                        "reasoning service overloaded, retrying: {err}"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }

        unreachable!("retry loop always returns before exhausting the range")
    }
}
