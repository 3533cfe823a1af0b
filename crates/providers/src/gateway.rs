//! Model Call Gateway: one request/response exchange with bounded retry.
//!
//! Rate-limit failures are retried with exponential backoff
//! (`base * 2^retry`, i.e. 20s, 40s, 80s with the default 10s base).
//! Every other failure propagates on the first occurrence. The backoff sleep
//! is a plain `tokio::time::sleep` and is never raced against anything.

use formscout_core::error::ProviderError;
use formscout_core::message::Conversation;
use formscout_core::provider::{Provider, ProviderRequest, ProviderResponse, ToolDefinition};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry bounds for rate-limited model calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first call; total calls are `max_retries + 1`
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(10))
    }
}

/// Wraps a [`Provider`] with the rate-limit retry policy.
///
/// The provider handle is created once per run and shared by every call.
pub struct ModelGateway {
    provider: Arc<dyn Provider>,
    policy: RetryPolicy,
}

impl ModelGateway {
    pub fn new(provider: Arc<dyn Provider>, policy: RetryPolicy) -> Self {
        Self { provider, policy }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Send the full conversation and catalog to the model.
    pub async fn call(
        &self,
        conversation: &Conversation,
        tools: &[ToolDefinition],
        model: &str,
        max_tokens: u32,
    ) -> Result<ProviderResponse, ProviderError> {
        let request = ProviderRequest {
            model: model.to_string(),
            max_tokens,
            tools: tools.to_vec(),
            messages: conversation.turns().to_vec(),
        };

        for attempt in 0..=self.policy.max_retries {
            match self.provider.complete(request.clone()).await {
                Ok(response) => {
                    debug!(
                        provider = %self.provider.name(),
                        attempt,
                        stop_reason = ?response.stop_reason,
                        blocks = response.content.len(),
                        "Model call succeeded"
                    );
                    return Ok(response);
                }
                Err(e) if e.is_rate_limit() => {
                    if attempt == self.policy.max_retries {
                        warn!(
                            provider = %self.provider.name(),
                            attempts = attempt + 1,
                            "Rate limited on every attempt, giving up"
                        );
                        break;
                    }
                    let delay = self.policy.delay_for(attempt + 1);
                    warn!(
                        provider = %self.provider.name(),
                        attempt = attempt + 1,
                        max_retries = self.policy.max_retries,
                        delay_secs = delay.as_secs(),
                        error = %e,
                        "Rate limited, retrying after delay"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }

        Err(ProviderError::RetriesExhausted {
            attempts: self.policy.max_retries + 1,
        })
    }
}
