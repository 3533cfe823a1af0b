//! Language-model provider and the retrying model gateway for FormScout.
//!
//! The provider implements the `formscout_core::Provider` trait; the gateway
//! wraps any provider with the rate-limit retry policy.

pub mod anthropic;
pub mod gateway;

pub use anthropic::AnthropicProvider;
pub use gateway::{ModelGateway, RetryPolicy};
