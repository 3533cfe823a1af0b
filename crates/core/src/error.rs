//! Error types for the FormScout domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`Error`] is the run-level
//! error that reaches the process boundary.

use thiserror::Error;

/// The top-level error type for a discovery run.
///
/// Every variant is fatal: tool-execution failures never appear here because
/// the dispatcher folds them into the conversation instead.
#[derive(Debug, Error)]
pub enum Error {
    // --- Language-model service ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Automation backend ---
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    // --- Configuration ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Seed procedure ---
    #[error("Seed '{seed}' failed: {reason}")]
    Seed { seed: String, reason: String },

    // --- Artifact output ---
    #[error("Failed to write {path}: {reason}")]
    Output { path: String, reason: String },
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Rate limit retries exhausted after {attempts} attempts")]
    RetriesExhausted { attempts: u32 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

impl ProviderError {
    /// Whether this failure is a transient capacity signal worth retrying.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ProviderError::RateLimited { .. })
    }
}

#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// The backend could not be reached or gave a malformed listing.
    #[error("Automation backend unavailable: {0}")]
    Unavailable(String),

    #[error("Tool '{tool_name}' failed: {reason}")]
    ToolFailed { tool_name: String, reason: String },

    #[error("Tool '{tool_name}' timed out after {timeout_secs}s")]
    Timeout { tool_name: String, timeout_secs: u64 },

    #[error("Backend is closed")]
    Closed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = Error::Provider(ProviderError::ApiError {
            status_code: 500,
            message: "Internal server error".into(),
        });
        assert!(err.to_string().contains("500"));
        assert!(err.to_string().contains("Internal server error"));
    }

    #[test]
    fn only_rate_limit_is_retryable() {
        assert!(ProviderError::RateLimited { retry_after_secs: 5 }.is_rate_limit());
        assert!(!ProviderError::Network("reset".into()).is_rate_limit());
        assert!(!ProviderError::RetriesExhausted { attempts: 4 }.is_rate_limit());
    }

    #[test]
    fn backend_error_displays_correctly() {
        let err = Error::Backend(BackendError::ToolFailed {
            tool_name: "browser_click".into(),
            reason: "element not found".into(),
        });
        assert!(err.to_string().contains("browser_click"));
        assert!(err.to_string().contains("element not found"));
    }

    #[test]
    fn run_error_variants_are_closed_set() {
        let errors = [
            Error::from(ProviderError::RetriesExhausted { attempts: 4 }),
            Error::from(BackendError::Closed),
            Error::Config { message: "no key".into() },
            Error::Seed { seed: "default".into(), reason: "navigation failed".into() },
            Error::Output { path: "out".into(), reason: "read-only".into() },
        ];
        for err in errors {
            // Exhaustive: a new variant has to be added here
            match err {
                Error::Provider(_) | Error::Backend(_) | Error::Config { .. } | Error::Seed { .. } | Error::Output { .. } => {}
            }
        }
    }
}
