//! Configuration loading, validation, and management for FormScout.
//!
//! Loads configuration from `./formscout.toml` (or an explicit path), then
//! applies environment variable overrides. Command-line flags are applied on
//! top by the binary, after which [`DiscoveryConfig::validate`] runs.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use url::Url;

/// Default config file name, looked up in the current directory.
pub const CONFIG_FILE_NAME: &str = "formscout.toml";

/// The root configuration structure for one discovery run.
#[derive(Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// The form to explore
    #[serde(default)]
    pub form_url: String,

    /// Base name for the generated files (derived from the URL when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub form_name: Option<String>,

    /// Seed procedure run before the conversation starts
    #[serde(default = "default_seed")]
    pub seed: String,

    /// Where the generated files are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Model used for the whole run
    #[serde(default = "default_model")]
    pub model: String,

    /// Max tokens per model response
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Hard cap on model calls per run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Rate-limit retries per model call
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Backoff base: the n-th retry waits `2^n * base`
    #[serde(default = "default_retry_base_delay_secs")]
    pub retry_base_delay_secs: u64,

    #[serde(default)]
    pub browser: Browser,

    #[serde(default)]
    pub headless: bool,

    /// Anthropic API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Override for the Anthropic API base URL (proxies, tests)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    /// How to launch the automation backend
    #[serde(default)]
    pub backend: BackendConfig,
}

fn default_seed() -> String {
    "default".into()
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("tests/generated")
}
fn default_model() -> String {
    "claude-sonnet-4-20250514".into()
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_max_iterations() -> u32 {
    20
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_base_delay_secs() -> u64 {
    10
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for DiscoveryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoveryConfig")
            .field("form_url", &self.form_url)
            .field("form_name", &self.form_name)
            .field("seed", &self.seed)
            .field("output_dir", &self.output_dir)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("max_iterations", &self.max_iterations)
            .field("max_retries", &self.max_retries)
            .field("retry_base_delay_secs", &self.retry_base_delay_secs)
            .field("browser", &self.browser)
            .field("headless", &self.headless)
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .field("backend", &self.backend)
            .finish()
    }
}

/// Browser engine the backend drives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::fmt::Display for Browser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Browser {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" => Ok(Browser::Webkit),
            other => Err(ConfigError::InvalidValue {
                key: "browser".into(),
                value: other.into(),
                reason: "expected chromium, firefox or webkit".into(),
            }),
        }
    }
}

/// How the automation backend process is launched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    #[serde(default = "default_backend_command")]
    pub command: String,

    /// Package passed as the first argument to `command`
    #[serde(default = "default_backend_package")]
    pub package: String,

    /// Optional capabilities enabled with `--caps`
    #[serde(default = "default_capabilities")]
    pub capabilities: Vec<String>,

    /// Extra arguments appended after the generated ones
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extra_args: Vec<String>,

    /// Extra environment for the backend process
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub env: HashMap<String, String>,

    /// Handshake timeout (package download on first run can be slow)
    #[serde(default = "default_init_timeout_secs")]
    pub init_timeout_secs: u64,

    /// Per tool call timeout; unset means wait indefinitely
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_timeout_secs: Option<u64>,
}

fn default_backend_command() -> String {
    "npx".into()
}
fn default_backend_package() -> String {
    "@playwright/mcp@latest".into()
}
fn default_capabilities() -> Vec<String> {
    vec!["vision".into()]
}
fn default_init_timeout_secs() -> u64 {
    120
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            command: default_backend_command(),
            package: default_backend_package(),
            capabilities: default_capabilities(),
            extra_args: vec![],
            env: HashMap::new(),
            init_timeout_secs: default_init_timeout_secs(),
            call_timeout_secs: None,
        }
    }
}

impl BackendConfig {
    /// Command-line arguments for the backend process.
    pub fn launch_args(&self, browser: Browser, headless: bool) -> Vec<String> {
        let mut args = vec![self.package.clone(), "--browser".into(), browser.as_str().into()];
        if !self.capabilities.is_empty() {
            args.push("--caps".into());
            args.push(self.capabilities.join(","));
        }
        if headless {
            args.push("--headless".into());
        }
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

impl DiscoveryConfig {
    /// Load configuration from `path`, or `./formscout.toml` when `None`,
    /// then apply environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
        let mut config = Self::load_from(&path)?;
        config.apply_env_with(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Apply environment overrides using `lookup` to read variables.
    ///
    /// Recognized: `FORM_URL`, `FORM_NAME`, `SEED_NAME`, `OUTPUT_DIR`,
    /// `ANTHROPIC_MODEL`, `MAX_ITERATIONS`, `BROWSER`, `HEADLESS`,
    /// `ANTHROPIC_API_KEY`, `ANTHROPIC_BASE_URL`. Empty values are ignored.
    pub fn apply_env_with<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get("FORM_URL") {
            self.form_url = url;
        }
        if let Some(name) = get("FORM_NAME") {
            self.form_name = Some(name);
        }
        if let Some(seed) = get("SEED_NAME") {
            self.seed = seed;
        }
        if let Some(dir) = get("OUTPUT_DIR") {
            self.output_dir = PathBuf::from(dir);
        }
        if let Some(model) = get("ANTHROPIC_MODEL") {
            self.model = model;
        }
        if let Some(raw) = get("MAX_ITERATIONS") {
            self.max_iterations = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "MAX_ITERATIONS".into(),
                value: raw.clone(),
                reason: "expected a positive integer".into(),
            })?;
        }
        if let Some(raw) = get("BROWSER") {
            self.browser = raw.parse()?;
        }
        if let Some(raw) = get("HEADLESS") {
            self.headless = raw.trim().eq_ignore_ascii_case("true");
        }
        if let Some(key) = get("ANTHROPIC_API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(url) = get("ANTHROPIC_BASE_URL") {
            self.api_url = Some(url);
        }
        Ok(())
    }

    /// Validate the configuration. Run after all overrides are applied.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = self.form_url.trim();
        if url.is_empty() {
            return Err(ConfigError::ValidationError(
                "form_url is required (set FORM_URL or pass --url)".into(),
            ));
        }
        parse_form_url(url)?;
        if self.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "max_iterations must be at least 1".into(),
            ));
        }
        if self.max_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "max_tokens must be at least 1".into(),
            ));
        }
        if self.backend.command.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "backend.command must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Base name for generated files: the configured name, else derived from the URL.
    pub fn effective_form_name(&self) -> String {
        match &self.form_name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => form_name_from_url(&self.form_url),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            form_url: String::new(),
            form_name: None,
            seed: default_seed(),
            output_dir: default_output_dir(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            max_iterations: default_max_iterations(),
            max_retries: default_max_retries(),
            retry_base_delay_secs: default_retry_base_delay_secs(),
            browser: Browser::default(),
            headless: false,
            api_key: None,
            api_url: None,
            backend: BackendConfig::default(),
        }
    }
}

/// Parse `url` and require an http(s) scheme with a host.
pub fn parse_form_url(url: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        key: "form_url".into(),
        value: url.to_string(),
        reason,
    };

    let parsed = Url::parse(url.trim()).map_err(|e| invalid(e.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("expected an http(s) URL, got scheme '{}'", parsed.scheme())));
    }
    if parsed.host_str().is_none_or(str::is_empty) {
        return Err(invalid("URL has no host".into()));
    }
    Ok(parsed)
}

/// Derive a file-safe name from a URL: the last path segment, else the host.
///
/// Characters outside `[a-zA-Z0-9-]` become `-` and the result is lowercased.
/// A URL that does not parse as http(s) with a host yields `"form"`.
pub fn form_name_from_url(url: &str) -> String {
    let Ok(parsed) = parse_form_url(url) else {
        return "form".into();
    };
    let Some(host) = parsed.host_str() else {
        return "form".into();
    };

    let last = parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .unwrap_or(host);
    last.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '-' })
        .collect::<String>()
        .to_lowercase()
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
