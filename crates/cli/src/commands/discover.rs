//! `formscout discover`: one full discovery run.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use formscout_agent::{RunReport, RunSettings, StopCondition, resolve_seed, run_discovery};
use formscout_config::{Browser, DiscoveryConfig};
use formscout_core::error::Error;
use formscout_core::provider::Provider;
use formscout_core::tool::ToolBackend;
use formscout_mcp::McpClient;
use formscout_providers::{AnthropicProvider, RetryPolicy};

use super::server_config;

#[derive(Debug, Default, Args)]
pub struct DiscoverArgs {
    /// URL of the form to explore
    #[arg(short, long)]
    pub url: Option<String>,

    /// Base name for the generated files
    #[arg(short, long)]
    pub name: Option<String>,

    /// Seed procedure to run before the conversation
    #[arg(short, long)]
    pub seed: Option<String>,

    /// Directory for the generated files
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Model to use
    #[arg(short, long)]
    pub model: Option<String>,

    /// Maximum number of model calls
    #[arg(long)]
    pub max_iterations: Option<u32>,

    /// Browser engine: chromium, firefox or webkit
    #[arg(short, long)]
    pub browser: Option<Browser>,

    /// Run the browser headless
    #[arg(long)]
    pub headless: bool,
}

impl DiscoverArgs {
    /// Command-line flags win over the file and the environment.
    pub fn apply_to(&self, config: &mut DiscoveryConfig) {
        if let Some(url) = &self.url {
            config.form_url = url.clone();
        }
        if let Some(name) = &self.name {
            config.form_name = Some(name.clone());
        }
        if let Some(seed) = &self.seed {
            config.seed = seed.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(model) = &self.model {
            config.model = model.clone();
        }
        if let Some(max) = self.max_iterations {
            config.max_iterations = max;
        }
        if let Some(browser) = self.browser {
            config.browser = browser;
        }
        if self.headless {
            config.headless = true;
        }
    }
}

pub fn run_settings(config: &DiscoveryConfig) -> RunSettings {
    RunSettings {
        form_url: config.form_url.trim().to_string(),
        form_name: config.effective_form_name(),
        seed: config.seed.clone(),
        output_dir: config.output_dir.clone(),
        model: config.model.clone(),
        max_tokens: config.max_tokens,
        max_iterations: config.max_iterations,
        retry: RetryPolicy::new(
            config.max_retries,
            Duration::from_secs(config.retry_base_delay_secs),
        ),
    }
}

pub async fn run(config_path: Option<&Path>, args: DiscoverArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = DiscoveryConfig::load(config_path)?;
    args.apply_to(&mut config);
    config.validate()?;

    let Some(api_key) = config.api_key.clone().filter(|_| config.has_api_key()) else {
        return Err(Error::Config {
            message: "No API key configured. Set ANTHROPIC_API_KEY or api_key in formscout.toml".into(),
        }
        .into());
    };

    // Fail on a bad seed name before paying for a backend launch
    resolve_seed(&config.seed)?;

    let mut provider = AnthropicProvider::new(api_key)?;
    if let Some(url) = &config.api_url {
        provider = provider.with_base_url(url.clone());
    }
    let provider: Arc<dyn Provider> = Arc::new(provider);

    let settings = run_settings(&config);
    tracing::info!(
        url = %settings.form_url,
        name = %settings.form_name,
        seed = %settings.seed,
        model = %settings.model,
        browser = config.browser.as_str(),
        headless = config.headless,
        "Starting form discovery"
    );

    let client = McpClient::spawn(&server_config(&config)).await?;
    let backend: Arc<dyn ToolBackend> = Arc::new(client);

    let report = run_discovery(provider, backend, &settings).await?;
    print_summary(&settings, &report);
    Ok(())
}

fn print_summary(settings: &RunSettings, report: &RunReport) {
    println!();
    println!("Discovery finished for {}", settings.form_url);
    println!("  Iterations: {}/{}", report.iterations, settings.max_iterations);
    match report.stop {
        StopCondition::Completed => println!("  Stop:       model finished"),
        StopCondition::IterationLimit => println!("  Stop:       iteration limit reached"),
    }
    if report.written.is_empty() {
        println!("  Files:      none (no TEST_FILE or DATA_GENERATOR block found)");
    } else {
        for path in &report.written {
            println!("  Wrote:      {}", path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config() {
        let mut config = DiscoveryConfig {
            form_url: "https://from-file.example.com".into(),
            ..DiscoveryConfig::default()
        };
        let args = DiscoverArgs {
            url: Some("https://demoqa.com/automation-practice-form".into()),
            max_iterations: Some(12),
            browser: Some(Browser::Firefox),
            headless: true,
            ..DiscoverArgs::default()
        };

        args.apply_to(&mut config);
        assert_eq!(config.form_url, "https://demoqa.com/automation-practice-form");
        assert_eq!(config.max_iterations, 12);
        assert_eq!(config.browser, Browser::Firefox);
        assert!(config.headless);
        // Untouched fields keep their values
        assert_eq!(config.seed, "default");
    }

    #[test]
    fn absent_flags_leave_config_alone() {
        let mut config = DiscoveryConfig {
            headless: true,
            ..DiscoveryConfig::default()
        };
        DiscoverArgs::default().apply_to(&mut config);
        assert!(config.headless);
        assert_eq!(config.max_iterations, 20);
    }

    #[test]
    fn settings_derive_name_and_retry_policy() {
        let config = DiscoveryConfig {
            form_url: "https://demoqa.com/automation-practice-form".into(),
            retry_base_delay_secs: 2,
            ..DiscoveryConfig::default()
        };
        let settings = run_settings(&config);
        assert_eq!(settings.form_name, "automation-practice-form");
        assert_eq!(settings.retry.max_retries, 3);
        assert_eq!(settings.retry.delay_for(1), Duration::from_secs(4));
    }
}
