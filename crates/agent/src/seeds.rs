//! Seed procedures.
//!
//! A seed runs once against the backend before the conversation starts, to
//! bring the browser to the form (log in, click through menus, dismiss
//! overlays). A tool call that fails outright is fatal, since the run has not
//! started yet.

use async_trait::async_trait;
use formscout_core::error::{Error, Result};
use formscout_core::tool::ToolBackend;
use serde_json::json;
use tracing::{info, warn};

use crate::dispatcher::preview;

/// Characters of seed tool output shown in logs.
const SEED_PREVIEW_CHARS: usize = 100;

/// Overlay elements that intercept clicks on common demo sites.
const AD_OVERLAY_SCRIPT: &str = "() => {
  document.querySelectorAll('#adplus-anchor, #fixedban, .ad-wrap, iframe[id*=\"google_ads\"]')
    .forEach(el => el.remove());
}";

#[async_trait]
pub trait Seed: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    async fn run(&self, backend: &dyn ToolBackend, form_url: &str) -> Result<()>;
}

/// Navigate to the form, then strip ad overlays.
pub struct DefaultSeed;

#[async_trait]
impl Seed for DefaultSeed {
    fn name(&self) -> &str {
        "default"
    }

    fn description(&self) -> &str {
        "Navigate to the form URL and remove common ad overlays"
    }

    async fn run(&self, backend: &dyn ToolBackend, form_url: &str) -> Result<()> {
        seed_call(self.name(), backend, "browser_navigate", json!({ "url": form_url })).await?;
        seed_call(
            self.name(),
            backend,
            "browser_evaluate",
            json!({ "function": AD_OVERLAY_SCRIPT }),
        )
        .await?;
        Ok(())
    }
}

/// Navigate to the form and nothing else.
pub struct NavigateSeed;

#[async_trait]
impl Seed for NavigateSeed {
    fn name(&self) -> &str {
        "navigate"
    }

    fn description(&self) -> &str {
        "Navigate to the form URL only"
    }

    async fn run(&self, backend: &dyn ToolBackend, form_url: &str) -> Result<()> {
        seed_call(self.name(), backend, "browser_navigate", json!({ "url": form_url })).await?;
        Ok(())
    }
}

/// All built-in seeds.
pub fn available_seeds() -> Vec<Box<dyn Seed>> {
    vec![Box::new(DefaultSeed), Box::new(NavigateSeed)]
}

pub fn resolve_seed(name: &str) -> Result<Box<dyn Seed>> {
    let name = if name.trim().is_empty() { "default" } else { name.trim() };
    let seeds = available_seeds();
    let known: Vec<String> = seeds.iter().map(|s| s.name().to_string()).collect();

    seeds.into_iter().find(|s| s.name() == name).ok_or_else(|| Error::Seed {
        seed: name.to_string(),
        reason: format!("unknown seed; available seeds: {}", known.join(", ")),
    })
}

/// Call one tool on behalf of a seed. A failed call aborts the seed; a
/// result flagged as an error is logged and returned.
pub async fn seed_call(
    seed: &str,
    backend: &dyn ToolBackend,
    tool: &str,
    arguments: serde_json::Value,
) -> Result<String> {
    info!(seed, tool, input = %arguments, "Seed tool call");

    let output = backend.call_tool(tool, arguments).await.map_err(|e| Error::Seed {
        seed: seed.to_string(),
        reason: e.to_string(),
    })?;

    let text = output.joined_text();
    if output.is_error {
        warn!(seed, tool, result = %preview(&text, SEED_PREVIEW_CHARS), "Seed tool reported an error, continuing");
        return Ok(text);
    }

    info!(seed, tool, result = %preview(&text, SEED_PREVIEW_CHARS), "Seed tool result");
    Ok(text)
}
