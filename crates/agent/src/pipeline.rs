//! One full discovery run: catalog, seed, loop, save.
//!
//! The backend handle is created by the caller and released here, on every
//! exit path.

use std::path::PathBuf;
use std::sync::Arc;

use formscout_core::error::Result;
use formscout_core::provider::Provider;
use formscout_core::tool::ToolBackend;
use formscout_providers::{ModelGateway, RetryPolicy};
use tracing::{info, warn};

use crate::catalog::ToolCatalog;
use crate::loop_runner::{DiscoveryLoop, StopCondition};
use crate::output::save_files;
use crate::prompts::discovery_prompt;
use crate::seeds::resolve_seed;

/// Everything a run needs besides its two client handles.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub form_url: String,
    /// Base name of the generated files
    pub form_name: String,
    pub seed: String,
    pub output_dir: PathBuf,
    pub model: String,
    pub max_tokens: u32,
    pub max_iterations: u32,
    pub retry: RetryPolicy,
}

#[derive(Debug, Clone)]
pub struct RunReport {
    pub iterations: u32,
    pub stop: StopCondition,
    pub tools: usize,
    pub written: Vec<PathBuf>,
}

/// Run discovery against `backend`, then close it whatever the result.
pub async fn run_discovery(
    provider: Arc<dyn Provider>,
    backend: Arc<dyn ToolBackend>,
    settings: &RunSettings,
) -> Result<RunReport> {
    let result = run_with_backend(provider, backend.clone(), settings).await;

    if let Err(e) = backend.close().await {
        warn!(backend = %backend.name(), error = %e, "Failed to close automation backend");
    }

    result
}

async fn run_with_backend(
    provider: Arc<dyn Provider>,
    backend: Arc<dyn ToolBackend>,
    settings: &RunSettings,
) -> Result<RunReport> {
    let seed = resolve_seed(&settings.seed)?;

    let catalog = ToolCatalog::fetch(backend.as_ref()).await?;

    info!(seed = %seed.name(), url = %settings.form_url, "Running seed");
    seed.run(backend.as_ref(), &settings.form_url).await?;

    let gateway = ModelGateway::new(provider, settings.retry);
    let discovery = DiscoveryLoop::new(gateway, backend, settings.model.clone())
        .with_max_iterations(settings.max_iterations)
        .with_max_tokens(settings.max_tokens);

    let outcome = discovery
        .run(discovery_prompt(&settings.form_url), catalog.definitions())
        .await?;

    let written = save_files(&outcome.artifacts, &settings.output_dir, &settings.form_name).await?;

    Ok(RunReport {
        iterations: outcome.iterations,
        stop: outcome.stop,
        tools: catalog.len(),
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use formscout_core::error::{BackendError, Error};
    use serde_json::json;
    use std::time::Duration;

    fn settings(dir: &std::path::Path) -> RunSettings {
        RunSettings {
            form_url: "https://example.com/signup".into(),
            form_name: "signup".into(),
            seed: "navigate".into(),
            output_dir: dir.to_path_buf(),
            model: "mock-model".into(),
            max_tokens: 1024,
            max_iterations: 10,
            retry: RetryPolicy::new(3, Duration::from_secs(10)),
        }
    }

    #[tokio::test]
    async fn seed_runs_before_first_model_call() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::new(vec![
            tool_response(vec![invocation("t1", "browser_snapshot", json!({}))]),
            text_response(ARTIFACT_TEXT),
        ]));
        let backend = Arc::new(ScriptedBackend::new(vec![
            descriptor("browser_navigate"),
            descriptor("browser_snapshot"),
        ]));

        let report = run_discovery(provider.clone(), backend.clone(), &settings(dir.path()))
            .await
            .unwrap();

        let names: Vec<String> = backend.calls().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["browser_navigate", "browser_snapshot"]);
        assert_eq!(report.iterations, 2);
        assert_eq!(report.tools, 2);
        assert_eq!(report.stop, StopCondition::Completed);
        assert_eq!(report.written.len(), 2);

        // Both tools are offered to the model
        assert_eq!(provider.requests()[0].tools.len(), 2);
    }

    #[tokio::test]
    async fn flagged_seed_step_still_reaches_model() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::new(vec![text_response(ARTIFACT_TEXT)]));
        let backend = Arc::new(
            ScriptedBackend::new(vec![descriptor("browser_navigate"), descriptor("browser_evaluate")])
                .flagging_tool("browser_evaluate"),
        );
        let mut settings = settings(dir.path());
        settings.seed = "default".into();

        let report = run_discovery(provider.clone(), backend.clone(), &settings).await.unwrap();
        assert_eq!(provider.call_count(), 1);
        assert_eq!(report.stop, StopCondition::Completed);
        assert_eq!(report.written.len(), 2);
    }

    #[tokio::test]
    async fn unknown_seed_fails_before_listing() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let backend = Arc::new(ScriptedBackend::new(vec![]));
        let mut settings = settings(dir.path());
        settings.seed = "login".into();

        let err = run_discovery(provider.clone(), backend.clone(), &settings).await.unwrap_err();
        assert!(matches!(err, Error::Seed { .. }));
        assert!(backend.calls().is_empty());
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn unavailable_catalog_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let backend = Arc::new(
            ScriptedBackend::new(vec![]).failing_listing(BackendError::Unavailable("spawn failed".into())),
        );

        let err = run_discovery(provider.clone(), backend, &settings(dir.path())).await.unwrap_err();
        assert!(matches!(err, Error::Backend(BackendError::Unavailable(_))));
        assert_eq!(provider.call_count(), 0);
    }
}
