//! Output writer for extracted artifacts.

use std::path::{Path, PathBuf};

use formscout_core::error::{Error, Result};
use tracing::{info, warn};

use crate::extract::ExtractedArtifacts;

/// Write `{base_name}.spec.ts` and `{base_name}.data.ts` for whichever
/// artifacts are present. Returns the written paths.
pub async fn save_files(
    artifacts: &ExtractedArtifacts,
    output_dir: &Path,
    base_name: &str,
) -> Result<Vec<PathBuf>> {
    if artifacts.is_empty() {
        warn!(
            output_dir = %output_dir.display(),
            "No files were extracted; the model did not produce the expected TEST_FILE / DATA_GENERATOR blocks"
        );
        return Ok(Vec::new());
    }

    tokio::fs::create_dir_all(output_dir).await.map_err(|e| Error::Output {
        path: output_dir.display().to_string(),
        reason: e.to_string(),
    })?;

    let mut written = Vec::new();
    let files = [
        (artifacts.test_code.as_deref(), "spec.ts", "test file"),
        (artifacts.data_code.as_deref(), "data.ts", "data file"),
    ];

    for (content, extension, kind) in files {
        let Some(content) = content else {
            continue;
        };
        let path = output_dir.join(format!("{base_name}.{extension}"));
        tokio::fs::write(&path, content).await.map_err(|e| Error::Output {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        info!(path = %path.display(), bytes = content.len(), "Generated {kind}");
        written.push(path);
    }

    Ok(written)
}
