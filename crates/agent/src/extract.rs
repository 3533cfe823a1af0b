//! Artifact Extraction Pass.
//!
//! Scans the assistant's text for the two labeled fenced blocks:
//!
//! ````text
//! ```TEST_FILE
//! ...
//! ```
//!
//! ```DATA_GENERATOR
//! ...
//! ```
//! ````
//!
//! The first occurrence of each label wins. Bodies are trimmed, and a block
//! that is empty after trimming counts as absent.

use regex_lite::Regex;

pub const TEST_FILE_LABEL: &str = "TEST_FILE";
pub const DATA_GENERATOR_LABEL: &str = "DATA_GENERATOR";

/// The two artifacts a run can produce. Either, both or neither may be found.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedArtifacts {
    pub test_code: Option<String>,
    pub data_code: Option<String>,
}

impl ExtractedArtifacts {
    pub fn is_empty(&self) -> bool {
        self.test_code.is_none() && self.data_code.is_none()
    }
}

/// Pure and idempotent.
pub fn extract(text: &str) -> ExtractedArtifacts {
    ExtractedArtifacts {
        test_code: fenced_block(text, TEST_FILE_LABEL),
        data_code: fenced_block(text, DATA_GENERATOR_LABEL),
    }
}

fn fenced_block(text: &str, label: &str) -> Option<String> {
    let pattern = format!(r"(?s)```{label}[ \t]*\r?\n(.*?)```");
    Regex::new(&pattern)
        .ok()?
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|body| body.as_str().trim())
        .filter(|body| !body.is_empty())
        .map(str::to_string)
}
