//! The discovery loop: the heart of FormScout.
//!
//! One run follows this cycle:
//!
//! 1. **Catalog**: list the automation backend's tools once
//! 2. **Seed**: bring the browser to the form
//! 3. **Ask**: send the conversation and catalog to the model
//! 4. **If tool calls**: run them one by one, append the outcomes, go to 3
//! 5. **If the model ends its turn**: scan the assistant text for the
//!    `TEST_FILE` and `DATA_GENERATOR` blocks and write them out
//!
//! The loop also ends when the iteration limit is reached. Five iterations
//! before the limit the model is nudged to produce its output.

pub mod catalog;
pub mod dispatcher;
pub mod extract;
pub mod loop_runner;
pub mod output;
pub mod pipeline;
pub mod prompts;
pub mod seeds;

#[cfg(test)]
mod test_helpers;

pub use catalog::ToolCatalog;
pub use dispatcher::ToolDispatcher;
pub use extract::{ExtractedArtifacts, extract};
pub use loop_runner::{DiscoveryLoop, RunOutcome, RunState, StopCondition};
pub use output::save_files;
pub use pipeline::{RunReport, RunSettings, run_discovery};
pub use prompts::{discovery_prompt, nudge_prompt};
pub use seeds::{Seed, available_seeds, resolve_seed};
