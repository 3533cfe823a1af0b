pub mod discover;
pub mod seeds;
pub mod tools;

use std::time::Duration;

use formscout_config::DiscoveryConfig;
use formscout_mcp::McpServerConfig;

/// How to launch the automation backend for this config.
pub fn server_config(config: &DiscoveryConfig) -> McpServerConfig {
    let backend = &config.backend;
    McpServerConfig {
        name: "playwright".into(),
        command: backend.command.clone(),
        args: backend.launch_args(config.browser, config.headless),
        env: backend.env.clone(),
        init_timeout: Duration::from_secs(backend.init_timeout_secs),
        call_timeout: backend.call_timeout_secs.map(Duration::from_secs),
    }
}
