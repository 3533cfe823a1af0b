//! `formscout tools`: print the automation backend's catalog.

use std::path::Path;

use formscout_agent::ToolCatalog;
use formscout_config::DiscoveryConfig;
use formscout_core::tool::ToolBackend;
use formscout_mcp::McpClient;

use super::server_config;

pub async fn run(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = DiscoveryConfig::load(config_path)?;
    let server = server_config(&config);

    println!("Starting {} {}...", server.command, server.args.join(" "));
    let client = McpClient::spawn(&server).await?;

    let listed = ToolCatalog::fetch(&client).await;
    if let Err(e) = client.close().await {
        tracing::warn!(error = %e, "Failed to close automation backend");
    }
    let catalog = listed?;

    println!();
    println!("{} tools available:", catalog.len());
    for tool in catalog.descriptors() {
        let description = tool
            .description
            .as_deref()
            .and_then(|d| d.lines().next())
            .unwrap_or("");
        println!("  {:<28} {}", tool.name, description);
    }

    Ok(())
}
