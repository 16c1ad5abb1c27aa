// Standalone MCP server binary

use anyhow::{Context, Result};
use clap::Parser;
use kitbridge_core::MarketingApi;
use kitbridge_mcp::config::{ConfigOverrides, KitbridgeConfig};
use kitbridge_mcp::server::McpServer;
use kitbridge_mcp::state::AppState;
use kitbridge_mcp::tools::{ToolAccess, ToolRegistry};
use std::path::PathBuf;

/// Kit email-marketing API as MCP tools over stdio
#[derive(Debug, Parser)]
#[command(name = "kitbridge-mcp", version, about)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, env = "KITBRIDGE_CONFIG", default_value = "kitbridge.toml")]
    config: PathBuf,

    #[command(flatten)]
    overrides: ConfigOverrides,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the protocol, so logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kitbridge=info".into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let args = Args::parse();

    tracing::info!("Kitbridge MCP server starting...");

    let mut config = KitbridgeConfig::load(&args.config)?;
    config.apply(args.overrides);

    let state = AppState::new(&config).context("Failed to initialize application state")?;
    if let Err(e) = state.client.check_configuration() {
        // Tools still start; every remote call reports the same error
        tracing::warn!(error = %e, "Kit credentials are not configured");
    }

    let sweeper = state.start_sweeper();

    let registry = ToolRegistry::with_kit_tools(&state);
    tracing::info!(
        tools = registry.len(),
        write_tools = registry.names_with_access(ToolAccess::Write).len(),
        "Registered tools"
    );

    let server = McpServer::new(registry);
    let outcome = server.start().await;

    if let Some(sweeper) = sweeper {
        sweeper.abort();
    }
    tracing::info!("Kitbridge MCP server stopped");

    outcome
}
