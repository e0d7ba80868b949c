//! wiki-edit-mcp - MCP server for editing MediaWiki pages
//!
//! This binary exposes the `edit_page` tool over stdio to AI assistants
//! like GitHub Copilot and Claude Desktop.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use wiki_edit_mcp::config::{DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS};
use wiki_edit_mcp::{McpServer, WikiClient, WikiConfig};

/// MCP server for editing MediaWiki pages.
#[derive(Parser, Debug)]
#[command(name = "wiki-edit-mcp")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// MediaWiki Action API endpoint.
    #[arg(long, env = "WIKI_API_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Per-request HTTP timeout in seconds (0 disables it).
    #[arg(long, env = "WIKI_HTTP_TIMEOUT_SECS", default_value_t = DEFAULT_TIMEOUT_SECS)]
    timeout_secs: u64,

    /// User-Agent sent to the wiki.
    #[arg(long, env = "WIKI_USER_AGENT")]
    user_agent: Option<String>,

    /// Enable verbose logging.
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON.
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    init_logging(&args);

    tracing::info!(
        "Starting {} v{}",
        wiki_edit_mcp::server::SERVER_NAME,
        wiki_edit_mcp::server::SERVER_VERSION
    );

    match run(args).await {
        Ok(()) => {
            tracing::info!("Server exited cleanly");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("Server error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(args: &Args) {
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    // Log to stderr (not stdout, which is used for MCP protocol)
    let registry = tracing_subscriber::registry().with(filter);
    if args.log_json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = WikiConfig::new(&args.endpoint, args.timeout_secs, args.user_agent)
        .context("invalid wiki configuration")?;
    tracing::info!(endpoint = %config.endpoint, "Using wiki endpoint");

    let wiki = WikiClient::new(&config).context("failed to set up wiki client")?;
    let server = McpServer::new(wiki);

    server.run_stdio().await.context("stdio transport failed")?;
    Ok(())
}
