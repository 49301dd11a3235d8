//! kucoin-futures-mcp - KuCoin Futures API as MCP tools
//!
//! Serves JSON-RPC 2.0 over HTTP and forwards tool calls to the
//! KuCoin Futures REST API.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use tracing::info;

pub mod config;
pub mod connectors;
pub mod mcp;
pub mod server;

/// kucoin-futures-mcp: MCP gateway for KuCoin Futures
#[derive(Parser)]
#[command(name = "kucoin-futures-mcp", version)]
#[command(about = "Expose the KuCoin Futures REST API as MCP tools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the MCP HTTP server
    Serve {
        /// Address to listen on
        #[arg(short, long, env = "MCP_BIND_ADDR", default_value = "0.0.0.0:3000")]
        bind: SocketAddr,
    },

    /// Print the tool catalog as JSON
    ListTools,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    config::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind } => {
            let config = config::Config::from_env().context("Failed to load configuration")?;
            info!(?config, "Configuration loaded");
            server::serve(config, bind).await?;
        }
        Commands::ListTools => {
            let catalog = serde_json::to_string_pretty(mcp::catalog::tools())?;
            println!("{}", catalog);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_bind_flag() {
        let cli = Cli::try_parse_from(["kucoin-futures-mcp", "serve", "--bind", "127.0.0.1:8080"]).unwrap();
        match cli.command {
            Commands::Serve { bind } => assert_eq!(bind, "127.0.0.1:8080".parse::<SocketAddr>().unwrap()),
            Commands::ListTools => panic!("expected serve"),
        }
    }
}
