use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::info;

use linkhop_core::{logging, Config, HttpFetcher, ResolutionRequest, Resolver};
use linkhop_hosts::default_registry;

#[derive(Parser, Debug)]
#[command(name = "linkhop")]
#[command(
    about = "Resolve file-hosting and video-hosting pages into playable streams",
    long_about = None
)]
struct Cli {
    /// Configuration file (TOML, YAML or JSON)
    #[arg(long, global = true, env = "LINKHOP_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a page URL and print the result as JSON
    Resolve {
        /// Page URL
        url: String,

        /// Referer to send and hand to the player
        #[arg(long)]
        referer: Option<String>,

        /// Per-fetch timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Sort streams best quality first
        #[arg(long)]
        rank: bool,
    },

    /// List strategies in priority order
    Strategies,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Load configuration, command-line flags override file and env
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Command::Resolve {
        timeout_ms, rank, ..
    } = &cli.command
    {
        if let Some(timeout_ms) = timeout_ms {
            config.resolver.timeout_ms = *timeout_ms;
        }
        if *rank {
            config.resolver.rank_by_quality = true;
        }
    }

    if let Err(errors) = config.validate() {
        for e in &errors {
            eprintln!("Config validation error: {e}");
        }
        return Err(anyhow::anyhow!(
            "Configuration validation failed with {} error(s)",
            errors.len()
        ));
    }

    // 2. Initialize logging
    logging::init_logging(&config.logging)?;

    let registry = default_registry();

    match cli.command {
        Command::Strategies => {
            for (position, name) in registry.names().iter().enumerate() {
                println!("{}. {name}", position + 1);
            }
        }
        Command::Resolve { url, referer, .. } => {
            let fetcher = HttpFetcher::new(&config.resolver)?;
            let resolver = Resolver::new(registry, Arc::new(fetcher), config.resolver);

            let mut request = ResolutionRequest::new(url);
            if let Some(referer) = referer {
                request = request.with_referer(referer);
            }

            info!(url = %request.page_url, "Resolving");
            let resolution = resolver
                .resolve(&request)
                .await
                .with_context(|| format!("Failed to resolve {}", request.page_url))?;
            info!(
                streams = resolution.streams.len(),
                subtitles = resolution.subtitles.len(),
                failures = resolution.failures.len(),
                "Resolution finished"
            );

            println!("{}", serde_json::to_string_pretty(&resolution)?);
        }
    }

    Ok(())
}
