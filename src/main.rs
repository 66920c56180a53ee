use anyhow::{Context, Result};
use clap::Parser;
use range_client::utils::logger::init_logger;
use range_client::{QueryExpander, RangeConfig};
use std::path::PathBuf;

/// Expand or collapse range expressions against a range server
#[derive(Debug, Parser)]
#[command(name = "range-query", version)]
struct Args {
    /// Range server as host:port (overrides the config file)
    #[arg(long)]
    host: Option<String>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the collapsed expression instead of one name per line
    #[arg(long)]
    collapse: bool,

    /// Longest expression sent in a single request
    #[arg(long)]
    max_chars: Option<usize>,

    /// Program name reported in the User-Agent
    #[arg(long)]
    user_agent: Option<String>,

    /// Print results as JSON
    #[arg(long)]
    json: bool,

    /// Write logs to a timestamped file in this directory
    #[arg(long)]
    log_dir: Option<String>,

    /// Expressions, joined with commas
    #[arg(required = true)]
    expr: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.log_dir.as_deref(), "warn")?;

    let mut config = RangeConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(max_chars) = args.max_chars {
        config.max_chars = max_chars;
    }
    if let Some(user_agent) = args.user_agent {
        config.user_agent = Some(user_agent);
    }

    let range = QueryExpander::from_config(config)?;

    if args.collapse {
        let collapsed = range.collapse(args.expr).await?;
        if args.json {
            println!("{}", serde_json::to_string(&collapsed)?);
        } else {
            println!("{}", collapsed.trim_end());
        }
    } else {
        let expansion = range.expand(args.expr).await?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&expansion)?);
        } else {
            for name in expansion.flatten() {
                println!("{}", name);
            }
        }
    }

    Ok(())
}
