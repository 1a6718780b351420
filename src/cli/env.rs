use clap::Parser;
use std::path::PathBuf;

use super::commands::Commands;
use super::output::OutputFormat;

/// Fastfill - profile-driven autofill for booking forms
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Log level
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// Enable debug mode
    #[arg(short, long, global = true)]
    pub debug: bool,

    /// Output format
    #[arg(short, long, default_value = "human", global = true)]
    pub output: OutputFormat,

    #[command(flatten)]
    pub target: TargetArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Which browser tab a page command works on.
#[derive(clap::Args, Clone, Debug, Default)]
pub struct TargetArgs {
    /// Open this URL in a new tab instead of using the first open one
    #[arg(long, global = true, value_parser = parse_url)]
    pub url: Option<url::Url>,

    /// Attach to a running browser's DevTools websocket instead of launching one
    #[arg(long, global = true, value_name = "WS_URL")]
    pub ws: Option<String>,

    /// Launch the browser without a window
    #[arg(long, global = true)]
    pub headless: bool,

    /// Fill even when the page is not an allowed booking site
    #[arg(long, global = true)]
    pub force: bool,
}

fn parse_url(raw: &str) -> Result<url::Url, String> {
    url::Url::parse(raw).map_err(|err| format!("invalid url '{raw}': {err}"))
}
