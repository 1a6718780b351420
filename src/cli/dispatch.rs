use anyhow::Result;

use super::config::cmd_config;
use super::detect::cmd_detect;
use super::env::CliArgs;
use super::fill::{cmd_fill, cmd_fill_group};
use super::info::cmd_info;
use super::profiles::cmd_profiles;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Fill(args) => cmd_fill(args, ctx).await,
        Commands::FillGroup(args) => cmd_fill_group(args, ctx).await,
        Commands::Detect(args) => cmd_detect(args, ctx).await,
        Commands::Profiles(args) => cmd_profiles(args, ctx).await,
        Commands::Config(args) => cmd_config(args, ctx).await,
        Commands::Info => cmd_info(ctx).await,
    }
}
