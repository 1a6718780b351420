use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::{Args, Subcommand};
use serde_json::Value as JsonValue;
use tokio::fs;

use crate::cli::context::CliContext;
use crate::config::Config;

#[derive(Args, Clone, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Print one value, addressed with a dotted key such as `timings.member_stagger_ms`
    Get {
        key: String,
    },

    /// Write the defaults to the configuration file
    Reset,

    /// Check the configuration file
    Validate,
}

pub async fn cmd_config(args: ConfigArgs, ctx: &CliContext) -> Result<()> {
    let path = ctx.config_path();
    match args.action {
        ConfigAction::Show => {
            println!("Current configuration ({}):", path.display());
            print!("{}", serde_yaml::to_string(ctx.config())?);
        }
        ConfigAction::Get { key } => {
            let json = serde_json::to_value(ctx.config())?;
            match lookup(&json, &key) {
                Some(value) => print!("{}", serde_yaml::to_string(value)?),
                None => bail!("{} not found in configuration", key),
            }
        }
        ConfigAction::Reset => {
            save_config_file(path, &Config::default()).await?;
            println!(
                "Configuration reset to defaults and written to {}",
                path.display()
            );
        }
        ConfigAction::Validate => {
            if fs::try_exists(path).await? {
                let raw = fs::read_to_string(path)
                    .await
                    .with_context(|| format!("reading {}", path.display()))?;
                let config: Config = serde_yaml::from_str(&raw)
                    .with_context(|| format!("parsing {}", path.display()))?;
                config.validate()?;
                println!("Configuration file {} is valid", path.display());
            } else {
                println!(
                    "No configuration file at {}; defaults are valid",
                    path.display()
                );
            }
        }
    }

    Ok(())
}

async fn save_config_file(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    fs::write(path, serde_yaml::to_string(config)?)
        .await
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn lookup<'a>(value: &'a JsonValue, key: &str) -> Option<&'a JsonValue> {
    key.split('.')
        .filter(|segment| !segment.is_empty())
        .try_fold(value, |current, segment| match current {
            JsonValue::Object(map) => map.get(segment),
            JsonValue::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dotted_keys_reach_nested_values() {
        let json = serde_json::to_value(Config::default()).unwrap();
        assert_eq!(
            lookup(&json, "timings.member_stagger_ms"),
            Some(&JsonValue::from(2000))
        );
        assert_eq!(
            lookup(&json, "timings.dropdown_poll_offsets_ms.2"),
            Some(&JsonValue::from(1000))
        );
        assert_eq!(lookup(&json, "allowed_domains.0"), Some(&JsonValue::from("irctc.co.in")));
        assert!(lookup(&json, "timings.missing").is_none());
    }
}
