use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use cdp_adapter::CdpConfig;
use tokio::sync::OnceCell;

use super::env::TargetArgs;
use super::output::OutputFormat;
use crate::config::Config;
use crate::profile_store::ProfileStore;

pub struct CliContext {
    config: Arc<Config>,
    config_path: PathBuf,
    output: OutputFormat,
    target: TargetArgs,
    profiles: OnceCell<Arc<ProfileStore>>,
}

impl CliContext {
    pub fn new(config: Config, config_path: PathBuf, output: OutputFormat, target: TargetArgs) -> Self {
        Self {
            config: Arc::new(config),
            config_path,
            output,
            target,
            profiles: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &Config {
        self.config.as_ref()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn output(&self) -> OutputFormat {
        self.output
    }

    pub fn target(&self) -> &TargetArgs {
        &self.target
    }

    /// Browser settings after environment and command-line overrides.
    pub fn browser_config(&self) -> CdpConfig {
        let mut browser = self.config.browser.clone().with_env_overrides();
        if self.target.headless {
            browser.headless = true;
        }
        if let Some(ws) = &self.target.ws {
            browser.websocket_url = Some(ws.clone());
        }
        browser
    }

    pub async fn profiles(&self) -> Result<Arc<ProfileStore>> {
        self.profiles
            .get_or_try_init(|| async {
                let path = &self.config.profiles_path;
                ProfileStore::load(path)
                    .await
                    .map(Arc::new)
                    .with_context(|| format!("loading profiles from {}", path.display()))
            })
            .await
            .map(Arc::clone)
    }
}
