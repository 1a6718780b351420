//! Host configuration, read from YAML.

use std::collections::BTreeMap;
use std::path::PathBuf;

use cdp_adapter::CdpConfig;
use fastfill_core_types::FieldType;
use form_filler::{FillPolicy, FillTimings, PatternRegistry};
use serde::{Deserialize, Serialize};

use crate::errors::HostError;

pub const DEFAULT_ALLOWED_DOMAINS: [&str; 4] = [
    "irctc.co.in",
    "ttdsevaonline.com",
    "ttdevasthanams.ap.gov.in",
    "bookmyshow.com",
];

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// JSON profile store written by the profile manager.
    pub profiles_path: PathBuf,
    /// Fills only run on pages whose URL contains one of these.
    pub allowed_domains: Vec<String>,
    pub browser: CdpConfig,
    pub timings: FillTimings,
    pub show_notifications: bool,
    pub cancel_superseded: bool,
    /// Site-specific tokens appended to the built-in pattern lists.
    pub extra_patterns: BTreeMap<FieldType, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profiles_path: default_profiles_path(),
            allowed_domains: DEFAULT_ALLOWED_DOMAINS
                .iter()
                .map(|domain| domain.to_string())
                .collect(),
            browser: CdpConfig::default(),
            timings: FillTimings::default(),
            show_notifications: true,
            cancel_superseded: true,
            extra_patterns: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), HostError> {
        self.timings.validate().map_err(HostError::InvalidConfig)?;
        if self.allowed_domains.iter().any(|domain| domain.trim().is_empty()) {
            return Err(HostError::InvalidConfig(
                "allowed_domains must not contain empty entries".into(),
            ));
        }
        Ok(())
    }

    pub fn is_allowed(&self, url: &str) -> bool {
        self.allowed_domains
            .iter()
            .any(|domain| url.contains(domain.as_str()))
    }

    pub fn policy(&self) -> FillPolicy {
        FillPolicy {
            timings: self.timings.clone(),
            cancel_superseded: self.cancel_superseded,
            show_notifications: self.show_notifications,
        }
    }

    pub fn patterns(&self) -> PatternRegistry {
        self.extra_patterns
            .iter()
            .fold(PatternRegistry::builtin(), |registry, (field, extra)| {
                registry.with_extra(*field, extra)
            })
    }
}

fn default_profiles_path() -> PathBuf {
    match dirs::data_dir() {
        Some(mut path) => {
            path.push("fastfill");
            path.push("profiles.json");
            path
        }
        None => PathBuf::from("profiles.json"),
    }
}
