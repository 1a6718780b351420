use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use which::which;

/// Launch and attach settings for the Chromium backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CdpConfig {
    pub executable: PathBuf,
    pub user_data_dir: PathBuf,
    pub headless: bool,
    /// Attach to this DevTools endpoint instead of launching a browser.
    pub websocket_url: Option<String>,
    pub default_deadline_ms: u64,
}

impl Default for CdpConfig {
    fn default() -> Self {
        Self {
            executable: detect_chrome_executable().unwrap_or_default(),
            user_data_dir: default_profile_dir(),
            // Filling is interactive; a visible window is the useful default.
            headless: false,
            websocket_url: None,
            default_deadline_ms: 5_000,
        }
    }
}

impl CdpConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.default_deadline_ms)
    }

    /// Applies `FASTFILL_HEADLESS`, `FASTFILL_CHROME` and `FASTFILL_CHROME_PROFILE`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(headless) = env_flag("FASTFILL_HEADLESS") {
            self.headless = headless;
        }
        if let Some(path) = env_path("FASTFILL_CHROME") {
            self.executable = path;
        }
        if let Some(path) = env_path("FASTFILL_CHROME_PROFILE") {
            self.user_data_dir = path;
        }
        self
    }

    /// Configured executable when it exists, otherwise whatever detection finds.
    pub fn resolve_executable(&self) -> Option<PathBuf> {
        if !self.executable.as_os_str().is_empty() && self.executable.exists() {
            return Some(self.executable.clone());
        }
        detect_chrome_executable()
    }
}

fn env_flag(key: &str) -> Option<bool> {
    let value = env::var(key).ok()?;
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_path(key: &str) -> Option<PathBuf> {
    let raw = env::var(key).ok()?;
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| PathBuf::from(trimmed))
}

fn default_profile_dir() -> PathBuf {
    Path::new("./.fastfill-profile").into()
}

pub fn detect_chrome_executable() -> Option<PathBuf> {
    if let Some(candidate) = env_path("FASTFILL_CHROME") {
        if candidate.exists() {
            return Some(candidate);
        }
    }

    for name in chrome_executable_names() {
        if let Ok(path) = which(name) {
            return Some(path);
        }
    }

    let skip_defaults = env::var("FASTFILL_SKIP_OS_PATHS")
        .map(|value| !value.trim().is_empty())
        .unwrap_or(false);

    if !skip_defaults {
        for candidate in os_specific_chrome_paths() {
            if candidate.exists() {
                return Some(candidate);
            }
        }
    }

    None
}

fn chrome_executable_names() -> &'static [&'static str] {
    #[cfg(target_os = "windows")]
    {
        &["chrome.exe", "chromium.exe", "msedge.exe"]
    }

    #[cfg(any(target_os = "macos", target_os = "linux", target_os = "freebsd"))]
    {
        &[
            "google-chrome-stable",
            "google-chrome",
            "chromium",
            "chromium-browser",
        ]
    }

    #[cfg(not(any(
        target_os = "windows",
        target_os = "macos",
        target_os = "linux",
        target_os = "freebsd"
    )))]
    {
        &["chrome"]
    }
}

fn os_specific_chrome_paths() -> Vec<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let mut paths = Vec::new();
        for key in ["PROGRAMFILES", "PROGRAMFILES(X86)", "LOCALAPPDATA"] {
            if let Some(root) = env_path(key) {
                paths.push(root.join("Google/Chrome/Application/chrome.exe"));
                paths.push(root.join("Chromium/Application/chrome.exe"));
                paths.push(root.join("Microsoft/Edge/Application/msedge.exe"));
            }
        }
        paths
    }

    #[cfg(target_os = "macos")]
    {
        vec![
            PathBuf::from("/Applications/Google Chrome.app/Contents/MacOS/Google Chrome"),
            PathBuf::from("/Applications/Chromium.app/Contents/MacOS/Chromium"),
        ]
    }

    #[cfg(any(target_os = "linux", target_os = "freebsd"))]
    {
        vec![
            PathBuf::from("/usr/bin/google-chrome-stable"),
            PathBuf::from("/usr/bin/google-chrome"),
            PathBuf::from("/usr/bin/chromium-browser"),
            PathBuf::from("/usr/bin/chromium"),
        ]
    }

    #[cfg(not(any(
        target_os = "windows",
        target_os = "macos",
        target_os = "linux",
        target_os = "freebsd"
    )))]
    {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    // Environment variables are process-wide; keep every env-mutating assertion in one test.
    #[test]
    fn env_overrides_and_detection() {
        let dir = tempdir().unwrap();
        let exe_path = dir.path().join("my-chrome");
        fs::write(&exe_path, b"").unwrap();

        let saved: Vec<(&str, Option<String>)> = ["FASTFILL_CHROME", "FASTFILL_HEADLESS"]
            .into_iter()
            .map(|key| (key, env::var(key).ok()))
            .collect();

        env::set_var("FASTFILL_CHROME", exe_path.to_string_lossy().to_string());
        env::set_var("FASTFILL_HEADLESS", "on");
        let detected = detect_chrome_executable();
        let cfg = CdpConfig {
            headless: false,
            ..CdpConfig::default()
        }
        .with_env_overrides();

        env::set_var("FASTFILL_HEADLESS", "maybe");
        let unparsed = CdpConfig::default().with_env_overrides();

        for (key, value) in saved {
            match value {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }

        assert_eq!(detected, Some(exe_path.clone()));
        assert!(cfg.headless);
        assert_eq!(cfg.executable, exe_path);
        assert_eq!(cfg.resolve_executable(), Some(exe_path));
        assert!(!unparsed.headless);
    }

    #[test]
    fn partial_section_fills_missing_keys() {
        let cfg: CdpConfig =
            serde_json::from_str(r#"{ "headless": true, "websocket_url": "ws://127.0.0.1:9222/devtools/browser/x" }"#)
                .unwrap();
        assert!(cfg.headless);
        assert_eq!(cfg.deadline(), Duration::from_millis(5_000));
        assert_eq!(cfg.user_data_dir, PathBuf::from("./.fastfill-profile"));
    }
}
