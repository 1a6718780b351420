use anyhow::Result;
use serde::Serialize;

use super::context::CliContext;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SystemInfo {
    version: &'static str,
    build_date: &'static str,
    git_commit: &'static str,
    git_branch: &'static str,
    config_path: String,
    profiles_path: String,
    single_profiles: usize,
    group_profiles: usize,
    chrome: Option<String>,
    attach_to: Option<String>,
    headless: bool,
    allowed_domains: Vec<String>,
}

pub async fn cmd_info(ctx: &CliContext) -> Result<()> {
    let config = ctx.config();
    let browser = ctx.browser_config();
    let store = ctx.profiles().await?;

    let info = SystemInfo {
        version: env!("CARGO_PKG_VERSION"),
        build_date: option_env!("BUILD_DATE").unwrap_or("unknown"),
        git_commit: option_env!("GIT_HASH").unwrap_or("unknown"),
        git_branch: option_env!("GIT_BRANCH").unwrap_or("unknown"),
        config_path: ctx.config_path().display().to_string(),
        profiles_path: config.profiles_path.display().to_string(),
        single_profiles: store.single_profiles.len(),
        group_profiles: store.master_profiles.len(),
        chrome: browser
            .resolve_executable()
            .map(|path| path.display().to_string()),
        attach_to: browser.websocket_url.clone(),
        headless: browser.headless,
        allowed_domains: config.allowed_domains.clone(),
    };

    ctx.output().emit(&info, print_human)
}

fn print_human(info: &SystemInfo) {
    println!("Fastfill System Information");
    println!("===========================");
    println!("Version: {}", info.version);
    println!("Build Date: {}", info.build_date);
    println!("Git Commit: {} ({})", info.git_commit, info.git_branch);
    println!();

    println!("Configuration:");
    println!("- Config File: {}", info.config_path);
    println!(
        "- Profiles: {} ({} single, {} group)",
        info.profiles_path, info.single_profiles, info.group_profiles
    );
    println!("- Allowed Sites:");
    for domain in &info.allowed_domains {
        println!("  - {}", domain);
    }
    println!();

    println!("Browser:");
    match (&info.attach_to, &info.chrome) {
        (Some(ws), _) => println!("- Attach: {} ✓", ws),
        (None, Some(chrome)) => println!(
            "- Chrome: {} ✓ ({})",
            chrome,
            if info.headless { "headless" } else { "windowed" }
        ),
        (None, None) => println!("- Chrome: not found (set FASTFILL_CHROME or use --ws)"),
    }
}
