use std::time::Duration;

use anyhow::Result;
use clap::Args;
use fastfill_core_types::{FillRequest, FillResponse};
use form_filler::{matcher, wait, FillEngine, FillService, SessionReport};
use page_dom::{PageDom, Scope};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::context::CliContext;
use super::target::BrowserTarget;

const CONTROL_POLL: Duration = Duration::from_millis(500);

#[derive(Args, Clone, Debug)]
pub struct FillArgs {
    /// Profile id, name or shortcut
    pub profile: String,

    /// Seconds to wait for form controls to render before filling
    #[arg(long, default_value_t = 10)]
    pub wait: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FillReport {
    pub action: &'static str,
    pub profile: String,
    pub url: String,
    pub response: FillResponse,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub follow_ups: Option<FollowUps>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FollowUps {
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
    /// Fields confirmed by scheduled work beyond the reported count.
    pub confirmed: u32,
}

impl From<SessionReport> for FollowUps {
    fn from(report: SessionReport) -> Self {
        Self {
            completed: report.completed,
            failed: report.failed,
            cancelled: report.cancelled,
            confirmed: report.confirmed,
        }
    }
}

pub async fn cmd_fill(args: FillArgs, ctx: &CliContext) -> Result<()> {
    let store = ctx.profiles().await?;
    let profile = store.single(&args.profile)?.clone();
    run(FillRequest::Single { profile }, args.wait, ctx).await
}

pub async fn cmd_fill_group(args: FillArgs, ctx: &CliContext) -> Result<()> {
    let store = ctx.profiles().await?;
    let master_profile = store.master(&args.profile)?.clone();
    run(FillRequest::Group { master_profile }, args.wait, ctx).await
}

async fn run(request: FillRequest, wait_secs: u64, ctx: &CliContext) -> Result<()> {
    ctx.config().validate()?;
    let target = BrowserTarget::open(ctx).await?;
    let result = fill_on(&target, request, Duration::from_secs(wait_secs), ctx).await;
    if let Ok(report) = &result {
        ctx.output().emit(report, print_human)?;
    }
    let hold = result.is_ok() && !ctx.browser_config().headless;
    target.release(hold).await?;
    result.map(|_| ())
}

async fn fill_on(
    target: &BrowserTarget,
    request: FillRequest,
    wait_for: Duration,
    ctx: &CliContext,
) -> Result<FillReport> {
    let url = target.ensure_allowed(ctx).await?;
    let page = target.page();

    let controls = wait_for_controls(page.as_ref(), wait_for).await?;
    if controls == 0 {
        warn!(waited_secs = wait_for.as_secs(), "no form controls rendered yet; filling anyway");
    }

    let engine = FillEngine::builder(page)
        .with_policy(ctx.config().policy())
        .with_patterns(ctx.config().patterns())
        .build();
    let service = FillService::with_engine(engine);

    let action = request.kind();
    let profile = request.profile_name().to_string();
    let response = service.send(request).await?;
    let follow_ups = service.join_current().await;
    service.shutdown();

    if let Some(report) = &follow_ups {
        info!(
            reported = response.filled_count.unwrap_or_default(),
            confirmed = report.confirmed,
            completed = report.completed,
            failed = report.failed,
            cancelled = report.cancelled,
            "follow-up work finished"
        );
    }

    Ok(FillReport {
        action,
        profile,
        url,
        response,
        follow_ups: follow_ups.map(FollowUps::from),
    })
}

async fn wait_for_controls(page: &dyn PageDom, bound: Duration) -> Result<usize> {
    let selector = &matcher::controls();
    let found = wait::poll_until(CONTROL_POLL, bound, &CancellationToken::new(), move || async move {
        page.query_all(Scope::Document, selector)
            .await
            .ok()
            .map(|nodes| nodes.len())
            .filter(|count| *count > 0)
    })
    .await?;
    Ok(found.unwrap_or_default())
}

fn print_human(report: &FillReport) {
    match (&report.response.error, report.response.filled_count) {
        (Some(error), _) => println!("❌ Autofill failed for '{}': {}", report.profile, error),
        (None, count) => println!(
            "✅ Filled {} field(s) from '{}' on {}",
            count.unwrap_or_default(),
            report.profile,
            report.url
        ),
    }
    if let Some(follow_ups) = &report.follow_ups {
        println!(
            "   follow-ups: {} completed, {} failed, {} cancelled; {} more field(s) confirmed",
            follow_ups.completed, follow_ups.failed, follow_ups.cancelled, follow_ups.confirmed
        );
    }
}
