use anyhow::{Context, Result};
use clap::Args;
use form_filler::{detect_all_fields, match_report, FieldReport, MatchReport};
use serde::Serialize;

use super::context::CliContext;
use super::target::BrowserTarget;

#[derive(Args, Clone, Debug)]
pub struct DetectArgs {
    /// Also show which control each field type would be filled into
    #[arg(long)]
    pub matches: bool,
}

#[derive(Debug, Serialize)]
struct DetectReport {
    fields: Vec<FieldReport>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    matches: Vec<MatchReport>,
}

pub async fn cmd_detect(args: DetectArgs, ctx: &CliContext) -> Result<()> {
    let target = BrowserTarget::open(ctx).await?;
    let page = target.page();

    let fields = detect_all_fields(page.as_ref())
        .await
        .context("listing form controls")?;
    let matches = if args.matches {
        match_report(page.as_ref(), &ctx.config().patterns())
            .await
            .context("matching field types")?
    } else {
        Vec::new()
    };
    target.release(false).await?;

    ctx.output()
        .emit(&DetectReport { fields, matches }, print_human)
}

fn print_human(report: &DetectReport) {
    println!("Detected {} form control(s)", report.fields.len());
    for field in &report.fields {
        println!(
            "[{}] <{}> type={} name={} id={} formcontrolname={} placeholder={} aria-label={}",
            field.index,
            field.tag,
            show(&field.input_type),
            show(&field.name),
            show(&field.id),
            show(&field.form_control_name),
            show(&field.placeholder),
            show(&field.aria_label),
        );
    }
    if report.matches.is_empty() {
        return;
    }
    println!();
    println!("Field matches:");
    for entry in &report.matches {
        match (entry.control, &entry.pattern) {
            (Some(control), Some(pattern)) => {
                println!("- {} → control [{}] via '{}'", entry.field.key(), control, pattern)
            }
            _ => println!("- {} → no match", entry.field.key()),
        }
    }
}

fn show(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}
