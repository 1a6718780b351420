use anyhow::Result;
use clap::{Args, Subcommand};
use fastfill_core_types::{FieldType, GroupProfileRecord, ProfileRecord, ProfileStats};
use serde::Serialize;

use super::context::CliContext;

#[derive(Args, Clone, Debug)]
pub struct ProfilesArgs {
    #[command(subcommand)]
    pub action: ProfilesAction,
}

#[derive(Subcommand, Clone, Debug)]
pub enum ProfilesAction {
    /// List stored profiles
    List,

    /// Show one profile's values
    Show {
        /// Profile id, name or shortcut
        profile: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ProfileSummary {
    id: String,
    name: String,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    shortcut: Option<String>,
    fields: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    members: Option<usize>,
    use_count: u64,
    favorite: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    last_used: Option<String>,
}

impl ProfileSummary {
    fn single(profile: &ProfileRecord) -> Self {
        Self::with_stats(
            &profile.id.0,
            &profile.name,
            "single",
            profile.shortcut.clone(),
            profile.data.populated(),
            None,
            &profile.stats,
        )
    }

    fn group(profile: &GroupProfileRecord) -> Self {
        Self::with_stats(
            &profile.id.0,
            &profile.name,
            "group",
            profile.shortcut.clone(),
            profile.general_details.populated(),
            Some(profile.member_count()),
            &profile.stats,
        )
    }

    fn with_stats(
        id: &str,
        name: &str,
        kind: &'static str,
        shortcut: Option<String>,
        fields: usize,
        members: Option<usize>,
        stats: &ProfileStats,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind,
            shortcut,
            fields,
            members,
            use_count: stats.use_count,
            favorite: stats.favorite,
            last_used: stats.last_used_at().map(|at| at.to_rfc3339()),
        }
    }
}

pub async fn cmd_profiles(args: ProfilesArgs, ctx: &CliContext) -> Result<()> {
    let store = ctx.profiles().await?;
    match args.action {
        ProfilesAction::List => {
            let mut summaries: Vec<ProfileSummary> = store
                .single_profiles
                .iter()
                .map(ProfileSummary::single)
                .chain(store.master_profiles.iter().map(ProfileSummary::group))
                .collect();
            // Favorites first, then most used.
            summaries.sort_by(|a, b| {
                b.favorite
                    .cmp(&a.favorite)
                    .then(b.use_count.cmp(&a.use_count))
            });
            ctx.output().emit(&summaries, |summaries| {
                if summaries.is_empty() {
                    println!(
                        "No profiles in {}",
                        ctx.config().profiles_path.display()
                    );
                }
                for summary in summaries {
                    let star = if summary.favorite { "★" } else { " " };
                    let members = summary
                        .members
                        .map(|count| format!(", {count} member(s)"))
                        .unwrap_or_default();
                    println!(
                        "{star} {} [{}] {} - {} field(s){members}, used {}x",
                        summary.id, summary.kind, summary.name, summary.fields, summary.use_count
                    );
                }
            })
        }
        ProfilesAction::Show { profile } => {
            if let Ok(single) = store.single(&profile) {
                return ctx.output().emit(single, print_single);
            }
            let group = store.master(&profile)?;
            ctx.output().emit(group, print_group)
        }
    }
}

fn print_fields(indent: &str, data: &fastfill_core_types::FieldMap) {
    for field in FieldType::ALL {
        if let Some(value) = data.get(field) {
            println!("{indent}{}: {}", field.key(), value);
        }
    }
}

fn print_single(profile: &ProfileRecord) {
    println!("{} ({})", profile.name, profile.id);
    print_fields("  ", &profile.data);
}

fn print_group(profile: &GroupProfileRecord) {
    println!("{} ({}) - {} member(s)", profile.name, profile.id, profile.member_count());
    println!("  general:");
    print_fields("    ", &profile.general_details);
    for (index, member) in profile.pilgrims.iter().enumerate() {
        println!("  member {}:", index + 1);
        print_fields("    ", member);
    }
}
