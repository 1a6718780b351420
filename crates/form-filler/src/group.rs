//! Multi-record fill: shared details once, then one staggered task per member.
//!
//! Each member runs at `index * member_stagger` and picks its strategy when it runs, since
//! pages often render member rows lazily:
//!
//! * index strategy: the page carries indexed inputs (`input[name="fname"][id="<i>"]`);
//! * section strategy: the matcher runs inside the member's detected section, or the whole
//!   document when there are fewer sections than members.
//!
//! Within a member, gender and ID-type dropdowns are resolved in sequence and idNumber is
//! written last. Each step waits for the previous one or its fixed delay, whichever is sooner.

use std::time::Duration;

use fastfill_core_types::{FieldMap, FieldType, FillResult, GroupProfileRecord};
use page_dom::{Compound, NodeId, PageDom, Scope, Selector, Tone};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::errors::FillError;
use crate::injector;
use crate::notify;
use crate::orchestrator::{self, FollowUp, GENERAL_FIELDS, PERSON_FIELDS};
use crate::sections;
use crate::session::{Completion, FillContext};
use crate::wait;

/// How a member's inputs are located.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MemberStrategy {
    Index,
    Section,
}

/// `name` attribute of each indexed member input.
fn indexed_name(field: FieldType) -> Option<&'static str> {
    match field {
        FieldType::FullName => Some("fname"),
        FieldType::Age => Some("age"),
        FieldType::Gender => Some("gender"),
        FieldType::IdType => Some("photoIdType"),
        FieldType::IdNumber => Some("idProofNumber"),
        _ => None,
    }
}

fn indexed_input(name: &str, index: usize) -> Selector {
    Compound::tag("input")
        .with_attr_eq("name", name)
        .with_attr_eq("id", &index.to_string())
        .into()
}

fn gender_triggers() -> Selector {
    Selector::any_of([
        Compound::tag("input").with_attr_contains("name", "gender").into(),
        Compound::tag("input")
            .with_attr_contains("formcontrolname", "gender")
            .into(),
    ])
}

fn id_type_triggers() -> Selector {
    Selector::any_of([
        Compound::tag("input").with_attr_contains("name", "photoIdType").into(),
        Compound::tag("input").with_attr_contains("name", "idType").into(),
        Compound::tag("input")
            .with_attr_contains("formcontrolname", "idType")
            .into(),
    ])
}

async fn find_indexed(
    page: &dyn PageDom,
    field: FieldType,
    index: usize,
) -> Result<Option<NodeId>, FillError> {
    let Some(name) = indexed_name(field) else {
        return Ok(None);
    };
    Ok(page
        .query_first(Scope::Document, &indexed_input(name, index))
        .await?)
}

/// Index strategy applies when the member's indexed name input exists.
pub async fn strategy_for(page: &dyn PageDom, index: usize) -> Result<MemberStrategy, FillError> {
    if find_indexed(page, FieldType::FullName, index).await?.is_some() {
        Ok(MemberStrategy::Index)
    } else {
        Ok(MemberStrategy::Section)
    }
}

fn non_empty(member: &FieldMap, field: FieldType) -> Option<String> {
    member.get(field).filter(|value| !value.is_empty())
}

/// Schedules an immediate dropdown resolution when both trigger and value exist.
fn overlay_now(
    ctx: &FillContext,
    trigger: Option<NodeId>,
    value: Option<&str>,
    label: &'static str,
) -> Option<Completion> {
    match (trigger, value) {
        (Some(trigger), Some(value)) => Some(injector::schedule_overlay(
            ctx,
            trigger,
            value,
            Duration::ZERO,
            label,
            1,
        )),
        _ => None,
    }
}

/// Indexed input lookup with failures contained: a page error reads as "no such input".
async fn locate_indexed(page: &dyn PageDom, field: FieldType, index: usize) -> Option<NodeId> {
    match find_indexed(page, field, index).await {
        Ok(node) => node,
        Err(err) => {
            warn!(%field, index, error = %err, "indexed lookup failed");
            None
        }
    }
}

async fn locate_trigger(
    page: &dyn PageDom,
    scope: Scope,
    selector: &Selector,
    label: &'static str,
) -> Option<NodeId> {
    match page.query_first(scope, selector).await {
        Ok(node) => node,
        Err(err) => {
            warn!(trigger = label, error = %err, "trigger lookup failed");
            None
        }
    }
}

/// Writes one indexed field. Returns whether the value landed.
async fn write_indexed(
    page: &dyn PageDom,
    field: FieldType,
    index: usize,
    member: &FieldMap,
) -> bool {
    let Some(value) = non_empty(member, field) else {
        return false;
    };
    let Some(node) = locate_indexed(page, field, index).await else {
        return false;
    };
    match injector::write_text(page, node, &value).await {
        Ok(()) => true,
        Err(err) => {
            warn!(%field, index, error = %err, "member field fill failed");
            false
        }
    }
}

async fn fill_member_by_index(
    ctx: &FillContext,
    index: usize,
    member: &FieldMap,
) -> Result<u32, FillError> {
    let page = ctx.page();
    let timings = &ctx.policy.timings;
    let cancel = ctx.session.token();
    let mut written = 0u32;

    for field in PERSON_FIELDS {
        if write_indexed(page, field, index, member).await {
            written += 1;
        }
    }

    wait::settle(None, timings.gender_dropdown_delay(), cancel).await?;
    let gender = overlay_now(
        ctx,
        locate_indexed(page, FieldType::Gender, index).await,
        non_empty(member, FieldType::Gender).as_deref(),
        "member-gender-dropdown",
    );

    wait::settle(gender, timings.id_type_dropdown_delay(), cancel).await?;
    let id_type = overlay_now(
        ctx,
        locate_indexed(page, FieldType::IdType, index).await,
        non_empty(member, FieldType::IdType).as_deref(),
        "member-id-type-dropdown",
    );

    wait::settle(id_type, timings.id_number_settle(), cancel).await?;
    if write_indexed(page, FieldType::IdNumber, index, member).await {
        written += 1;
    }
    Ok(written)
}

async fn fill_member_by_section(
    ctx: &FillContext,
    index: usize,
    member: &FieldMap,
) -> Result<u32, FillError> {
    let page = ctx.page();
    let timings = &ctx.policy.timings;
    let cancel = ctx.session.token();

    let sections = sections::detect_sections(page).await.unwrap_or_else(|err| {
        warn!(index, error = %err, "section detection failed");
        Vec::new()
    });
    let scope = match sections.get(index) {
        Some(section) => Scope::Element(*section),
        None => {
            debug!(index, "no section for member; using whole document");
            Scope::Document
        }
    };

    let mut written = 0u32;
    for field in PERSON_FIELDS {
        let value = member.get(field);
        if orchestrator::attempt(ctx, field, value.as_deref(), scope, FollowUp::Suppressed).await {
            written += 1;
        }
    }

    wait::settle(None, timings.gender_dropdown_delay(), cancel).await?;
    let gender = overlay_now(
        ctx,
        locate_trigger(page, scope, &gender_triggers(), "member-gender-dropdown").await,
        non_empty(member, FieldType::Gender).as_deref(),
        "member-gender-dropdown",
    );

    wait::settle(gender, timings.id_type_dropdown_delay(), cancel).await?;
    let id_type = overlay_now(
        ctx,
        locate_trigger(page, scope, &id_type_triggers(), "member-id-type-dropdown").await,
        non_empty(member, FieldType::IdType).as_deref(),
        "member-id-type-dropdown",
    );

    wait::settle(id_type, timings.id_number_settle(), cancel).await?;
    let id_number = member.get(FieldType::IdNumber);
    if orchestrator::attempt(
        ctx,
        FieldType::IdNumber,
        id_number.as_deref(),
        scope,
        FollowUp::Suppressed,
    )
    .await
    {
        written += 1;
    }
    Ok(written)
}

/// Runs one member's choreography with the strategy the page supports right now.
pub async fn fill_member(
    ctx: &FillContext,
    index: usize,
    member: &FieldMap,
) -> Result<u32, FillError> {
    let strategy = strategy_for(ctx.page(), index).await?;
    debug!(index, ?strategy, "filling member");
    match strategy {
        MemberStrategy::Index => fill_member_by_index(ctx, index, member).await,
        MemberStrategy::Section => fill_member_by_section(ctx, index, member).await,
    }
}

/// Fills the shared details, schedules every member, and returns immediately with an
/// estimated count. The exact tally is available from the session once it is joined.
#[instrument(skip_all, fields(session = %ctx.session.id(), members = group.member_count()))]
pub async fn fill_group(
    ctx: &FillContext,
    group: &GroupProfileRecord,
) -> Result<FillResult, FillError> {
    let started = Instant::now();
    orchestrator::ensure_reachable(ctx).await?;

    let mut general = 0u32;
    for field in GENERAL_FIELDS {
        let value = group.general_details.get(field);
        if orchestrator::attempt(ctx, field, value.as_deref(), Scope::Document, FollowUp::Overlay)
            .await
        {
            general += 1;
        }
    }

    let timings = &ctx.policy.timings;
    for (index, member) in group.pilgrims.iter().enumerate() {
        let task_ctx = ctx.clone();
        let member = member.clone();
        ctx.session
            .spawn_after(timings.member_stagger(index), "group-member", async move {
                fill_member(&task_ctx, index, &member).await
            });
    }

    let members = group.member_count() as u32;
    let filled = general + members * timings.per_member_estimate;
    let duration_ms = started.elapsed().as_millis() as u64;
    info!(general, filled, duration_ms, "group fill scheduled");
    notify::announce(ctx, notify::group_message(group.member_count()), Tone::Success).await;

    Ok(FillResult {
        filled_count: filled,
        duration_ms,
    })
}
