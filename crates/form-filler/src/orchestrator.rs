//! Single-profile fill: fixed field order, idNumber gated on idType.

use std::time::Duration;

use fastfill_core_types::{FieldMap, FieldType, FillResult};
use page_dom::{Compound, NodeId, Scope, Selector, Tone};
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use crate::errors::FillError;
use crate::injector::{self, InjectOutcome};
use crate::matcher::{self, ElementKind};
use crate::notify;
use crate::session::{Completion, FillContext};
use crate::wait::{self, Settled};

/// Shared contact fields, filled first by both single and group fills.
pub const GENERAL_FIELDS: [FieldType; 5] = [
    FieldType::Email,
    FieldType::City,
    FieldType::State,
    FieldType::Country,
    FieldType::Pincode,
];

/// Per-person fields that precede the idType/idNumber pair.
pub const PERSON_FIELDS: [FieldType; 3] = [FieldType::FullName, FieldType::Age, FieldType::Gender];

/// Whether a text-filled overlay trigger also gets a scheduled dropdown attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowUp {
    Overlay,
    Suppressed,
}

/// A field that was matched and written.
#[derive(Debug)]
pub struct FieldFill {
    pub node: NodeId,
    pub outcome: InjectOutcome,
    pub follow_up: Option<Completion>,
}

/// Matches `field` in `scope` and injects `value`. An absent value is nothing to fill.
pub async fn fill_field(
    ctx: &FillContext,
    field: FieldType,
    value: Option<&str>,
    scope: Scope,
    follow_up: FollowUp,
) -> Result<Option<FieldFill>, FillError> {
    let Some(value) = value.filter(|value| !value.is_empty()) else {
        return Ok(None);
    };
    let candidate = matcher::find_field(ctx.page(), &ctx.patterns, field, scope)
        .await?
        .ok_or(FillError::NoMatch(field))?;
    let outcome = injector::inject(ctx.page(), &candidate, value).await?;
    debug!(%field, node = %candidate.node, ?outcome, "field filled");

    let follow_up = match (follow_up, candidate.kind) {
        (FollowUp::Overlay, ElementKind::Text) => {
            injector::overlay_delay(ctx, field).map(|delay| {
                injector::schedule_overlay(ctx, candidate.node, value, delay, field.key(), 0)
            })
        }
        _ => None,
    };

    Ok(Some(FieldFill {
        node: candidate.node,
        outcome,
        follow_up,
    }))
}

/// [`fill_field`] with failures contained at the field boundary. Returns whether the field
/// was matched.
pub async fn attempt(
    ctx: &FillContext,
    field: FieldType,
    value: Option<&str>,
    scope: Scope,
    follow_up: FollowUp,
) -> bool {
    match fill_field(ctx, field, value, scope, follow_up).await {
        Ok(Some(_)) => true,
        Ok(None) => false,
        Err(FillError::NoMatch(field)) => {
            debug!(%field, "no element for field");
            false
        }
        Err(err) => {
            warn!(%field, error = %err, "field fill failed");
            false
        }
    }
}

/// Fails fast when the page cannot be queried at all.
pub(crate) async fn ensure_reachable(ctx: &FillContext) -> Result<(), FillError> {
    ctx.page()
        .query_all(Scope::Document, &matcher::controls())
        .await?;
    Ok(())
}

#[instrument(skip_all, fields(session = %ctx.session.id()))]
pub async fn fill_single(ctx: &FillContext, data: &FieldMap) -> Result<FillResult, FillError> {
    let started = Instant::now();
    ensure_reachable(ctx).await?;

    let mut filled = 0u32;
    for field in GENERAL_FIELDS.into_iter().chain(PERSON_FIELDS) {
        let value = data.get(field);
        if attempt(ctx, field, value.as_deref(), Scope::Document, FollowUp::Overlay).await {
            filled += 1;
        }
    }

    let id_type = data.get(FieldType::IdType);
    let id_number = data.get(FieldType::IdNumber);
    let id_type_filled = attempt(
        ctx,
        FieldType::IdType,
        id_type.as_deref(),
        Scope::Document,
        FollowUp::Overlay,
    )
    .await;

    if id_type_filled {
        filled += 1;
        let id_number = id_number.as_deref();
        if attempt(ctx, FieldType::IdNumber, id_number, Scope::Document, FollowUp::Suppressed).await {
            filled += 1;
        }
    } else if let (Some(id_type), Some(id_number)) = (id_type, id_number) {
        schedule_id_fallback(ctx, id_type, id_number);
    }

    let duration_ms = started.elapsed().as_millis() as u64;
    info!(filled, duration_ms, "single fill complete");
    notify::announce(ctx, notify::filled_message(filled, duration_ms), Tone::Success).await;

    Ok(FillResult {
        filled_count: filled,
        duration_ms,
    })
}

/// True for inputs whose name, id and control name together read like an ID-type selector.
fn looks_like_id_type(signature: &str) -> bool {
    let signature = signature.to_lowercase();
    signature.contains("photoidtype") || signature.contains("idtype")
}

async fn find_id_type_input(ctx: &FillContext) -> Result<Option<NodeId>, FillError> {
    let page = ctx.page();
    let inputs = page
        .query_all(Scope::Document, &Selector::from(Compound::tag("input")))
        .await?;
    for input in inputs {
        let mut signature = String::new();
        for name in ["name", "id", "formcontrolname"] {
            if let Some(value) = page.attribute(input, name).await? {
                signature.push_str(&value);
            }
        }
        if looks_like_id_type(&signature) {
            return Ok(Some(input));
        }
    }
    Ok(None)
}

/// idType had no pattern match: after the fallback delay, look for an ID-type looking input,
/// resolve its dropdown, then fill idNumber once that settles.
fn schedule_id_fallback(ctx: &FillContext, id_type: String, id_number: String) {
    let task_ctx = ctx.clone();
    ctx.session.spawn_after(
        ctx.policy.timings.fallback_scan_delay(),
        "id-type-fallback",
        async move {
            let ctx = task_ctx;
            let Some(input) = find_id_type_input(&ctx).await? else {
                debug!("no ID-type input found for fallback");
                return Ok(0);
            };
            let resolution = injector::schedule_overlay(
                &ctx,
                input,
                &id_type,
                Duration::ZERO,
                "id-type-dropdown",
                1,
            );
            let settled = wait::settle(
                Some(resolution),
                ctx.policy.timings.id_number_settle(),
                ctx.session.token(),
            )
            .await?;
            if settled == Settled::Finished(false) {
                warn!("ID-type dropdown fallback failed; filling idNumber anyway");
            }
            let filled = attempt(
                &ctx,
                FieldType::IdNumber,
                Some(id_number.as_str()),
                Scope::Document,
                FollowUp::Suppressed,
            )
            .await;
            Ok(u32::from(filled))
        },
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_type_signature_is_case_insensitive() {
        assert!(looks_like_id_type("photoIdType0"));
        assert!(looks_like_id_type("IDTYPE"));
        assert!(!looks_like_id_type("idProofNumber"));
    }
}
