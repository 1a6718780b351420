//! Value injection specialised by element kind.

use std::time::Duration;

use fastfill_core_types::FieldType;
use page_dom::{Compound, DomError, EventKind, NodeId, PageDom, Scope, Selector};
use tracing::debug;

use crate::dropdown;
use crate::matcher::{ElementKind, MatchCandidate};
use crate::session::{Completion, FillContext};

/// Attribute that truncates fixed-length identifiers when left in place.
const LENGTH_LIMIT: &str = "maxlength";

const TEXT_EVENTS: [EventKind; 3] = [EventKind::Input, EventKind::Change, EventKind::Blur];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InjectOutcome {
    /// Value written into a text-like control.
    Written,
    /// A native option was selected.
    Selected,
    /// A radio of the group was checked.
    Checked,
    /// The control offers no option resembling the value.
    NoOption,
    /// Empty value; nothing was touched.
    Skipped,
}

/// Text path: lifts the length limit, writes the value, then fires input, change and blur.
pub async fn write_text(page: &dyn PageDom, node: NodeId, value: &str) -> Result<(), DomError> {
    if value.is_empty() {
        return Ok(());
    }
    if page.attribute(node, LENGTH_LIMIT).await?.is_some() {
        page.remove_attribute(node, LENGTH_LIMIT).await?;
    }
    page.set_value(node, value).await?;
    for kind in TEXT_EVENTS {
        page.dispatch_event(node, kind).await?;
    }
    Ok(())
}

/// Four-way containment between the lower-cased target and a pair of candidate strings.
/// Empty candidates never count as contained in the target.
fn loosely_matches(target: &str, candidates: [&str; 2]) -> bool {
    candidates.iter().any(|candidate| candidate.contains(target))
        || candidates
            .iter()
            .any(|candidate| !candidate.is_empty() && target.contains(candidate))
}

pub async fn fill_select(page: &dyn PageDom, node: NodeId, value: &str) -> Result<InjectOutcome, DomError> {
    let target = value.to_lowercase();
    for option in page.options(node).await? {
        let text = option.text.to_lowercase();
        let option_value = option.value.to_lowercase();
        if loosely_matches(&target, [&text, &option_value]) {
            page.set_value(node, &option.value).await?;
            write_text(page, node, &option.value).await?;
            debug!(%node, option = %option.text, "native option selected");
            return Ok(InjectOutcome::Selected);
        }
    }
    Ok(InjectOutcome::NoOption)
}

pub async fn fill_radio(page: &dyn PageDom, node: NodeId, value: &str) -> Result<InjectOutcome, DomError> {
    let target = value.to_lowercase();
    let group = match page.attribute(node, "name").await? {
        Some(name) => {
            let radios: Selector = Compound::tag("input")
                .with_attr_eq("type", "radio")
                .with_attr_eq("name", &name)
                .into();
            page.query_all(Scope::Document, &radios).await?
        }
        None => vec![node],
    };

    for radio in group {
        let identity = match page.attribute(radio, "value").await? {
            Some(value) if !value.is_empty() => value,
            _ => page.attribute(radio, "id").await?.unwrap_or_default(),
        };
        let label = match page.next_element_sibling(radio).await? {
            Some(sibling) => page.text_content(sibling).await?,
            None => String::new(),
        };
        let identity = identity.to_lowercase();
        let label = label.trim().to_lowercase();
        if loosely_matches(&target, [&identity, &label]) {
            page.set_checked(radio, true).await?;
            page.dispatch_event(radio, EventKind::Change).await?;
            page.dispatch_event(radio, EventKind::Click).await?;
            debug!(%radio, "radio checked");
            return Ok(InjectOutcome::Checked);
        }
    }
    Ok(InjectOutcome::NoOption)
}

/// Writes `value` into a matched control according to its kind.
pub async fn inject(
    page: &dyn PageDom,
    candidate: &MatchCandidate,
    value: &str,
) -> Result<InjectOutcome, DomError> {
    if value.is_empty() {
        return Ok(InjectOutcome::Skipped);
    }
    match candidate.kind {
        ElementKind::NativeSelect => fill_select(page, candidate.node, value).await,
        ElementKind::Radio => fill_radio(page, candidate.node, value).await,
        ElementKind::Text => {
            write_text(page, candidate.node, value).await?;
            Ok(InjectOutcome::Written)
        }
    }
}

/// Delay before the overlay follow-up of a text-filled field, if the field has one.
pub fn overlay_delay(ctx: &FillContext, field: FieldType) -> Option<Duration> {
    if !field.may_be_overlay_trigger() {
        return None;
    }
    let timings = &ctx.policy.timings;
    Some(match field {
        FieldType::Gender => timings.gender_dropdown_delay(),
        _ => timings.id_type_dropdown_delay(),
    })
}

/// Schedules a dropdown resolution on `node` after `delay`. A successful resolution adds
/// `confirms` to the session tally; follow-ups of already counted fields pass zero.
pub fn schedule_overlay(
    ctx: &FillContext,
    node: NodeId,
    value: &str,
    delay: Duration,
    label: &'static str,
    confirms: u32,
) -> Completion {
    let page = ctx.page.clone();
    let offsets: Vec<Duration> = ctx.policy.timings.poll_offsets().collect();
    let cancel = ctx.session.token().clone();
    let value = value.to_string();
    ctx.session.spawn_after(delay, label, async move {
        dropdown::resolve(page.as_ref(), node, &value, offsets, &cancel).await?;
        Ok(confirms)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_dom::MemoryPage;

    #[tokio::test]
    async fn text_path_lifts_limit_and_fires_events_in_order() {
        let page = MemoryPage::from_html(r#"<input name="idProofNumber" maxlength="10">"#);
        let node = page.find("input").unwrap();
        write_text(&page, node, "123456789012").await.unwrap();
        assert_eq!(page.value_of(node), "123456789012");
        assert_eq!(page.attribute_of(node, "maxlength"), None);
        assert_eq!(
            page.events_for(node),
            vec![EventKind::Input, EventKind::Change, EventKind::Blur]
        );
    }

    #[tokio::test]
    async fn empty_value_is_a_no_op() {
        let page = MemoryPage::from_html(r#"<input name="age" value="9" maxlength="2">"#);
        let node = page.find("input").unwrap();
        write_text(&page, node, "").await.unwrap();
        assert_eq!(page.value_of(node), "9");
        assert!(page.attribute_of(node, "maxlength").is_some());
        assert!(page.events().is_empty());
    }

    #[tokio::test]
    async fn select_matches_case_insensitively() {
        let page = MemoryPage::from_html(
            r#"<select name="gender">
                 <option value="">Select</option>
                 <option>Male</option><option>Female</option><option>Transgender</option>
               </select>"#,
        );
        let node = page.find("select").unwrap();
        let outcome = fill_select(&page, node, "male").await.unwrap();
        assert_eq!(outcome, InjectOutcome::Selected);
        assert_eq!(page.value_of(node), "Male");
        assert_eq!(
            page.events_for(node),
            vec![EventKind::Input, EventKind::Change, EventKind::Blur]
        );
    }

    #[tokio::test]
    async fn select_without_resemblance_is_untouched() {
        let page = MemoryPage::from_html(
            r#"<select name="state"><option value="">Choose</option><option value="KA">Karnataka</option></select>"#,
        );
        let node = page.find("select").unwrap();
        assert_eq!(
            fill_select(&page, node, "Telangana").await.unwrap(),
            InjectOutcome::NoOption
        );
        assert!(page.events().is_empty());
    }

    #[tokio::test]
    async fn radio_group_checks_by_label() {
        let page = MemoryPage::from_html(
            r#"<input type="radio" name="sex" id="g1"><label>Transgender</label>
               <input type="radio" name="sex" id="g2"><label>Female</label>"#,
        );
        let radios = page.find_all("input");
        let outcome = fill_radio(&page, radios[0], "Female").await.unwrap();
        assert_eq!(outcome, InjectOutcome::Checked);
        assert!(page.is_checked(radios[1]));
        assert_eq!(
            page.events_for(radios[1]),
            vec![EventKind::Change, EventKind::Click]
        );
    }

    #[tokio::test]
    async fn radio_prefers_value_attribute() {
        let page = MemoryPage::from_html(
            r#"<input type="radio" name="g" value="M"><span></span>
               <input type="radio" name="g" value="F"><span></span>"#,
        );
        let radios = page.find_all("input");
        fill_radio(&page, radios[0], "f").await.unwrap();
        assert!(page.is_checked(radios[1]));
        assert!(!page.is_checked(radios[0]));
    }
}
