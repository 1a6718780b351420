//! Field matcher: first control in document order whose attributes carry a field pattern.

use fastfill_core_types::FieldType;
use page_dom::{Compound, DomError, NodeId, PageDom, Scope, Selector};
use tracing::debug;

use crate::attributes;
use crate::patterns::PatternRegistry;

/// How a matched control receives its value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ElementKind {
    NativeSelect,
    Radio,
    Text,
}

/// A matched control and the attribute text that matched. Never cached across calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchCandidate {
    pub node: NodeId,
    pub kind: ElementKind,
    pub attributes: String,
    pub pattern: String,
}

pub fn controls() -> Selector {
    Selector::any_of(
        ["input", "select", "textarea"]
            .into_iter()
            .map(|tag| Selector::from(Compound::tag(tag))),
    )
}

/// Resolves how `node` is filled, or `None` for push buttons which are never filled.
pub async fn classify(page: &dyn PageDom, node: NodeId) -> Result<Option<ElementKind>, DomError> {
    if page.tag_name(node).await? == "select" {
        return Ok(Some(ElementKind::NativeSelect));
    }
    let kind = match page.input_type(node).await?.as_str() {
        "submit" | "button" => None,
        "radio" => Some(ElementKind::Radio),
        _ => Some(ElementKind::Text),
    };
    Ok(kind)
}

/// Scans every control under `scope`. A pattern hit on a push button is skipped and the scan
/// continues with the next control.
pub async fn find_field(
    page: &dyn PageDom,
    patterns: &PatternRegistry,
    field: FieldType,
    scope: Scope,
) -> Result<Option<MatchCandidate>, DomError> {
    if patterns.patterns_for(field).is_empty() {
        return Ok(None);
    }
    for node in page.query_all(scope, &controls()).await? {
        let scanned = scan_one(page, patterns, field, node).await;
        match scanned {
            Ok(Some(candidate)) => {
                debug!(%field, node = %candidate.node, pattern = %candidate.pattern, "field matched");
                return Ok(Some(candidate));
            }
            Ok(None) => {}
            Err(err) if err.is_stale() => continue,
            Err(err) => return Err(err),
        }
    }
    debug!(%field, "no field matched");
    Ok(None)
}

async fn scan_one(
    page: &dyn PageDom,
    patterns: &PatternRegistry,
    field: FieldType,
    node: NodeId,
) -> Result<Option<MatchCandidate>, DomError> {
    let text = attributes::extract(page, node).await?;
    let Some(pattern) = patterns.first_hit(field, &text) else {
        return Ok(None);
    };
    let Some(kind) = classify(page, node).await? else {
        debug!(%field, %node, "skipping push button");
        return Ok(None);
    };
    Ok(Some(MatchCandidate {
        node,
        kind,
        pattern: pattern.to_string(),
        attributes: text,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use page_dom::MemoryPage;

    async fn matched(page: &MemoryPage, field: FieldType) -> Option<MatchCandidate> {
        find_field(page, &PatternRegistry::builtin(), field, Scope::Document)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn every_builtin_pattern_is_found_in_any_case() {
        let registry = PatternRegistry::builtin();
        for field in FieldType::ALL {
            for pattern in registry.patterns_for(field) {
                let html = format!(r#"<input placeholder="Enter {}">"#, pattern.to_uppercase());
                let page = MemoryPage::from_html(&html);
                let found = find_field(&page, &registry, field, Scope::Document)
                    .await
                    .unwrap();
                assert!(found.is_some(), "{field} / {pattern}");
            }
        }
    }

    #[tokio::test]
    async fn first_match_in_document_order_wins() {
        let page = MemoryPage::from_html(
            r#"<input name="username"><input name="fullName">"#,
        );
        let first = page.find("input").unwrap();
        let found = matched(&page, FieldType::FullName).await.unwrap();
        assert_eq!(found.node, first);
        assert_eq!(found.kind, ElementKind::Text);
    }

    #[tokio::test]
    async fn push_buttons_are_skipped_and_scan_continues() {
        let page = MemoryPage::from_html(
            r#"<input type="submit" name="email_submit"><input type="button" id="emailBtn">
               <input name="emailId">"#,
        );
        let found = matched(&page, FieldType::Email).await.unwrap();
        assert_eq!(page.attribute_of(found.node, "name").as_deref(), Some("emailId"));
    }

    #[tokio::test]
    async fn only_push_buttons_means_no_match() {
        let page = MemoryPage::from_html(r#"<input type="submit" name="email">"#);
        assert!(matched(&page, FieldType::Email).await.is_none());
    }

    #[tokio::test]
    async fn classifies_selects_and_radios() {
        let page = MemoryPage::from_html(
            r#"<select name="gender"></select><input type="radio" name="sex">"#,
        );
        let gender = matched(&page, FieldType::Gender).await.unwrap();
        assert_eq!(gender.kind, ElementKind::NativeSelect);
        let radio = page.find("input").unwrap();
        assert_eq!(classify(&page, radio).await.unwrap(), Some(ElementKind::Radio));
    }

    #[tokio::test]
    async fn scope_limits_the_scan() {
        let page = MemoryPage::from_html(
            r#"<div id="one"><input name="age"></div><div id="two"><span></span></div>"#,
        );
        let two = page.find("#two").unwrap();
        let found = find_field(&page, &PatternRegistry::builtin(), FieldType::Age, two.into())
            .await
            .unwrap();
        assert!(found.is_none());
    }
}
