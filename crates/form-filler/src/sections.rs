//! Detection of repeated per-member sections.

use page_dom::{Compound, DomError, NodeId, PageDom, Scope, Selector};
use tracing::debug;

fn name_inputs() -> Selector {
    Selector::any_of([
        Compound::tag("input").with_attr_contains("name", "name").into(),
        Compound::tag("input").with_attr_contains("name", "fname").into(),
    ])
}

fn section_markers() -> Selector {
    Selector::any_of([
        Compound::tag("div").with_attr_contains("class", "section").into(),
        Compound::tag("div").with_attr_contains("class", "pilgrim").into(),
        Compound::tag("div").with_attr_contains("class", "form").into(),
        Compound::tag("form").into(),
    ])
}

/// One container per member, in document order.
///
/// Every name-bearing input contributes its nearest section-like ancestor, or its grandparent
/// when no ancestor carries a marker. Containers are deduplicated.
pub async fn detect_sections(page: &dyn PageDom) -> Result<Vec<NodeId>, DomError> {
    let markers = section_markers();
    let mut sections: Vec<NodeId> = Vec::new();
    for input in page.query_all(Scope::Document, &name_inputs()).await? {
        let section = match page.closest(input, &markers).await? {
            Some(section) => Some(section),
            None => match page.parent(input).await? {
                Some(parent) => page.parent(parent).await?,
                None => None,
            },
        };
        if let Some(section) = section {
            if !sections.contains(&section) {
                sections.push(section);
            }
        }
    }
    debug!(count = sections.len(), "member sections detected");
    Ok(sections)
}
