//! Searchable attribute text of a form control.

use page_dom::{DomError, NodeId, PageDom};
use serde::Serialize;

/// Attributes read for matching, in concatenation order.
pub const MATCH_ATTRIBUTES: [&str; 9] = [
    "name",
    "id",
    "placeholder",
    "aria-label",
    "formcontrolname",
    "ng-reflect-name",
    "data-field",
    "data-name",
    "class",
];

/// Raw attributes of one control. Absent attributes are `None`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeSnapshot {
    pub name: Option<String>,
    pub id: Option<String>,
    pub placeholder: Option<String>,
    pub aria_label: Option<String>,
    pub form_control_name: Option<String>,
    pub ng_reflect_name: Option<String>,
    pub data_field: Option<String>,
    pub data_name: Option<String>,
    pub class: Option<String>,
}

impl AttributeSnapshot {
    pub async fn read(page: &dyn PageDom, node: NodeId) -> Result<Self, DomError> {
        let mut values = Vec::with_capacity(MATCH_ATTRIBUTES.len());
        for name in MATCH_ATTRIBUTES {
            values.push(page.attribute(node, name).await?);
        }
        let mut values = values.into_iter();
        let mut next = move || values.next().flatten();
        Ok(Self {
            name: next(),
            id: next(),
            placeholder: next(),
            aria_label: next(),
            form_control_name: next(),
            ng_reflect_name: next(),
            data_field: next(),
            data_name: next(),
            class: next(),
        })
    }

    fn ordered(&self) -> [Option<&str>; 9] {
        [
            self.name.as_deref(),
            self.id.as_deref(),
            self.placeholder.as_deref(),
            self.aria_label.as_deref(),
            self.form_control_name.as_deref(),
            self.ng_reflect_name.as_deref(),
            self.data_field.as_deref(),
            self.data_name.as_deref(),
            self.class.as_deref(),
        ]
    }

    /// Non-empty values joined by single spaces. Case is preserved.
    pub fn joined(&self) -> String {
        self.ordered()
            .into_iter()
            .flatten()
            .filter(|value| !value.is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Matching text of `node`.
pub async fn extract(page: &dyn PageDom, node: NodeId) -> Result<String, DomError> {
    Ok(AttributeSnapshot::read(page, node).await?.joined())
}
