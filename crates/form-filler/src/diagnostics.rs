//! Debug dump of every form control, for tuning the pattern tables by hand.
//!
//! Nothing in the fill path calls into this module.

use fastfill_core_types::FieldType;
use page_dom::{DomError, PageDom, Scope};
use serde::Serialize;

use crate::attributes::AttributeSnapshot;
use crate::matcher;
use crate::patterns::PatternRegistry;

/// One control as the matcher sees it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReport {
    pub index: usize,
    pub tag: String,
    pub input_type: Option<String>,
    pub name: Option<String>,
    pub id: Option<String>,
    pub form_control_name: Option<String>,
    pub ng_reflect_name: Option<String>,
    pub placeholder: Option<String>,
    pub aria_label: Option<String>,
    pub class_list: Vec<String>,
}

/// Where each field type would land on the current page.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub field: FieldType,
    /// Index into the [`detect_all_fields`] listing.
    pub control: Option<usize>,
    pub pattern: Option<String>,
}

/// Lists every input, select and textarea in document order.
pub async fn detect_all_fields(page: &dyn PageDom) -> Result<Vec<FieldReport>, DomError> {
    let nodes = page.query_all(Scope::Document, &matcher::controls()).await?;
    let mut reports = Vec::with_capacity(nodes.len());
    for (index, node) in nodes.into_iter().enumerate() {
        let tag = page.tag_name(node).await?;
        let input_type = if tag == "input" {
            Some(page.input_type(node).await?)
        } else {
            None
        };
        let snapshot = AttributeSnapshot::read(page, node).await?;
        let class_list = snapshot
            .class
            .as_deref()
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        reports.push(FieldReport {
            index,
            tag,
            input_type,
            name: snapshot.name,
            id: snapshot.id,
            form_control_name: snapshot.form_control_name,
            ng_reflect_name: snapshot.ng_reflect_name,
            placeholder: snapshot.placeholder,
            aria_label: snapshot.aria_label,
            class_list,
        });
    }
    Ok(reports)
}

/// Runs the matcher for every field type against the whole document.
pub async fn match_report(
    page: &dyn PageDom,
    patterns: &PatternRegistry,
) -> Result<Vec<MatchReport>, DomError> {
    let nodes = page.query_all(Scope::Document, &matcher::controls()).await?;
    let mut report = Vec::with_capacity(FieldType::ALL.len());
    for field in FieldType::ALL {
        let candidate = matcher::find_field(page, patterns, field, Scope::Document).await?;
        report.push(MatchReport {
            field,
            control: candidate
                .as_ref()
                .and_then(|candidate| nodes.iter().position(|node| *node == candidate.node)),
            pattern: candidate.map(|candidate| candidate.pattern),
        });
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use page_dom::MemoryPage;

    const FORM: &str = r#"
        <form>
          <input type="email" name="emailId" class="form-control  wide">
          <select formcontrolname="gender"><option>Male</option></select>
          <textarea placeholder="Address line"></textarea>
          <button>Go</button>
        </form>"#;

    #[tokio::test]
    async fn lists_controls_with_their_attributes() {
        let page = MemoryPage::from_html(FORM);
        let fields = detect_all_fields(&page).await.unwrap();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[0].input_type.as_deref(), Some("email"));
        assert_eq!(fields[0].class_list, vec!["form-control", "wide"]);
        assert_eq!(fields[1].tag, "select");
        assert_eq!(fields[1].input_type, None);
        assert_eq!(fields[1].form_control_name.as_deref(), Some("gender"));

        let wire = serde_json::to_value(&fields[2]).unwrap();
        assert_eq!(wire["placeholder"], json!("Address line"));
        assert_eq!(wire["classList"], json!([]));
    }

    #[tokio::test]
    async fn match_report_points_into_the_listing() {
        let page = MemoryPage::from_html(FORM);
        let report = match_report(&page, &PatternRegistry::builtin()).await.unwrap();
        let email = report.iter().find(|row| row.field == FieldType::Email).unwrap();
        assert_eq!(email.control, Some(0));
        assert_eq!(email.pattern.as_deref(), Some("email"));
        let gender = report.iter().find(|row| row.field == FieldType::Gender).unwrap();
        assert_eq!(gender.control, Some(1));
        let pincode = report.iter().find(|row| row.field == FieldType::Pincode).unwrap();
        assert_eq!(pincode.control, None);
    }
}
