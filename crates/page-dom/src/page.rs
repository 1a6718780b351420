use async_trait::async_trait;

use crate::errors::DomError;
use crate::node::{EventKind, NodeId, Notification, Scope, SelectOption};
use crate::selector::Selector;

/// Port to a live, externally mutated document.
///
/// Handles returned by queries stay valid until the page removes the element; any call on a
/// removed element yields [`DomError::Detached`]. Implementations never cache query results.
#[async_trait]
pub trait PageDom: Send + Sync {
    /// Elements under `scope` matching `selector`, in document order.
    async fn query_all(&self, scope: Scope, selector: &Selector)
        -> Result<Vec<NodeId>, DomError>;

    async fn query_first(
        &self,
        scope: Scope,
        selector: &Selector,
    ) -> Result<Option<NodeId>, DomError> {
        Ok(self.query_all(scope, selector).await?.into_iter().next())
    }

    /// Lower-case tag name.
    async fn tag_name(&self, node: NodeId) -> Result<String, DomError>;

    async fn attribute(&self, node: NodeId, name: &str) -> Result<Option<String>, DomError>;

    /// Resolved control type: the lower-cased `type` of an input (`"text"` when absent),
    /// `"select-one"` for selects, `"textarea"` for text areas and the tag name otherwise.
    async fn input_type(&self, node: NodeId) -> Result<String, DomError>;

    /// Current value property of a form control.
    async fn value(&self, node: NodeId) -> Result<String, DomError>;

    async fn text_content(&self, node: NodeId) -> Result<String, DomError>;

    async fn parent(&self, node: NodeId) -> Result<Option<NodeId>, DomError>;

    async fn next_element_sibling(&self, node: NodeId) -> Result<Option<NodeId>, DomError>;

    /// Nearest inclusive ancestor matching `selector`.
    async fn closest(&self, node: NodeId, selector: &Selector)
        -> Result<Option<NodeId>, DomError>;

    /// Options of a native select, in order. Empty for other elements.
    async fn options(&self, node: NodeId) -> Result<Vec<SelectOption>, DomError>;

    /// Writes the value property through the element prototype's native setter so framework
    /// wrappers observe the change.
    async fn set_value(&self, node: NodeId, value: &str) -> Result<(), DomError>;

    async fn remove_attribute(&self, node: NodeId, name: &str) -> Result<(), DomError>;

    async fn set_checked(&self, node: NodeId, checked: bool) -> Result<(), DomError>;

    /// Dispatches a bubbling synthetic event.
    async fn dispatch_event(&self, node: NodeId, kind: EventKind) -> Result<(), DomError>;

    async fn click(&self, node: NodeId) -> Result<(), DomError>;

    async fn focus(&self, node: NodeId) -> Result<(), DomError>;

    /// Clicks the document body, dismissing any open overlay.
    async fn click_body(&self) -> Result<(), DomError>;

    /// Replaces any banner currently shown.
    async fn show_notification(&self, notification: &Notification) -> Result<(), DomError>;

    async fn dismiss_notification(&self) -> Result<(), DomError>;
}
