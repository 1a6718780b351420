//! Error types for page access

use thiserror::Error;

use crate::node::NodeId;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomError {
    /// The handle no longer refers to a connected element
    #[error("node {0} is detached from the document")]
    Detached(NodeId),

    /// Selector text outside the supported subset
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// The page rejected or failed to evaluate an operation
    #[error("page script failed: {0}")]
    Script(String),

    /// The page has no body element to receive the operation
    #[error("document has no body")]
    NoBody,
}

impl DomError {
    pub fn invalid_selector(selector: &str, reason: impl Into<String>) -> Self {
        DomError::InvalidSelector {
            selector: selector.to_string(),
            reason: reason.into(),
        }
    }

    /// Stale handles are expected when the page re-renders between calls.
    pub fn is_stale(&self) -> bool {
        matches!(self, DomError::Detached(_))
    }
}
