use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque handle to an element of the live page.
///
/// Handles are issued by a [`crate::PageDom`] implementation and are only meaningful to the
/// page that produced them.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Root of a descendant query.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum Scope {
    #[default]
    Document,
    Element(NodeId),
}

impl From<NodeId> for Scope {
    fn from(node: NodeId) -> Self {
        Scope::Element(node)
    }
}

/// Synthetic events the engine dispatches. All of them bubble.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Input,
    Change,
    Blur,
    Click,
    Focus,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Input => "input",
            EventKind::Change => "change",
            EventKind::Blur => "blur",
            EventKind::Click => "click",
            EventKind::Focus => "focus",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `<option>` of a native select.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    pub text: String,
    pub value: String,
}

impl SelectOption {
    pub fn new(text: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            value: value.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    Success,
    Error,
    #[default]
    Info,
}

impl Tone {
    pub fn background(&self) -> &'static str {
        match self {
            Tone::Success => "#10b981",
            Tone::Error => "#ef4444",
            Tone::Info => "#3b82f6",
        }
    }
}

/// Transient on-page banner reporting a fill outcome.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub message: String,
    pub tone: Tone,
}

impl Notification {
    pub const ELEMENT_ID: &'static str = "fast-autofill-notification";

    pub fn new(message: impl Into<String>, tone: Tone) -> Self {
        Self {
            message: message.into(),
            tone,
        }
    }
}
