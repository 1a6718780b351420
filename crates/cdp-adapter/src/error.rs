use std::fmt;

use page_dom::DomError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// High-level error categories surfaced by the adapter.
#[derive(Clone, Debug, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdapterErrorKind {
    #[error("browser launch failed")]
    Launch,
    #[error("cdp i/o failure")]
    CdpIo,
    #[error("page script failed")]
    Script,
    #[error("call timed out")]
    Timeout,
    #[error("no open page")]
    NoPage,
    #[error("internal error")]
    Internal,
}

/// Enriched error metadata passed back to callers.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    pub hint: Option<String>,
    pub retriable: bool,
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if let Some(hint) = &self.hint {
            write!(f, ": {}", hint)?;
        }
        Ok(())
    }
}

impl std::error::Error for AdapterError {}

impl AdapterError {
    pub fn new(kind: AdapterErrorKind) -> Self {
        Self {
            kind,
            hint: None,
            retriable: false,
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn retriable(mut self, flag: bool) -> Self {
        self.retriable = flag;
        self
    }
}

impl From<chromiumoxide::error::CdpError> for AdapterError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        AdapterError::new(AdapterErrorKind::CdpIo).with_hint(err.to_string())
    }
}

impl From<AdapterError> for DomError {
    fn from(err: AdapterError) -> Self {
        DomError::Script(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_appends_hint() {
        let err = AdapterError::new(AdapterErrorKind::Timeout).with_hint("query_all after 5000ms");
        assert_eq!(err.to_string(), "call timed out: query_all after 5000ms");
        assert!(matches!(DomError::from(err), DomError::Script(message) if message.contains("5000ms")));
    }
}
