//! Errors raised by the host layer before a request reaches the fill engine.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("profile '{0}' not found")]
    ProfileNotFound(String),

    #[error("reading profile store {path}")]
    StoreIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parsing profile store {path}")]
    StoreFormat {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The active page is not one of the sites autofill is enabled for.
    #[error("{url} is not an allowed booking site (use --force to fill anyway)")]
    DomainNotAllowed { url: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl HostError {
    pub fn not_found(query: impl Into<String>) -> Self {
        HostError::ProfileNotFound(query.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_error_mentions_override() {
        let err = HostError::DomainNotAllowed {
            url: "https://example.com/".into(),
        };
        assert_eq!(
            err.to_string(),
            "https://example.com/ is not an allowed booking site (use --force to fill anyway)"
        );
    }
}
