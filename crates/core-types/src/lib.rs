#![allow(dead_code)]

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub mod field;
pub mod message;
pub mod profile;

pub use field::{FieldMap, FieldType, UnknownFieldType};
pub use message::{FillRequest, FillResponse, FillResult};
pub use profile::{GroupProfileRecord, ProfileId, ProfileRecord, ProfileStats};

/// Shared error type for the fastfill crates.
#[derive(Debug, Error, Clone)]
pub enum CoreError {
    #[error("{message}")]
    Message { message: String },
}

impl CoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message {
            message: message.into(),
        }
    }
}

/// Identifies one fill invocation (single or group) and its scheduled follow-up work.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FillSessionId(pub String);

impl FillSessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for FillSessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FillSessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
