//! Profile records owned by the profile store. The engine only reads them.

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::field::FieldMap;

#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProfileId(pub String);

impl fmt::Display for ProfileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Usage statistics kept by the management layer. Timestamps are epoch milliseconds.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileStats {
    pub use_count: u64,
    pub last_used: Option<i64>,
    pub created_at: Option<i64>,
    pub favorite: bool,
}

impl ProfileStats {
    pub fn last_used_at(&self) -> Option<DateTime<Utc>> {
        self.last_used
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
    }
}

/// A single-person profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRecord {
    pub id: ProfileId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<String>,
    #[serde(default)]
    pub data: FieldMap,
    #[serde(default)]
    pub stats: ProfileStats,
}

impl ProfileRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, data: FieldMap) -> Self {
        Self {
            id: ProfileId(id.into()),
            name: name.into(),
            shortcut: None,
            data,
            stats: ProfileStats::default(),
        }
    }
}

/// A grouped submission: shared contact details plus one field map per member.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupProfileRecord {
    pub id: ProfileId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shortcut: Option<String>,
    #[serde(default)]
    pub general_details: FieldMap,
    #[serde(default)]
    pub pilgrims: Vec<FieldMap>,
    #[serde(default)]
    pub stats: ProfileStats,
}

impl GroupProfileRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        general_details: FieldMap,
        pilgrims: Vec<FieldMap>,
    ) -> Self {
        Self {
            id: ProfileId(id.into()),
            name: name.into(),
            shortcut: None,
            general_details,
            pilgrims,
            stats: ProfileStats::default(),
        }
    }

    pub fn member_count(&self) -> usize {
        self.pilgrims.len()
    }
}
