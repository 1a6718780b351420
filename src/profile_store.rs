//! Read-only view of the profile manager's JSON store.

use std::path::{Path, PathBuf};

use fastfill_core_types::{GroupProfileRecord, ProfileRecord};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::debug;

use crate::errors::HostError;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileStore {
    pub single_profiles: Vec<ProfileRecord>,
    pub master_profiles: Vec<GroupProfileRecord>,
}

/// Fields a profile can be looked up by.
trait Lookup {
    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn shortcut(&self) -> Option<&str>;
}

impl Lookup for ProfileRecord {
    fn id(&self) -> &str {
        &self.id.0
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn shortcut(&self) -> Option<&str> {
        self.shortcut.as_deref()
    }
}

impl Lookup for GroupProfileRecord {
    fn id(&self) -> &str {
        &self.id.0
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn shortcut(&self) -> Option<&str> {
        self.shortcut.as_deref()
    }
}

/// Id first, then case-insensitive name, then shortcut.
fn find<'a, T: Lookup>(records: &'a [T], query: &str) -> Option<&'a T> {
    let query = query.trim();
    records
        .iter()
        .find(|record| record.id() == query)
        .or_else(|| {
            records
                .iter()
                .find(|record| record.name().eq_ignore_ascii_case(query))
        })
        .or_else(|| {
            records.iter().find(|record| {
                record
                    .shortcut()
                    .is_some_and(|shortcut| shortcut.eq_ignore_ascii_case(query))
            })
        })
}

impl ProfileStore {
    /// A missing file is an empty store.
    pub async fn load(path: &Path) -> Result<Self, HostError> {
        let raw = match fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no profile store yet");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(HostError::StoreIo {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        Self::parse(&raw, path)
    }

    pub fn parse(raw: &str, path: &Path) -> Result<Self, HostError> {
        serde_json::from_str(raw).map_err(|source| HostError::StoreFormat {
            path: PathBuf::from(path),
            source,
        })
    }

    pub fn single(&self, query: &str) -> Result<&ProfileRecord, HostError> {
        find(&self.single_profiles, query).ok_or_else(|| HostError::not_found(query))
    }

    pub fn master(&self, query: &str) -> Result<&GroupProfileRecord, HostError> {
        find(&self.master_profiles, query).ok_or_else(|| HostError::not_found(query))
    }

    pub fn is_empty(&self) -> bool {
        self.single_profiles.is_empty() && self.master_profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fastfill_core_types::FieldType;

    const STORE: &str = r#"{
        "singleProfiles": [
            { "id": "p1", "name": "Asha", "shortcut": "a", "data": { "fullName": "Asha Verma", "age": 34 } },
            { "id": "a", "name": "Ravi", "data": {} }
        ],
        "masterProfiles": [
            { "id": "m1", "name": "Family", "generalDetails": { "email": "x@y.in" }, "pilgrims": [{}, {}] }
        ]
    }"#;

    #[test]
    fn id_wins_over_shortcut() {
        let store = ProfileStore::parse(STORE, Path::new("profiles.json")).unwrap();
        assert_eq!(store.single("a").unwrap().name, "Ravi");
        assert_eq!(store.single("ASHA").unwrap().id.0, "p1");
        assert_eq!(
            store.single("p1").unwrap().data.get(FieldType::Age).as_deref(),
            Some("34")
        );
        assert_eq!(store.master("family").unwrap().member_count(), 2);
        assert!(matches!(store.master("nobody"), Err(HostError::ProfileNotFound(_))));
    }
}
