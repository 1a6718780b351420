//! Semantic field types and the per-profile value map.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Semantic category of a form field, independent of any page's element naming.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    FullName,
    Age,
    Gender,
    Phone,
    Email,
    IdType,
    IdNumber,
    Address,
    City,
    State,
    Pincode,
    Country,
}

impl FieldType {
    pub const ALL: [FieldType; 12] = [
        FieldType::FullName,
        FieldType::Age,
        FieldType::Gender,
        FieldType::Phone,
        FieldType::Email,
        FieldType::IdType,
        FieldType::IdNumber,
        FieldType::Address,
        FieldType::City,
        FieldType::State,
        FieldType::Pincode,
        FieldType::Country,
    ];

    /// Key used for this field in profile data maps.
    pub fn key(&self) -> &'static str {
        match self {
            FieldType::FullName => "fullName",
            FieldType::Age => "age",
            FieldType::Gender => "gender",
            FieldType::Phone => "phone",
            FieldType::Email => "email",
            FieldType::IdType => "idType",
            FieldType::IdNumber => "idNumber",
            FieldType::Address => "address",
            FieldType::City => "city",
            FieldType::State => "state",
            FieldType::Pincode => "pincode",
            FieldType::Country => "country",
        }
    }

    /// Fields whose input may double as the trigger of an overlay dropdown.
    pub fn may_be_overlay_trigger(&self) -> bool {
        matches!(self, FieldType::Gender | FieldType::IdType)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Error, Clone, Eq, PartialEq)]
#[error("unknown field type '{0}'")]
pub struct UnknownFieldType(pub String);

impl FromStr for FieldType {
    type Err = UnknownFieldType;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        FieldType::ALL
            .iter()
            .copied()
            .find(|field| field.key().eq_ignore_ascii_case(raw.trim()))
            .ok_or_else(|| UnknownFieldType(raw.to_string()))
    }
}

/// Field values keyed by field-type names. Values arrive from user-managed JSON and may be
/// strings or numbers; anything else is treated as absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap(BTreeMap<String, Value>);

impl FieldMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value for `field`, or `None` when absent or empty.
    pub fn get(&self, field: FieldType) -> Option<String> {
        self.get_key(field.key())
    }

    pub fn get_key(&self, key: &str) -> Option<String> {
        let rendered = match self.0.get(key)? {
            Value::String(text) => text.clone(),
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            Value::Null | Value::Array(_) | Value::Object(_) => return None,
        };
        (!rendered.is_empty()).then_some(rendered)
    }

    pub fn has(&self, field: FieldType) -> bool {
        self.get(field).is_some()
    }

    pub fn insert(&mut self, field: FieldType, value: impl Into<String>) {
        self.0
            .insert(field.key().to_string(), Value::String(value.into()));
    }

    pub fn with(mut self, field: FieldType, value: impl Into<String>) -> Self {
        self.insert(field, value);
        self
    }

    /// Number of known field types carrying a value.
    pub fn populated(&self) -> usize {
        FieldType::ALL.iter().filter(|field| self.has(**field)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.populated() == 0
    }
}

impl FromIterator<(FieldType, String)> for FieldMap {
    fn from_iter<I: IntoIterator<Item = (FieldType, String)>>(iter: I) -> Self {
        let mut map = FieldMap::new();
        for (field, value) in iter {
            map.insert(field, value);
        }
        map
    }
}
