//! Entry-point messages exchanged between the triggering host and the fill engine.

use serde::{Deserialize, Serialize};

use crate::profile::{GroupProfileRecord, ProfileRecord};

/// Outcome of one orchestration call. Produced once and handed back to the caller.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillResult {
    pub filled_count: u32,
    pub duration_ms: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum FillRequest {
    #[serde(rename = "fillForm")]
    Single { profile: ProfileRecord },
    #[serde(rename = "fillMasterProfile")]
    Group {
        #[serde(rename = "masterProfile")]
        master_profile: GroupProfileRecord,
    },
}

impl FillRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            FillRequest::Single { .. } => "fillForm",
            FillRequest::Group { .. } => "fillMasterProfile",
        }
    }

    pub fn profile_name(&self) -> &str {
        match self {
            FillRequest::Single { profile } => &profile.name,
            FillRequest::Group { master_profile } => &master_profile.name,
        }
    }
}

/// The single eventual response every request receives.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FillResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filled_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FillResponse {
    pub fn filled(count: u32) -> Self {
        Self {
            success: true,
            filled_count: Some(count),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            filled_count: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_uses_action_tag() {
        let raw = json!({
            "action": "fillMasterProfile",
            "masterProfile": { "id": "m1", "name": "Group", "generalDetails": {}, "pilgrims": [] }
        });
        let request: FillRequest = serde_json::from_value(raw).unwrap();
        assert_eq!(request.kind(), "fillMasterProfile");
        assert_eq!(request.profile_name(), "Group");

        let single = json!({ "action": "fillForm", "profile": { "id": "p1", "name": "Self" } });
        let request: FillRequest = serde_json::from_value(single).unwrap();
        assert!(matches!(request, FillRequest::Single { .. }));
    }

    #[test]
    fn response_omits_absent_fields() {
        let ok = serde_json::to_value(FillResponse::filled(5)).unwrap();
        assert_eq!(ok, json!({ "success": true, "filledCount": 5 }));
        let err = serde_json::to_value(FillResponse::failed("no listener")).unwrap();
        assert_eq!(err, json!({ "success": false, "error": "no listener" }));
    }
}
