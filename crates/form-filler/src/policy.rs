use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Fixed delays of the fill choreography, in milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillTimings {
    pub gender_dropdown_delay_ms: u64,
    pub id_type_dropdown_delay_ms: u64,
    pub id_number_settle_ms: u64,
    pub fallback_scan_delay_ms: u64,
    /// Poll offsets measured from the moment the overlay trigger was clicked.
    pub dropdown_poll_offsets_ms: Vec<u64>,
    pub member_stagger_ms: u64,
    pub notification_ms: u64,
    pub per_member_estimate: u32,
}

impl Default for FillTimings {
    fn default() -> Self {
        Self {
            gender_dropdown_delay_ms: 200,
            id_type_dropdown_delay_ms: 600,
            id_number_settle_ms: 400,
            fallback_scan_delay_ms: 600,
            dropdown_poll_offsets_ms: vec![300, 600, 1000],
            member_stagger_ms: 2000,
            notification_ms: 3000,
            per_member_estimate: 4,
        }
    }
}

impl FillTimings {
    pub fn gender_dropdown_delay(&self) -> Duration {
        Duration::from_millis(self.gender_dropdown_delay_ms)
    }

    pub fn id_type_dropdown_delay(&self) -> Duration {
        Duration::from_millis(self.id_type_dropdown_delay_ms)
    }

    pub fn id_number_settle(&self) -> Duration {
        Duration::from_millis(self.id_number_settle_ms)
    }

    pub fn fallback_scan_delay(&self) -> Duration {
        Duration::from_millis(self.fallback_scan_delay_ms)
    }

    pub fn poll_offsets(&self) -> impl Iterator<Item = Duration> + '_ {
        self.dropdown_poll_offsets_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
    }

    pub fn member_stagger(&self, index: usize) -> Duration {
        Duration::from_millis(self.member_stagger_ms.saturating_mul(index as u64))
    }

    pub fn notification(&self) -> Duration {
        Duration::from_millis(self.notification_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.dropdown_poll_offsets_ms.is_empty() {
            return Err("dropdown_poll_offsets_ms must not be empty".into());
        }
        let ascending = self
            .dropdown_poll_offsets_ms
            .windows(2)
            .all(|pair| pair[0] < pair[1]);
        if !ascending {
            return Err("dropdown_poll_offsets_ms must be strictly ascending".into());
        }
        if self.per_member_estimate == 0 {
            return Err("per_member_estimate must be positive".into());
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FillPolicy {
    pub timings: FillTimings,
    /// Cancel the pending follow-ups of an earlier fill when a new one starts.
    pub cancel_superseded: bool,
    pub show_notifications: bool,
}

impl Default for FillPolicy {
    fn default() -> Self {
        Self {
            timings: FillTimings::default(),
            cancel_superseded: true,
            show_notifications: true,
        }
    }
}
