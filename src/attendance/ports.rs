//! Collaborators the attendance desk talks to. Each has a local implementation in this
//! crate (`db`, `storage`, `settings`, `notify`); a hosted backend can stand in for any of them.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::geo::Geofence;
use crate::models::AttendanceDay;

use super::state::TransitionSubmission;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum SubmitOutcome {
    Accepted { record: AttendanceDay },
    Rejected { reason: String },
}

/// Owner of the daily record. Decides uniqueness and grades the check-in.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn submit_transition(
        &self,
        staff_id: &str,
        submission: TransitionSubmission,
    ) -> Result<SubmitOutcome>;
}

/// A durable reference to an uploaded verification photo.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRef {
    pub public_url: String,
}

#[async_trait]
pub trait PhotoStore: Send + Sync {
    /// `Ok(None)` means the storage accepted the call but produced no reference.
    async fn upload_verification_photo(
        &self,
        image_bytes: Vec<u8>,
        path_hint: &str,
    ) -> Result<Option<PhotoRef>>;
}

#[async_trait]
pub trait SiteConfigProvider: Send + Sync {
    /// Geofence of the staff member's assigned site, if it has one.
    async fn geofence_for(&self, staff_id: &str) -> Result<Option<Geofence>>;
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Severity {
    Success,
    Error,
    Info,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str, severity: Severity);
}
