use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use log::info;

use crate::attendance::{AttendanceStore, SubmitOutcome, TransitionSubmission};
use crate::settings::SettingsStore;

use super::Database;

/// Local stand-in for the hosted attendance backend.
#[derive(Clone)]
pub struct SqliteAttendanceStore {
    db: Database,
    settings: Arc<SettingsStore>,
}

impl SqliteAttendanceStore {
    pub fn new(db: Database, settings: Arc<SettingsStore>) -> Self {
        Self { db, settings }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl AttendanceStore for SqliteAttendanceStore {
    async fn submit_transition(
        &self,
        staff_id: &str,
        submission: TransitionSubmission,
    ) -> Result<SubmitOutcome> {
        let transition = submission.transition;
        let outcome = self
            .db
            .record_transition(
                staff_id,
                submission,
                Utc::now(),
                self.settings.utc_offset(),
                self.settings.shift(),
            )
            .await?;

        if let SubmitOutcome::Rejected { reason } = &outcome {
            info!("Rejected {} for {staff_id}: {reason}", transition.as_str());
        }
        Ok(outcome)
    }
}
