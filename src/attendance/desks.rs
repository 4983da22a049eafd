use std::collections::HashMap;
use std::future::Future;

use anyhow::Result;
use chrono::NaiveDate;
use log::{info, warn};
use tokio::sync::Mutex;

use super::controller::AttendanceController;

/// Open desks, one per staff member, each bound to the local day it was opened for.
#[derive(Default)]
pub struct DeskRegistry {
    desks: Mutex<HashMap<String, AttendanceController>>,
}

impl DeskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The staff member's desk for `today`. A desk left open from an earlier day is shut
    /// down and replaced with one built by `open`, which inherits its location feed.
    pub async fn get_or_open<F, Fut>(
        &self,
        staff_id: &str,
        today: NaiveDate,
        open: F,
    ) -> Result<AttendanceController>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<AttendanceController>>,
    {
        let mut desks = self.desks.lock().await;
        if let Some(existing) = desks.get(staff_id) {
            if existing.date() == today {
                return Ok(existing.clone());
            }
        }

        let mut resume_location = false;
        if let Some(stale) = desks.remove(staff_id) {
            resume_location = stale.is_locating().await;
            info!(
                "Desk for {staff_id} rolled over from {} to {today}",
                stale.date()
            );
            if let Err(err) = stale.shutdown().await {
                warn!("Failed to shut down stale desk for {staff_id}: {err:#}");
            }
        }

        let controller = open().await?;
        if resume_location {
            controller.start_location().await;
        }
        desks.insert(staff_id.to_string(), controller.clone());
        Ok(controller)
    }

    pub async fn is_open(&self, staff_id: &str) -> bool {
        self.desks.lock().await.contains_key(staff_id)
    }

    pub async fn close(&self, staff_id: &str) -> Result<()> {
        let removed = self.desks.lock().await.remove(staff_id);
        match removed {
            Some(controller) => controller.shutdown().await,
            None => Ok(()),
        }
    }
}
