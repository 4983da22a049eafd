//! Attendance data models.
//!
//! One `AttendanceDay` exists per (staff member, calendar day). It is created by the
//! first accepted check-in and mutated once more by the checkout.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum CheckinStatus {
    OnTime,
    Late,
    Remote,
}

impl CheckinStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckinStatus::OnTime => "OnTime",
            CheckinStatus::Late => "Late",
            CheckinStatus::Remote => "Remote",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Mood {
    Great,
    Good,
    Okay,
    Tired,
    Stressed,
}

impl Mood {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::Great => "Great",
            Mood::Good => "Good",
            Mood::Okay => "Okay",
            Mood::Tired => "Tired",
            Mood::Stressed => "Stressed",
        }
    }
}

/// A point in decimal degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// A location fix together with when it was taken.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LocationSample {
    pub coordinates: Coordinates,
    /// Reported accuracy radius in meters, if the platform supplies one.
    pub accuracy_meters: Option<f64>,
    pub sampled_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceDay {
    pub staff_id: String,
    pub date: NaiveDate,
    pub checkin_timestamp: Option<DateTime<Utc>>,
    pub checkin_status: Option<CheckinStatus>,
    pub checkout_timestamp: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub mood: Option<Mood>,
    pub photo_url: Option<String>,
    pub checkout_photo_url: Option<String>,
    pub location: Option<Coordinates>,
    pub is_remote: bool,
}

impl AttendanceDay {
    pub fn is_checked_in(&self) -> bool {
        self.checkin_timestamp.is_some()
    }

    pub fn is_checked_out(&self) -> bool {
        self.checkout_timestamp.is_some()
    }

    /// Time on site between check-in and checkout, once both exist.
    pub fn worked_minutes(&self) -> Option<i64> {
        match (self.checkin_timestamp, self.checkout_timestamp) {
            (Some(start), Some(end)) => Some((end - start).num_minutes().max(0)),
            _ => None,
        }
    }
}
