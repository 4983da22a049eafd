//! The per-staff, per-day attendance state machine.
//!
//! `NotCheckedIn -> CheckedIn -> CheckedOut`. Everything here is a pure function of the
//! current record and the transition inputs so it can be exercised without any shell.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::camera::CapturedPhoto;
use crate::geo::Geofence;
use crate::models::{AttendanceDay, CheckinStatus, Coordinates, Mood};

use super::error::AttendanceError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AttendanceState {
    NotCheckedIn,
    CheckedIn,
    CheckedOut,
}

impl AttendanceState {
    pub fn of(record: Option<&AttendanceDay>) -> Self {
        match record {
            None => AttendanceState::NotCheckedIn,
            Some(day) if day.is_checked_out() => AttendanceState::CheckedOut,
            Some(day) if day.is_checked_in() => AttendanceState::CheckedIn,
            Some(_) => AttendanceState::NotCheckedIn,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Transition {
    CheckIn,
    CheckOut,
}

impl Transition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Transition::CheckIn => "checkin",
            Transition::CheckOut => "checkout",
        }
    }
}

/// What to do with a non-remote check-in at a geofenced site when there is no location.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum GeofencePolicy {
    /// Refuse with `LocationUnavailable`.
    #[default]
    Strict,
    /// Skip the distance check, as if the site had no geofence.
    AllowWithoutLocation,
}

/// Shift start used to grade a check-in as on time or late.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShiftSchedule {
    pub start: NaiveTime,
    pub grace_minutes: u32,
}

impl Default for ShiftSchedule {
    fn default() -> Self {
        Self {
            start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            grace_minutes: 0,
        }
    }
}

/// Inputs gathered by the desk for one confirm.
#[derive(Debug, Clone, Default)]
pub struct TransitionRequest {
    pub notes: Option<String>,
    pub is_remote: bool,
    pub location: Option<Coordinates>,
    pub photo: Option<CapturedPhoto>,
    pub mood: Option<Mood>,
}

/// A validated transition with its uploaded photo, as handed to persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransitionSubmission {
    pub transition: Transition,
    pub notes: Option<String>,
    pub is_remote: bool,
    pub location: Option<Coordinates>,
    pub photo_url: String,
    pub mood: Option<Mood>,
}

pub fn intended_transition(record: Option<&AttendanceDay>) -> Result<Transition, AttendanceError> {
    match AttendanceState::of(record) {
        AttendanceState::NotCheckedIn => Ok(Transition::CheckIn),
        AttendanceState::CheckedIn => Ok(Transition::CheckOut),
        AttendanceState::CheckedOut => Err(AttendanceError::AlreadyCheckedOut),
    }
}

/// Validate a confirm without side effects.
///
/// The photo is checked before the geofence so a missing photo is always reported as
/// `VerificationMissing`.
pub fn plan_transition(
    record: Option<&AttendanceDay>,
    request: &TransitionRequest,
    geofence: Option<&Geofence>,
    policy: GeofencePolicy,
) -> Result<Transition, AttendanceError> {
    let transition = intended_transition(record)?;

    if request.photo.as_ref().map_or(true, CapturedPhoto::is_empty) {
        return Err(AttendanceError::VerificationMissing);
    }

    if transition == Transition::CheckIn && !request.is_remote {
        if let Some(fence) = geofence {
            match (request.location, policy) {
                (Some(location), _) => {
                    fence.check(location)?;
                }
                (None, GeofencePolicy::Strict) => return Err(AttendanceError::LocationUnavailable),
                (None, GeofencePolicy::AllowWithoutLocation) => {}
            }
        }
    }

    Ok(transition)
}

pub fn checkin_status(local_time: NaiveTime, shift: &ShiftSchedule, is_remote: bool) -> CheckinStatus {
    if is_remote {
        return CheckinStatus::Remote;
    }
    let deadline = shift.start + Duration::minutes(i64::from(shift.grace_minutes));
    // A grace period that wraps past midnight never makes anyone late.
    if deadline < shift.start || local_time <= deadline {
        CheckinStatus::OnTime
    } else {
        CheckinStatus::Late
    }
}

/// Produce the next record for an accepted submission.
pub fn apply_transition(
    record: Option<&AttendanceDay>,
    staff_id: &str,
    date: NaiveDate,
    submission: &TransitionSubmission,
    at: DateTime<Utc>,
    status: CheckinStatus,
) -> Result<AttendanceDay, AttendanceError> {
    match (submission.transition, AttendanceState::of(record)) {
        (Transition::CheckIn, AttendanceState::NotCheckedIn) => Ok(AttendanceDay {
            staff_id: staff_id.to_string(),
            date,
            checkin_timestamp: Some(at),
            checkin_status: Some(status),
            checkout_timestamp: None,
            notes: submission.notes.clone(),
            mood: submission.mood,
            photo_url: Some(submission.photo_url.clone()),
            checkout_photo_url: None,
            location: submission.location,
            is_remote: submission.is_remote,
        }),
        (Transition::CheckOut, AttendanceState::CheckedIn) => {
            let mut next = record
                .cloned()
                .ok_or_else(|| AttendanceError::TransitionRejected("no check-in found for today".into()))?;
            next.checkout_timestamp = Some(at);
            next.checkout_photo_url = Some(submission.photo_url.clone());
            if submission.notes.is_some() {
                next.notes = submission.notes.clone();
            }
            Ok(next)
        }
        (Transition::CheckIn, _) => Err(AttendanceError::TransitionRejected(
            "already checked in today".into(),
        )),
        (Transition::CheckOut, AttendanceState::NotCheckedIn) => Err(
            AttendanceError::TransitionRejected("no check-in found for today".into()),
        ),
        (Transition::CheckOut, AttendanceState::CheckedOut) => Err(AttendanceError::AlreadyCheckedOut),
    }
}
