use std::fmt::{Display, Formatter};

use crate::camera::CameraError;
use crate::geo::GeofenceViolation;

#[derive(Debug, Clone, PartialEq)]
pub enum AttendanceError {
    /// No verification photo was captured.
    VerificationMissing,
    /// A geofence applies but there is no location sample.
    LocationUnavailable,
    GeofenceViolation {
        distance_meters: f64,
        limit_meters: f64,
    },
    UploadFailed(String),
    TransitionRejected(String),
    /// The day's record is already checked out.
    AlreadyCheckedOut,
    /// Another confirm is still running for this staff member.
    TransitionInFlight,
    /// The site configuration could not be read, so the geofence is unknown.
    SiteConfig(String),
    Camera(CameraError),
}

impl AttendanceError {
    /// Whether the user can fix the problem and try again the same day.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, AttendanceError::AlreadyCheckedOut)
    }
}

impl Display for AttendanceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AttendanceError::VerificationMissing => {
                write!(f, "photo verification required")
            }
            AttendanceError::LocationUnavailable => write!(
                f,
                "location unavailable; enable location access or mark as remote"
            ),
            AttendanceError::GeofenceViolation {
                distance_meters,
                limit_meters,
            } => write!(
                f,
                "you are {:.0}m from site, limit is {:.0}m",
                distance_meters, limit_meters
            ),
            AttendanceError::UploadFailed(reason) => {
                write!(f, "failed to upload verification photo: {reason}")
            }
            AttendanceError::TransitionRejected(reason) => {
                write!(f, "attendance update rejected: {reason}")
            }
            AttendanceError::AlreadyCheckedOut => write!(f, "already checked out for today"),
            AttendanceError::TransitionInFlight => {
                write!(f, "an attendance update is already in progress")
            }
            AttendanceError::SiteConfig(reason) => {
                write!(f, "could not load site configuration: {reason}")
            }
            AttendanceError::Camera(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for AttendanceError {}

impl From<GeofenceViolation> for AttendanceError {
    fn from(violation: GeofenceViolation) -> Self {
        AttendanceError::GeofenceViolation {
            distance_meters: violation.distance_meters,
            limit_meters: violation.limit_meters,
        }
    }
}

impl From<CameraError> for AttendanceError {
    fn from(err: CameraError) -> Self {
        AttendanceError::Camera(err)
    }
}
