use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::models::Coordinates;

use super::distance::compute_distance_meters;

/// Circular boundary a staff member must be inside to check in on site.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Geofence {
    pub center_lat: f64,
    pub center_lng: f64,
    pub radius_meters: f64,
}

impl Geofence {
    pub fn new(center: Coordinates, radius_meters: f64) -> Self {
        Self {
            center_lat: center.latitude,
            center_lng: center.longitude,
            radius_meters,
        }
    }

    pub fn center(&self) -> Coordinates {
        Coordinates::new(self.center_lat, self.center_lng)
    }

    pub fn is_valid(&self) -> bool {
        self.center().is_valid() && self.radius_meters.is_finite() && self.radius_meters > 0.0
    }

    /// Returns the measured distance when `location` lies within the radius.
    /// A point exactly on the boundary is inside.
    pub fn check(&self, location: Coordinates) -> Result<f64, GeofenceViolation> {
        let distance_meters = compute_distance_meters(self.center(), location);
        if distance_meters > self.radius_meters {
            return Err(GeofenceViolation {
                distance_meters,
                limit_meters: self.radius_meters,
            });
        }
        Ok(distance_meters)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeofenceViolation {
    pub distance_meters: f64,
    pub limit_meters: f64,
}

impl Display for GeofenceViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "you are {:.0}m from site, limit is {:.0}m",
            self.distance_meters, self.limit_meters
        )
    }
}

impl std::error::Error for GeofenceViolation {}
