pub mod distance;
pub mod geofence;

pub use distance::{compute_distance_meters, EARTH_RADIUS_METERS};
pub use geofence::{Geofence, GeofenceViolation};
