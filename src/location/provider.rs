use std::fmt::{Display, Formatter};

use crate::models::Coordinates;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    PermissionDenied,
    Unsupported,
    Unavailable(String),
}

impl Display for LocationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationError::PermissionDenied => write!(f, "location permission denied"),
            LocationError::Unsupported => write!(f, "geolocation is not supported on this device"),
            LocationError::Unavailable(reason) => write!(f, "location unavailable: {reason}"),
        }
    }
}

impl std::error::Error for LocationError {}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub coordinates: Coordinates,
    pub accuracy_meters: Option<f64>,
}

/// Platform geolocation, opened in high-accuracy mode with no maximum fix age.
pub trait LocationProvider: Send + Sync + 'static {
    /// Ask for permission and start platform updates.
    fn open(&self) -> Result<(), LocationError>;

    fn current_position(&self) -> Result<LocationFix, LocationError>;

    /// Release platform updates. Called exactly once for every successful `open`.
    fn close(&self);
}
