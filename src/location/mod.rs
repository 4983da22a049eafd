pub mod controller;
pub mod loop_worker;
pub mod provider;

pub use controller::{LocationSampler, LocationSubscription, DEFAULT_SAMPLE_INTERVAL};
pub use provider::{LocationError, LocationFix, LocationProvider};
