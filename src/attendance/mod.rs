#[cfg(feature = "desktop")]
pub mod commands;
pub mod controller;
pub mod desks;
pub mod error;
pub mod ports;
pub mod state;

pub use controller::{AttendanceController, AttendanceDeps, AttendanceSnapshot, PhotoPreview};
pub use desks::DeskRegistry;
pub use error::AttendanceError;
pub use ports::{
    AttendanceStore, Notifier, PhotoRef, PhotoStore, Severity, SiteConfigProvider, SubmitOutcome,
};
pub use state::{
    apply_transition, checkin_status, intended_transition, plan_transition, AttendanceState,
    GeofencePolicy, ShiftSchedule, Transition, TransitionRequest, TransitionSubmission,
};
