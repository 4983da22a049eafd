pub mod attendance;

pub use attendance::{AttendanceDay, CheckinStatus, Coordinates, LocationSample, Mood};
