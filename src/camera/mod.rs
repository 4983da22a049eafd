pub mod capability;
pub mod capture;
pub mod encode;

pub use capability::{Camera, CameraError, CameraStream, Frame};
pub use capture::{capture_once, CapturedPhoto, PhotoCapture};
