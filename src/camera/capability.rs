use std::fmt::{Display, Formatter};

/// Opaque handle to a live camera stream. Only the camera that issued it can stop it.
#[derive(Debug, PartialEq, Eq)]
pub struct CameraStream {
    id: u64,
}

impl CameraStream {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// Raw RGB8 still grabbed from a stream.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    PermissionDenied,
    Unavailable(String),
    CaptureFailed(String),
    Encoding(String),
    /// Capture was requested without a live stream.
    NotStreaming,
}

impl Display for CameraError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraError::PermissionDenied => write!(f, "could not access camera: permission denied"),
            CameraError::Unavailable(reason) => write!(f, "could not access camera: {reason}"),
            CameraError::CaptureFailed(reason) => write!(f, "photo capture failed: {reason}"),
            CameraError::Encoding(reason) => write!(f, "photo encoding failed: {reason}"),
            CameraError::NotStreaming => write!(f, "camera is not streaming"),
        }
    }
}

impl std::error::Error for CameraError {}

/// Video-only camera access. Platform shells provide the implementation.
pub trait Camera: Send + Sync + 'static {
    fn start(&self) -> Result<CameraStream, CameraError>;

    fn capture_frame(&self, stream: &CameraStream) -> Result<Frame, CameraError>;

    fn stop(&self, stream: CameraStream);
}
