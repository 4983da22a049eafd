use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::{info, warn};

use super::capability::{Camera, CameraError, CameraStream};
use super::encode::{encode_jpeg, JPEG_QUALITY};

/// An encoded verification still, ready for upload.
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub captured_at: DateTime<Utc>,
}

impl CapturedPhoto {
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Exclusive owner of a camera stream for one verification attempt.
///
/// The stream is stopped as soon as a frame is captured, on `cancel`, or when the
/// capture is dropped.
pub struct PhotoCapture {
    camera: Arc<dyn Camera>,
    stream: Option<CameraStream>,
}

impl PhotoCapture {
    /// Start the camera. Permission denial aborts the verification flow here.
    pub fn open(camera: Arc<dyn Camera>) -> Result<Self, CameraError> {
        let stream = camera.start()?;
        info!("Camera stream {} started for verification", stream.id());
        Ok(Self {
            camera,
            stream: Some(stream),
        })
    }

    pub fn is_live(&self) -> bool {
        self.stream.is_some()
    }

    /// Grab one frame and release the stream, whatever the outcome.
    pub fn capture(&mut self) -> Result<CapturedPhoto, CameraError> {
        let stream = self.stream.take().ok_or(CameraError::NotStreaming)?;
        let frame = self.camera.capture_frame(&stream);
        self.release(stream);

        let frame = frame?;
        let bytes = encode_jpeg(&frame, JPEG_QUALITY)?;
        Ok(CapturedPhoto {
            bytes,
            width: frame.width,
            height: frame.height,
            captured_at: Utc::now(),
        })
    }

    pub fn cancel(&mut self) {
        if let Some(stream) = self.stream.take() {
            self.release(stream);
        }
    }

    fn release(&self, stream: CameraStream) {
        let id = stream.id();
        self.camera.stop(stream);
        info!("Camera stream {id} stopped");
    }
}

impl Drop for PhotoCapture {
    fn drop(&mut self) {
        if self.stream.is_some() {
            warn!("Verification capture dropped with a live stream; stopping it");
            self.cancel();
        }
    }
}

/// Open the camera, take a single still, and release it.
pub fn capture_once(camera: Arc<dyn Camera>) -> Result<CapturedPhoto, CameraError> {
    let mut capture = PhotoCapture::open(camera)?;
    capture.capture()
}
