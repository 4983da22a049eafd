//! Camera and location capabilities fed by the webview.
//!
//! In the desktop shell the media and geolocation APIs live in the webview. The page
//! forwards permission results, location fixes, and camera frames through commands,
//! and these types expose them to the core as ordinary `Camera` and
//! `LocationProvider` implementations.

use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::camera::{Camera, CameraError, CameraStream, Frame};
use crate::location::{LocationError, LocationFix, LocationProvider};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum PermissionStatus {
    #[default]
    Prompt,
    Granted,
    Denied,
    Unsupported,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[derive(Default)]
struct LocationInner {
    status: PermissionStatus,
    latest: Option<LocationFix>,
    open_watches: usize,
}

#[derive(Default)]
pub struct WebviewLocation {
    inner: Mutex<LocationInner>,
}

impl WebviewLocation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&self, status: PermissionStatus) {
        let mut inner = lock(&self.inner);
        inner.status = status;
        if matches!(status, PermissionStatus::Denied | PermissionStatus::Unsupported) {
            inner.latest = None;
        }
    }

    pub fn push_fix(&self, fix: LocationFix) {
        let mut inner = lock(&self.inner);
        inner.status = PermissionStatus::Granted;
        inner.latest = Some(fix);
    }

    pub fn open_watches(&self) -> usize {
        lock(&self.inner).open_watches
    }
}

impl LocationProvider for WebviewLocation {
    fn open(&self) -> Result<(), LocationError> {
        let mut inner = lock(&self.inner);
        match inner.status {
            PermissionStatus::Denied => Err(LocationError::PermissionDenied),
            PermissionStatus::Unsupported => Err(LocationError::Unsupported),
            PermissionStatus::Prompt | PermissionStatus::Granted => {
                inner.open_watches += 1;
                Ok(())
            }
        }
    }

    fn current_position(&self) -> Result<LocationFix, LocationError> {
        let inner = lock(&self.inner);
        match (inner.status, inner.latest) {
            (PermissionStatus::Denied, _) => Err(LocationError::PermissionDenied),
            (_, Some(fix)) => Ok(fix),
            (_, None) => Err(LocationError::Unavailable("no fix received yet".into())),
        }
    }

    fn close(&self) {
        let mut inner = lock(&self.inner);
        inner.open_watches = inner.open_watches.saturating_sub(1);
    }
}

#[derive(Default)]
struct CameraInner {
    status: PermissionStatus,
    live_stream: Option<u64>,
    next_stream_id: u64,
    frame: Option<Frame>,
}

#[derive(Default)]
pub struct WebviewCamera {
    inner: Mutex<CameraInner>,
}

impl WebviewCamera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status(&self, status: PermissionStatus) {
        lock(&self.inner).status = status;
    }

    /// Latest still from the page's video element. Ignored unless a stream is live.
    pub fn submit_frame(&self, frame: Frame) -> Result<(), CameraError> {
        let mut inner = lock(&self.inner);
        if inner.live_stream.is_none() {
            return Err(CameraError::NotStreaming);
        }
        inner.frame = Some(frame);
        Ok(())
    }

    pub fn is_streaming(&self) -> bool {
        lock(&self.inner).live_stream.is_some()
    }
}

impl Camera for WebviewCamera {
    fn start(&self) -> Result<CameraStream, CameraError> {
        let mut inner = lock(&self.inner);
        match inner.status {
            PermissionStatus::Denied => return Err(CameraError::PermissionDenied),
            PermissionStatus::Unsupported => {
                return Err(CameraError::Unavailable("no camera on this device".into()))
            }
            PermissionStatus::Prompt | PermissionStatus::Granted => {}
        }
        if inner.live_stream.is_some() {
            return Err(CameraError::Unavailable("camera already in use".into()));
        }
        let id = inner.next_stream_id;
        inner.next_stream_id += 1;
        inner.live_stream = Some(id);
        inner.frame = None;
        Ok(CameraStream::new(id))
    }

    fn capture_frame(&self, stream: &CameraStream) -> Result<Frame, CameraError> {
        let mut inner = lock(&self.inner);
        if inner.live_stream != Some(stream.id()) {
            return Err(CameraError::NotStreaming);
        }
        inner
            .frame
            .take()
            .ok_or_else(|| CameraError::CaptureFailed("no frame received from camera".into()))
    }

    fn stop(&self, stream: CameraStream) {
        let mut inner = lock(&self.inner);
        if inner.live_stream == Some(stream.id()) {
            inner.live_stream = None;
            inner.frame = None;
        }
    }
}
