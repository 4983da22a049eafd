use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::Result;
use chrono::NaiveDate;
use log::{error, info, warn};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::camera::{capture_once, Camera, CameraError, CapturedPhoto, PhotoCapture};
use crate::location::{LocationSampler, LocationSubscription};
use crate::models::{AttendanceDay, LocationSample, Mood};

use super::error::AttendanceError;
use super::ports::{AttendanceStore, Notifier, PhotoStore, Severity, SiteConfigProvider, SubmitOutcome};
use super::state::{
    intended_transition, plan_transition, AttendanceState, GeofencePolicy, Transition,
    TransitionRequest, TransitionSubmission,
};

/// Everything the desk needs from outside.
#[derive(Clone)]
pub struct AttendanceDeps {
    pub store: Arc<dyn AttendanceStore>,
    pub photos: Arc<dyn PhotoStore>,
    pub sites: Arc<dyn SiteConfigProvider>,
    pub notifier: Arc<dyn Notifier>,
    pub camera: Arc<dyn Camera>,
    pub sampler: LocationSampler,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoPreview {
    pub width: u32,
    pub height: u32,
    pub size_bytes: usize,
}

impl From<&CapturedPhoto> for PhotoPreview {
    fn from(photo: &CapturedPhoto) -> Self {
        Self {
            width: photo.width,
            height: photo.height,
            size_bytes: photo.bytes.len(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSnapshot {
    pub staff_id: String,
    pub date: NaiveDate,
    pub state: AttendanceState,
    pub next_transition: Option<Transition>,
    pub record: Option<AttendanceDay>,
    pub photo: Option<PhotoPreview>,
    pub camera_open: bool,
    pub location: Option<LocationSample>,
    pub in_flight: bool,
}

#[derive(Default)]
struct DeskState {
    record: Option<AttendanceDay>,
    pending_photo: Option<CapturedPhoto>,
}

/// Check-in/checkout desk for one staff member on one day.
#[derive(Clone)]
pub struct AttendanceController {
    staff_id: String,
    date: NaiveDate,
    state: Arc<Mutex<DeskState>>,
    location: Arc<Mutex<Option<LocationSubscription>>>,
    capture: Arc<Mutex<Option<PhotoCapture>>>,
    in_flight: Arc<AtomicBool>,
    deps: AttendanceDeps,
    policy: GeofencePolicy,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AttendanceController {
    /// `date` is the desk's local attendance day and `today` the staff member's existing
    /// record for it, if any.
    pub fn new(
        staff_id: impl Into<String>,
        date: NaiveDate,
        today: Option<AttendanceDay>,
        deps: AttendanceDeps,
        policy: GeofencePolicy,
    ) -> Self {
        Self {
            staff_id: staff_id.into(),
            date,
            state: Arc::new(Mutex::new(DeskState {
                record: today,
                pending_photo: None,
            })),
            location: Arc::new(Mutex::new(None)),
            capture: Arc::new(Mutex::new(None)),
            in_flight: Arc::new(AtomicBool::new(false)),
            deps,
            policy,
        }
    }

    pub fn staff_id(&self) -> &str {
        &self.staff_id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub async fn get_state(&self) -> AttendanceState {
        AttendanceState::of(self.state.lock().await.record.as_ref())
    }

    pub async fn get_snapshot(&self) -> AttendanceSnapshot {
        let location = self.current_location().await;
        let camera_open = self
            .capture
            .lock()
            .await
            .as_ref()
            .is_some_and(PhotoCapture::is_live);
        let guard = self.state.lock().await;
        AttendanceSnapshot {
            staff_id: self.staff_id.clone(),
            date: self.date,
            state: AttendanceState::of(guard.record.as_ref()),
            next_transition: intended_transition(guard.record.as_ref()).ok(),
            record: guard.record.clone(),
            photo: guard.pending_photo.as_ref().map(PhotoPreview::from),
            camera_open,
            location,
            in_flight: self.in_flight.load(Ordering::Acquire),
        }
    }

    /// Begin continuous location sampling. Idempotent while the feed is live; a feed that
    /// ended, for example on a permission denial, is replaced.
    pub async fn start_location(&self) {
        let mut guard = self.location.lock().await;
        if guard.as_ref().is_some_and(LocationSubscription::is_active) {
            return;
        }
        if guard.take().is_some() {
            info!("Restarting ended location feed for {}", self.staff_id);
        }
        *guard = Some(self.deps.sampler.subscribe());
    }

    pub async fn stop_location(&self) -> Result<()> {
        let subscription = self.location.lock().await.take();
        match subscription {
            Some(subscription) => subscription.unsubscribe().await,
            None => Ok(()),
        }
    }

    /// Whether a location feed is currently running.
    pub async fn is_locating(&self) -> bool {
        self.location
            .lock()
            .await
            .as_ref()
            .is_some_and(LocationSubscription::is_active)
    }

    pub async fn current_location(&self) -> Option<LocationSample> {
        self.location
            .lock()
            .await
            .as_ref()
            .and_then(LocationSubscription::latest)
    }

    /// Open the camera for a verification shot. Permission denial ends the flow here.
    pub async fn begin_verification(&self) -> Result<(), AttendanceError> {
        let mut guard = self.capture.lock().await;
        if guard.as_ref().is_some_and(PhotoCapture::is_live) {
            return Ok(());
        }
        match PhotoCapture::open(Arc::clone(&self.deps.camera)) {
            Ok(capture) => {
                *guard = Some(capture);
                Ok(())
            }
            Err(err) => {
                *guard = None;
                Err(self.camera_failed(err))
            }
        }
    }

    /// Take the verification still from the open camera, or open it just for this shot.
    /// The camera is released before this returns.
    pub async fn capture_photo(&self) -> Result<PhotoPreview, AttendanceError> {
        let session = self.capture.lock().await.take();
        let camera = Arc::clone(&self.deps.camera);
        let captured = tokio::task::spawn_blocking(move || match session {
            Some(mut capture) => capture.capture(),
            None => capture_once(camera),
        })
        .await
        .map_err(|err| CameraError::CaptureFailed(format!("capture worker join failed: {err}")))
        .and_then(|result| result);

        match captured {
            Ok(photo) => {
                let preview = PhotoPreview::from(&photo);
                self.state.lock().await.pending_photo = Some(photo);
                info!(
                    "Verification photo captured for {} ({} bytes)",
                    self.staff_id, preview.size_bytes
                );
                Ok(preview)
            }
            Err(err) => Err(self.camera_failed(err)),
        }
    }

    /// Drop the current photo and re-open the camera for another shot.
    pub async fn retake_photo(&self) -> Result<(), AttendanceError> {
        self.discard_photo().await;
        self.begin_verification().await
    }

    pub async fn discard_photo(&self) {
        self.state.lock().await.pending_photo = None;
    }

    /// Close the camera without taking a photo.
    pub async fn cancel_verification(&self) {
        if let Some(mut capture) = self.capture.lock().await.take() {
            capture.cancel();
        }
    }

    fn camera_failed(&self, err: CameraError) -> AttendanceError {
        warn!("Verification camera failed for {}: {err}", self.staff_id);
        let err = AttendanceError::from(err);
        self.deps.notifier.notify(&err.to_string(), Severity::Error);
        err
    }

    /// Confirm using the latest location fix and the pending photo.
    pub async fn confirm(
        &self,
        notes: Option<String>,
        is_remote: bool,
        mood: Option<Mood>,
    ) -> Result<AttendanceDay, AttendanceError> {
        let location = self.current_location().await.map(|sample| sample.coordinates);
        let photo = self.state.lock().await.pending_photo.clone();
        self.confirm_transition(TransitionRequest {
            notes,
            is_remote,
            location,
            photo,
            mood,
        })
        .await
    }

    /// Validate, upload the photo, and submit the transition. Every failure is also
    /// reported through the notifier; local state only moves on an accepted submission.
    pub async fn confirm_transition(
        &self,
        request: TransitionRequest,
    ) -> Result<AttendanceDay, AttendanceError> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            let err = AttendanceError::TransitionInFlight;
            self.deps.notifier.notify(&err.to_string(), Severity::Info);
            return Err(err);
        };

        match self.run_transition(request).await {
            Ok((transition, record)) => {
                let message = match transition {
                    Transition::CheckIn => "Checked in successfully",
                    Transition::CheckOut => "Checked out successfully",
                };
                info!("{} {} on {}", self.staff_id, transition.as_str(), record.date);
                self.deps.notifier.notify(message, Severity::Success);
                Ok(record)
            }
            Err(err) => {
                warn!("Attendance update for {} failed: {err}", self.staff_id);
                self.deps.notifier.notify(&err.to_string(), Severity::Error);
                Err(err)
            }
        }
    }

    async fn run_transition(
        &self,
        request: TransitionRequest,
    ) -> Result<(Transition, AttendanceDay), AttendanceError> {
        let record = self.state.lock().await.record.clone();
        let transition = intended_transition(record.as_ref())?;

        // A missing photo is reported before any site lookup.
        if request.photo.as_ref().map_or(true, CapturedPhoto::is_empty) {
            return Err(AttendanceError::VerificationMissing);
        }

        let geofence = if transition == Transition::CheckIn && !request.is_remote {
            self.deps
                .sites
                .geofence_for(&self.staff_id)
                .await
                .map_err(|err| AttendanceError::SiteConfig(format!("{err:#}")))?
                .filter(|fence| fence.is_valid())
        } else {
            None
        };

        plan_transition(record.as_ref(), &request, geofence.as_ref(), self.policy)?;

        let photo = request
            .photo
            .ok_or(AttendanceError::VerificationMissing)?;
        let path_hint = format!(
            "{}/{}-{}-{}.jpg",
            self.staff_id,
            self.date.format("%Y%m%d"),
            transition.as_str(),
            Uuid::new_v4()
        );

        let photo_ref = self
            .deps
            .photos
            .upload_verification_photo(photo.bytes, &path_hint)
            .await
            .map_err(|err| AttendanceError::UploadFailed(format!("{err:#}")))?
            .ok_or_else(|| AttendanceError::UploadFailed("storage returned no reference".into()))?;

        let submission = TransitionSubmission {
            transition,
            notes: request
                .notes
                .map(|notes| notes.trim().to_string())
                .filter(|notes| !notes.is_empty()),
            is_remote: match (transition, record.as_ref()) {
                (Transition::CheckOut, Some(day)) => day.is_remote,
                _ => request.is_remote,
            },
            location: request.location,
            photo_url: photo_ref.public_url,
            mood: match transition {
                Transition::CheckIn => request.mood,
                Transition::CheckOut => None,
            },
        };

        let outcome = self
            .deps
            .store
            .submit_transition(&self.staff_id, submission)
            .await
            .map_err(|err| {
                error!("Attendance submission failed for {}: {err:#}", self.staff_id);
                AttendanceError::TransitionRejected(format!("{err:#}"))
            })?;

        match outcome {
            SubmitOutcome::Accepted { record } => {
                let mut guard = self.state.lock().await;
                guard.record = Some(record.clone());
                guard.pending_photo = None;
                Ok((transition, record))
            }
            SubmitOutcome::Rejected { reason } => Err(AttendanceError::TransitionRejected(reason)),
        }
    }

    /// Release the location feed and the camera, and drop any pending photo.
    pub async fn shutdown(&self) -> Result<()> {
        self.cancel_verification().await;
        self.discard_photo().await;
        self.stop_location().await
    }
}
