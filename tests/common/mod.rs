#![allow(dead_code)]

use std::sync::{
    atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering},
    Arc, Mutex,
};
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use staffdesk_lib::attendance::{
    apply_transition, AttendanceController, AttendanceDeps, AttendanceStore, GeofencePolicy,
    Notifier, PhotoRef, PhotoStore, Severity, SiteConfigProvider, SubmitOutcome,
    TransitionSubmission,
};
use staffdesk_lib::camera::{Camera, CameraError, CameraStream, CapturedPhoto, Frame};
use staffdesk_lib::geo::{Geofence, EARTH_RADIUS_METERS};
use staffdesk_lib::location::{LocationError, LocationFix, LocationProvider, LocationSampler};
use staffdesk_lib::models::{AttendanceDay, CheckinStatus, Coordinates};

pub const STAFF: &str = "staff-1";
pub const SAMPLE_INTERVAL: Duration = Duration::from_millis(10);

pub fn site() -> Coordinates {
    Coordinates::new(6.5244, 3.3792)
}

pub fn north_of_site(meters: f64) -> Coordinates {
    let delta = (meters / EARTH_RADIUS_METERS).to_degrees();
    Coordinates::new(site().latitude + delta, site().longitude)
}

pub fn site_fence(radius_meters: f64) -> Geofence {
    Geofence::new(site(), radius_meters)
}

pub fn jpeg_photo() -> CapturedPhoto {
    CapturedPhoto {
        bytes: vec![0xFF, 0xD8, 0xFF, 0xD9],
        width: 1,
        height: 1,
        captured_at: Utc::now(),
    }
}

#[derive(Default)]
pub struct FakeStore {
    record: Mutex<Option<AttendanceDay>>,
    submits: AtomicUsize,
    failing: AtomicBool,
    rejecting: AtomicBool,
    delay_ms: AtomicU64,
}

impl FakeStore {
    pub fn submits(&self) -> usize {
        self.submits.load(Ordering::SeqCst)
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.delay_ms.store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn seed(&self, record: AttendanceDay) {
        *self.record.lock().unwrap() = Some(record);
    }
}

#[async_trait]
impl AttendanceStore for FakeStore {
    async fn submit_transition(
        &self,
        staff_id: &str,
        submission: TransitionSubmission,
    ) -> Result<SubmitOutcome> {
        self.submits.fetch_add(1, Ordering::SeqCst);
        let delay = self.delay_ms.load(Ordering::SeqCst);
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            bail!("backend unreachable");
        }
        if self.rejecting.load(Ordering::SeqCst) {
            return Ok(SubmitOutcome::Rejected {
                reason: "duplicate record".into(),
            });
        }

        let now = Utc::now();
        let status = if submission.is_remote {
            CheckinStatus::Remote
        } else {
            CheckinStatus::OnTime
        };
        let mut guard = self.record.lock().unwrap();
        match apply_transition(
            guard.as_ref(),
            staff_id,
            now.date_naive(),
            &submission,
            now,
            status,
        ) {
            Ok(next) => {
                *guard = Some(next.clone());
                Ok(SubmitOutcome::Accepted { record: next })
            }
            Err(err) => Ok(SubmitOutcome::Rejected {
                reason: err.to_string(),
            }),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub enum UploadMode {
    #[default]
    Ok,
    Fail,
    NoReference,
}

#[derive(Default)]
pub struct FakePhotos {
    mode: Mutex<UploadMode>,
    uploads: Mutex<Vec<String>>,
}

impl FakePhotos {
    pub fn set_mode(&self, mode: UploadMode) {
        *self.mode.lock().unwrap() = mode;
    }

    pub fn uploads(&self) -> Vec<String> {
        self.uploads.lock().unwrap().clone()
    }
}

#[async_trait]
impl PhotoStore for FakePhotos {
    async fn upload_verification_photo(
        &self,
        _image_bytes: Vec<u8>,
        path_hint: &str,
    ) -> Result<Option<PhotoRef>> {
        let mode = *self.mode.lock().unwrap();
        match mode {
            UploadMode::Fail => bail!("storage offline"),
            UploadMode::NoReference => Ok(None),
            UploadMode::Ok => {
                self.uploads.lock().unwrap().push(path_hint.to_string());
                Ok(Some(PhotoRef {
                    public_url: format!("https://photos.test/{path_hint}"),
                }))
            }
        }
    }
}

#[derive(Default)]
pub struct FakeSites {
    fence: Mutex<Option<Geofence>>,
    failing: AtomicBool,
    lookups: AtomicUsize,
}

impl FakeSites {
    pub fn with_fence(fence: Option<Geofence>) -> Self {
        Self {
            fence: Mutex::new(fence),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SiteConfigProvider for FakeSites {
    async fn geofence_for(&self, _staff_id: &str) -> Result<Option<Geofence>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            bail!("site directory unavailable");
        }
        Ok(*self.fence.lock().unwrap())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, Severity)> {
        self.messages.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<(String, Severity)> {
        self.messages.lock().unwrap().last().cloned()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.messages
            .lock()
            .unwrap()
            .push((message.to_string(), severity));
    }
}

/// Hands out a small grey frame from any live stream.
#[derive(Default)]
pub struct CannedCamera {
    denied: AtomicBool,
    next_id: AtomicU64,
    live: AtomicUsize,
    starts: AtomicUsize,
}

impl CannedCamera {
    pub fn deny(&self) {
        self.denied.store(true, Ordering::SeqCst);
    }

    pub fn live_streams(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn starts(&self) -> usize {
        self.starts.load(Ordering::SeqCst)
    }
}

impl Camera for CannedCamera {
    fn start(&self) -> Result<CameraStream, CameraError> {
        if self.denied.load(Ordering::SeqCst) {
            return Err(CameraError::PermissionDenied);
        }
        self.starts.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);
        Ok(CameraStream::new(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    fn capture_frame(&self, _stream: &CameraStream) -> Result<Frame, CameraError> {
        Ok(Frame {
            width: 4,
            height: 4,
            rgb: vec![128; 4 * 4 * 3],
        })
    }

    fn stop(&self, _stream: CameraStream) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Location provider that counts open watches.
#[derive(Default)]
pub struct MockLocation {
    fix: Mutex<Option<Coordinates>>,
    denied: AtomicBool,
    active: AtomicUsize,
}

impl MockLocation {
    pub fn at(coordinates: Coordinates) -> Self {
        Self {
            fix: Mutex::new(Some(coordinates)),
            ..Self::default()
        }
    }

    pub fn move_to(&self, coordinates: Coordinates) {
        *self.fix.lock().unwrap() = Some(coordinates);
    }

    pub fn deny(&self) {
        self.denied.store(true, Ordering::SeqCst);
    }

    pub fn grant(&self) {
        self.denied.store(false, Ordering::SeqCst);
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }
}

impl LocationProvider for MockLocation {
    fn open(&self) -> Result<(), LocationError> {
        if self.denied.load(Ordering::SeqCst) {
            return Err(LocationError::PermissionDenied);
        }
        self.active.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn current_position(&self) -> Result<LocationFix, LocationError> {
        if self.denied.load(Ordering::SeqCst) {
            return Err(LocationError::PermissionDenied);
        }
        match *self.fix.lock().unwrap() {
            Some(coordinates) => Ok(LocationFix {
                coordinates,
                accuracy_meters: Some(8.0),
            }),
            None => Err(LocationError::Unavailable("no fix yet".into())),
        }
    }

    fn close(&self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct Desk {
    pub controller: AttendanceController,
    pub store: Arc<FakeStore>,
    pub photos: Arc<FakePhotos>,
    pub sites: Arc<FakeSites>,
    pub notifier: Arc<RecordingNotifier>,
    pub camera: Arc<CannedCamera>,
    pub location: Arc<MockLocation>,
}

pub struct DeskBuilder {
    fence: Option<Geofence>,
    location: Option<Coordinates>,
    date: NaiveDate,
    today: Option<AttendanceDay>,
    policy: GeofencePolicy,
    camera: Option<Arc<dyn Camera>>,
}

impl DeskBuilder {
    pub fn new() -> Self {
        Self {
            fence: None,
            location: None,
            date: Utc::now().date_naive(),
            today: None,
            policy: GeofencePolicy::Strict,
            camera: None,
        }
    }

    /// Use a different camera than the canned one.
    pub fn camera(mut self, camera: Arc<dyn Camera>) -> Self {
        self.camera = Some(camera);
        self
    }

    pub fn fence(mut self, fence: Geofence) -> Self {
        self.fence = Some(fence);
        self
    }

    pub fn located_at(mut self, coordinates: Coordinates) -> Self {
        self.location = Some(coordinates);
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = date;
        self
    }

    pub fn today(mut self, record: AttendanceDay) -> Self {
        self.today = Some(record);
        self
    }

    pub fn policy(mut self, policy: GeofencePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn build(self) -> Desk {
        let store = Arc::new(FakeStore::default());
        if let Some(record) = &self.today {
            store.seed(record.clone());
        }
        let photos = Arc::new(FakePhotos::default());
        let sites = Arc::new(FakeSites::with_fence(self.fence));
        let notifier = Arc::new(RecordingNotifier::default());
        let camera = Arc::new(CannedCamera::default());
        let location = Arc::new(match self.location {
            Some(coordinates) => MockLocation::at(coordinates),
            None => MockLocation::default(),
        });

        let deps = AttendanceDeps {
            store: store.clone(),
            photos: photos.clone(),
            sites: sites.clone(),
            notifier: notifier.clone(),
            camera: self
                .camera
                .unwrap_or_else(|| camera.clone() as Arc<dyn Camera>),
            sampler: LocationSampler::new(location.clone(), SAMPLE_INTERVAL),
        };

        Desk {
            controller: AttendanceController::new(STAFF, self.date, self.today, deps, self.policy),
            store,
            photos,
            sites,
            notifier,
            camera,
            location,
        }
    }
}

impl Desk {
    /// Start sampling and wait for the first fix to arrive.
    pub async fn locate(&self) {
        self.controller.start_location().await;
        for _ in 0..200 {
            if self.controller.current_location().await.is_some() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("no location sample arrived");
    }
}

pub async fn wait_until(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

pub fn checked_in_record(is_remote: bool) -> AttendanceDay {
    let now = Utc::now();
    AttendanceDay {
        staff_id: STAFF.into(),
        date: now.date_naive(),
        checkin_timestamp: Some(now),
        checkin_status: Some(if is_remote {
            CheckinStatus::Remote
        } else {
            CheckinStatus::OnTime
        }),
        checkout_timestamp: None,
        notes: None,
        mood: None,
        photo_url: Some("https://photos.test/in.jpg".into()),
        checkout_photo_url: None,
        location: Some(site()),
        is_remote,
    }
}

pub fn checked_out_record() -> AttendanceDay {
    let mut record = checked_in_record(false);
    record.checkout_timestamp = Some(Utc::now());
    record.checkout_photo_url = Some("https://photos.test/out.jpg".into());
    record
}
