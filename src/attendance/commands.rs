//! Tauri commands for the attendance desk and the webview capability bridge.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tauri::State;

use crate::{
    bridge::PermissionStatus,
    camera::{Camera, Frame},
    location::{LocationFix, LocationProvider, LocationSampler},
    models::{AttendanceDay, Coordinates, Mood},
    AppState,
};

use super::{AttendanceController, AttendanceDeps, AttendanceSnapshot, PhotoPreview};

fn local_today(state: &AppState) -> NaiveDate {
    Utc::now()
        .with_timezone(&state.settings.utc_offset())
        .date_naive()
}

async fn open_desk(
    state: &AppState,
    staff_id: &str,
    today: NaiveDate,
) -> anyhow::Result<AttendanceController> {
    let record = state.db.get_attendance_day(staff_id, today).await?;

    let deps = AttendanceDeps {
        store: state.store.clone(),
        photos: state.photos.clone(),
        sites: state.settings.clone(),
        notifier: state.notifier.clone(),
        camera: state.camera.clone() as Arc<dyn Camera>,
        sampler: LocationSampler::new(
            state.location.clone() as Arc<dyn LocationProvider>,
            state.settings.location_interval(),
        ),
    };
    Ok(AttendanceController::new(
        staff_id,
        today,
        record,
        deps,
        state.settings.geofence_policy(),
    ))
}

async fn desk(state: &AppState, staff_id: &str) -> Result<AttendanceController, String> {
    let today = local_today(state);
    state
        .desks
        .get_or_open(staff_id, today, || open_desk(state, staff_id, today))
        .await
        .map_err(|e| e.to_string())
}

/// Like `desk`, but refuses to open one that was never opened.
async fn existing_desk(state: &AppState, staff_id: &str) -> Result<AttendanceController, String> {
    if !state.desks.is_open(staff_id).await {
        return Err(format!("no attendance desk open for {staff_id}"));
    }
    desk(state, staff_id).await
}

#[tauri::command]
pub async fn open_attendance_desk(
    state: State<'_, AppState>,
    staff_id: String,
) -> Result<AttendanceSnapshot, String> {
    let controller = desk(&state, &staff_id).await?;
    controller.start_location().await;
    Ok(controller.get_snapshot().await)
}

#[tauri::command]
pub async fn close_attendance_desk(
    state: State<'_, AppState>,
    staff_id: String,
) -> Result<(), String> {
    state
        .desks
        .close(&staff_id)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_attendance_state(
    state: State<'_, AppState>,
    staff_id: String,
) -> Result<AttendanceSnapshot, String> {
    let controller = desk(&state, &staff_id).await?;
    Ok(controller.get_snapshot().await)
}

#[tauri::command]
pub async fn start_location_sampling(
    state: State<'_, AppState>,
    staff_id: String,
) -> Result<(), String> {
    desk(&state, &staff_id).await?.start_location().await;
    Ok(())
}

#[tauri::command]
pub async fn report_location(
    state: State<'_, AppState>,
    latitude: f64,
    longitude: f64,
    accuracy: Option<f64>,
) -> Result<(), String> {
    let coordinates = Coordinates::new(latitude, longitude);
    if !coordinates.is_valid() {
        return Err(format!("invalid coordinates ({latitude}, {longitude})"));
    }
    state.location.push_fix(LocationFix {
        coordinates,
        accuracy_meters: accuracy,
    });
    Ok(())
}

#[tauri::command]
pub async fn report_location_status(
    state: State<'_, AppState>,
    status: PermissionStatus,
) -> Result<(), String> {
    state.location.set_status(status);
    Ok(())
}

#[tauri::command]
pub async fn report_camera_status(
    state: State<'_, AppState>,
    status: PermissionStatus,
) -> Result<(), String> {
    state.camera.set_status(status);
    Ok(())
}

#[tauri::command]
pub async fn report_camera_frame(
    state: State<'_, AppState>,
    width: u32,
    height: u32,
    rgb: Vec<u8>,
) -> Result<(), String> {
    state
        .camera
        .submit_frame(Frame { width, height, rgb })
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn begin_verification(
    state: State<'_, AppState>,
    staff_id: String,
) -> Result<(), String> {
    desk(&state, &staff_id)
        .await?
        .begin_verification()
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn capture_verification_photo(
    state: State<'_, AppState>,
    staff_id: String,
) -> Result<PhotoPreview, String> {
    existing_desk(&state, &staff_id)
        .await?
        .capture_photo()
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn retake_verification_photo(
    state: State<'_, AppState>,
    staff_id: String,
) -> Result<(), String> {
    existing_desk(&state, &staff_id)
        .await?
        .retake_photo()
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn cancel_verification(
    state: State<'_, AppState>,
    staff_id: String,
) -> Result<(), String> {
    let controller = existing_desk(&state, &staff_id).await?;
    controller.cancel_verification().await;
    controller.discard_photo().await;
    Ok(())
}

#[tauri::command]
pub async fn confirm_attendance(
    state: State<'_, AppState>,
    staff_id: String,
    notes: Option<String>,
    is_remote: bool,
    mood: Option<Mood>,
) -> Result<AttendanceDay, String> {
    existing_desk(&state, &staff_id)
        .await?
        .confirm(notes, is_remote, mood)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn list_attendance_history(
    state: State<'_, AppState>,
    staff_id: String,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<AttendanceDay>, String> {
    if from > to {
        return Err(format!("range start {from} is after end {to}"));
    }
    state
        .db
        .list_attendance(&staff_id, from, to)
        .await
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn list_daily_roll(
    state: State<'_, AppState>,
    date: NaiveDate,
) -> Result<Vec<AttendanceDay>, String> {
    state
        .db
        .list_attendance_for_date(date)
        .await
        .map_err(|e| e.to_string())
}
