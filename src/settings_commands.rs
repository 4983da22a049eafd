//! Tauri commands for site and shift settings.

use tauri::State;

use crate::{settings::DeskSettings, AppState};

#[tauri::command]
pub async fn get_site_settings(state: State<'_, AppState>) -> Result<DeskSettings, String> {
    Ok(state.settings.snapshot())
}

/// Applies to desks opened after the update; open desks keep their policy and interval.
#[tauri::command]
pub async fn update_site_settings(
    state: State<'_, AppState>,
    settings: DeskSettings,
) -> Result<DeskSettings, String> {
    state
        .settings
        .update(settings)
        .map_err(|e| e.to_string())?;
    Ok(state.settings.snapshot())
}

#[tauri::command]
pub async fn assign_staff_site(
    state: State<'_, AppState>,
    staff_id: String,
    site_id: String,
) -> Result<(), String> {
    state
        .settings
        .assign_staff(&staff_id, &site_id)
        .map_err(|e| e.to_string())
}
