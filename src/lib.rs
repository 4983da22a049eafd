pub mod attendance;
pub mod bridge;
pub mod camera;
pub mod db;
pub mod geo;
pub mod location;
pub mod models;
pub mod notify;
pub mod settings;
pub mod storage;
pub mod utils;

#[cfg(feature = "desktop")]
mod settings_commands;

#[cfg(feature = "desktop")]
pub use desktop::run;
#[cfg(feature = "desktop")]
pub(crate) use desktop::AppState;

#[cfg(feature = "desktop")]
mod desktop {
    use std::sync::Arc;

    use tauri::Manager;

    use crate::attendance::{
        commands::{
            begin_verification, cancel_verification, capture_verification_photo,
            close_attendance_desk, confirm_attendance, get_attendance_state,
            list_attendance_history, list_daily_roll, open_attendance_desk, report_camera_frame,
            report_camera_status, report_location, report_location_status,
            retake_verification_photo, start_location_sampling,
        },
        DeskRegistry,
    };
    use crate::bridge::{WebviewCamera, WebviewLocation};
    use crate::db::{Database, SqliteAttendanceStore};
    use crate::notify::EventNotifier;
    use crate::settings::SettingsStore;
    use crate::settings_commands::{assign_staff_site, get_site_settings, update_site_settings};
    use crate::storage::LocalPhotoStore;

    pub(crate) struct AppState {
        pub(crate) db: Database,
        pub(crate) settings: Arc<SettingsStore>,
        pub(crate) store: Arc<SqliteAttendanceStore>,
        pub(crate) photos: Arc<LocalPhotoStore>,
        pub(crate) notifier: Arc<EventNotifier>,
        pub(crate) camera: Arc<WebviewCamera>,
        pub(crate) location: Arc<WebviewLocation>,
        pub(crate) desks: DeskRegistry,
    }

    #[cfg_attr(mobile, tauri::mobile_entry_point)]
    pub fn run() {
        crate::utils::init_logging();

        log::info!("Staff desk starting up...");

        tauri::Builder::default()
            .plugin(tauri_plugin_opener::init())
            .setup(|app| {
                let result = (|| -> anyhow::Result<()> {
                    let app_data_dir = app
                        .path()
                        .app_data_dir()
                        .map_err(|err| anyhow::anyhow!(err))?;
                    std::fs::create_dir_all(&app_data_dir)?;

                    let database = Database::new(app_data_dir.join("staffdesk.sqlite3"))?;
                    let settings =
                        Arc::new(SettingsStore::new(app_data_dir.join("settings.json"))?);
                    let photos = Arc::new(LocalPhotoStore::new(app_data_dir.join("photos"))?);
                    let store = Arc::new(SqliteAttendanceStore::new(
                        database.clone(),
                        Arc::clone(&settings),
                    ));

                    app.manage(AppState {
                        db: database,
                        settings,
                        store,
                        photos,
                        notifier: Arc::new(EventNotifier::new(app.handle().clone())),
                        camera: Arc::new(WebviewCamera::new()),
                        location: Arc::new(WebviewLocation::new()),
                        desks: DeskRegistry::new(),
                    });

                    Ok(())
                })();

                result.map_err(|err| err.into())
            })
            .invoke_handler(tauri::generate_handler![
                open_attendance_desk,
                close_attendance_desk,
                get_attendance_state,
                start_location_sampling,
                report_location,
                report_location_status,
                report_camera_status,
                report_camera_frame,
                begin_verification,
                capture_verification_photo,
                retake_verification_photo,
                cancel_verification,
                confirm_attendance,
                list_attendance_history,
                list_daily_roll,
                get_site_settings,
                update_site_settings,
                assign_staff_site,
            ])
            .run(tauri::generate_context!())
            .expect("error while running tauri application");
    }
}
