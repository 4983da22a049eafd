use log::{error, info};

use crate::attendance::{Notifier, Severity};

/// Sends desk notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        match severity {
            Severity::Success | Severity::Info => info!("[{severity:?}] {message}"),
            Severity::Error => error!("{message}"),
        }
    }
}

#[cfg(feature = "desktop")]
pub use desktop::EventNotifier;

#[cfg(feature = "desktop")]
mod desktop {
    use serde::Serialize;
    use tauri::{AppHandle, Emitter};

    use crate::attendance::{Notifier, Severity};

    #[derive(Serialize, Clone)]
    #[serde(rename_all = "camelCase")]
    struct NotificationEvent {
        message: String,
        severity: Severity,
    }

    /// Emits `attendance-notification` events for the webview toast layer.
    pub struct EventNotifier {
        app_handle: AppHandle,
    }

    impl EventNotifier {
        pub fn new(app_handle: AppHandle) -> Self {
            Self { app_handle }
        }
    }

    impl Notifier for EventNotifier {
        fn notify(&self, message: &str, severity: Severity) {
            super::LogNotifier.notify(message, severity);
            let _ = self.app_handle.emit(
                "attendance-notification",
                NotificationEvent {
                    message: message.to_string(),
                    severity,
                },
            );
        }
    }
}
