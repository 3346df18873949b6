// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Central service layer — loads settings, picks the OCR backend, wires the
// platform bridge into a screen controller and hands all of it to the UI.
//
// The controller is async and not `Sync`, so it sits behind a tokio mutex;
// recognition itself runs outside the lock so the Cancel button stays live.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use snapfind_bridge::traits::{PermissionProvider, PlatformBridge};
use snapfind_core::config::AppConfig;
use snapfind_core::error::Result;
use snapfind_core::types::{AuthorizationState, Resource};
use snapfind_pipeline::ScreenController;
use snapfind_vision::ocr::{OcrBackend, UnavailableBackend};
use snapfind_vision::{RecognitionOptions, Recognizer};
use tracing::{info, warn};

use super::data_dir;
use super::desktop_picker::DesktopPicker;

/// Shared application services accessible from all Dioxus components via
/// `use_context::<AppServices>()`.
#[derive(Clone)]
pub struct AppServices {
    controller: Arc<tokio::sync::Mutex<ScreenController>>,
    config: Arc<Mutex<AppConfig>>,
    data_dir: PathBuf,
    platform: String,
}

impl AppServices {
    /// Initialise all services in the default data directory. Call once at
    /// app startup.
    pub fn init() -> Self {
        Self::init_at(&data_dir::data_dir())
    }

    pub fn init_at(dir: &Path) -> Self {
        info!(path = %dir.display(), "initialising app services");
        let config = AppConfig::load(dir).unwrap_or_default();

        let bridge = snapfind_bridge::platform_bridge();
        let camera = match bridge.camera() {
            Ok(camera) => Some(camera),
            Err(e) => {
                info!(reason = %e, "live capture unavailable");
                None
            }
        };
        let platform = bridge.platform_name().to_string();

        let recognizer = Recognizer::new(ocr_backend(), RecognitionOptions::from_config(&config));
        info!(backend = recognizer.backend_name(), "OCR backend selected");

        let controller = ScreenController::new(
            Arc::new(BridgePermissions(bridge)),
            Arc::new(DesktopPicker),
            camera,
            recognizer,
            &config,
        );

        Self {
            controller: Arc::new(tokio::sync::Mutex::new(controller)),
            config: Arc::new(Mutex::new(config)),
            data_dir: dir.to_path_buf(),
            platform,
        }
    }

    pub fn controller(&self) -> Arc<tokio::sync::Mutex<ScreenController>> {
        Arc::clone(&self.controller)
    }

    /// Get a clone of the current config.
    pub fn config(&self) -> AppConfig {
        self.config
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Persist `config` and apply it to the controller.
    pub async fn save_config(&self, config: &AppConfig) -> Result<()> {
        config.persist(&self.data_dir)?;
        *self.config.lock().unwrap_or_else(PoisonError::into_inner) = config.clone();
        self.controller.lock().await.apply_config(config);
        info!("settings saved");
        Ok(())
    }

    pub fn platform_name(&self) -> &str {
        &self.platform
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(feature = "ocr")]
fn ocr_backend() -> Arc<dyn OcrBackend> {
    match snapfind_vision::OcrsBackend::with_defaults() {
        Ok(backend) => Arc::new(backend),
        Err(e) => {
            warn!(error = %e, "OCR models unavailable; text recognition disabled");
            Arc::new(UnavailableBackend)
        }
    }
}

#[cfg(not(feature = "ocr"))]
fn ocr_backend() -> Arc<dyn OcrBackend> {
    warn!("built without the `ocr` feature; text recognition disabled");
    Arc::new(UnavailableBackend)
}

/// Consent half of the platform bridge.
struct BridgePermissions(Arc<dyn PlatformBridge>);

impl PermissionProvider for BridgePermissions {
    fn authorization_status(&self, resource: Resource) -> AuthorizationState {
        self.0.authorization_status(resource)
    }

    fn request_access(&self, resource: Resource) -> Result<AuthorizationState> {
        self.0.request_access(resource)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use snapfind_core::types::Granularity;

    #[test]
    fn fresh_directory_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let svc = AppServices::init_at(dir.path());
        assert_eq!(svc.config(), AppConfig::default());
        assert_eq!(svc.platform_name(), "Desktop (stub)");
    }

    #[tokio::test]
    async fn saved_settings_survive_restart() {
        let dir = tempfile::tempdir().unwrap();
        let svc = AppServices::init_at(dir.path());

        let config = AppConfig {
            overlay_granularity: Granularity::Line,
            case_sensitive_search: true,
            ..svc.config()
        };
        svc.save_config(&config).await.unwrap();
        assert_eq!(svc.config(), config);

        let reopened = AppServices::init_at(dir.path());
        assert_eq!(reopened.config(), config);
    }

    #[tokio::test]
    async fn desktop_controller_has_no_live_camera() {
        let dir = tempfile::tempdir().unwrap();
        let svc = AppServices::init_at(dir.path());
        let controller = svc.controller();
        let mut screen = controller.lock().await;
        screen.enter().await.unwrap();
        assert!(!screen.has_live_camera());
    }
}
