// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Stub bridge for desktop/CI builds where native mobile APIs are unavailable.
//
// Desktop has no consent prompts, so both resources report `Authorized`.
// There is no camera and no system picker; the desktop shell supplies its own
// file-dialog picker.

use snapfind_core::error::{Result, SnapfindError};
use snapfind_core::types::{AuthorizationState, Resource};

use crate::traits::*;

/// No-op bridge returned on non-mobile platforms.
pub struct StubBridge;

impl PlatformBridge for StubBridge {
    fn platform_name(&self) -> &str {
        "Desktop (stub)"
    }

    fn camera(&self) -> Result<Box<dyn CameraHardware>> {
        tracing::warn!("PlatformBridge::camera called on stub bridge");
        Err(SnapfindError::DeviceUnavailable(
            "desktop builds have no camera bridge".into(),
        ))
    }
}

impl PermissionProvider for StubBridge {
    fn authorization_status(&self, _resource: Resource) -> AuthorizationState {
        AuthorizationState::Authorized
    }

    fn request_access(&self, _resource: Resource) -> Result<AuthorizationState> {
        Ok(AuthorizationState::Authorized)
    }
}

impl ImagePicker for StubBridge {
    fn is_source_available(&self, _source: PickerSource) -> bool {
        false
    }

    fn pick_image(&self, _source: PickerSource) -> Result<Option<PickedImage>> {
        tracing::warn!("ImagePicker::pick_image called on stub bridge");
        Err(SnapfindError::PlatformUnavailable)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_has_no_camera() {
        let bridge = StubBridge;
        assert!(matches!(
            bridge.camera(),
            Err(SnapfindError::DeviceUnavailable(_))
        ));
        assert!(!bridge.is_source_available(PickerSource::Camera));
    }

    #[test]
    fn stub_grants_permissions() {
        let bridge = StubBridge;
        assert!(bridge.authorization_status(Resource::Camera).may_proceed());
        assert_eq!(
            bridge.request_access(Resource::PhotoLibrary).expect("request"),
            AuthorizationState::Authorized
        );
    }
}
