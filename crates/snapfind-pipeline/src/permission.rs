// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Permission gate — asks the OS for camera / photo-library consent once per
// run and remembers the answer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use snapfind_bridge::traits::PermissionProvider;
use snapfind_core::error::{Result, SnapfindError};
use snapfind_core::types::{AuthorizationState, Resource};
use tracing::{debug, info, instrument, warn};

/// Consent checks in front of the camera and photo library.
///
/// A final answer (granted, denied or restricted) is cached for the lifetime
/// of the gate; the user is never prompted twice.
pub struct PermissionGate {
    provider: Arc<dyn PermissionProvider>,
    outcomes: Mutex<HashMap<Resource, AuthorizationState>>,
}

impl PermissionGate {
    pub fn new(provider: Arc<dyn PermissionProvider>) -> Self {
        Self {
            provider,
            outcomes: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve the authorization state for `resource`, prompting the user
    /// when they have not been asked yet.
    #[instrument(skip(self))]
    pub async fn request_authorization(&self, resource: Resource) -> Result<AuthorizationState> {
        if let Some(state) = self.cached(resource) {
            debug!(?state, "Using remembered authorization");
            return Ok(state);
        }

        let provider = Arc::clone(&self.provider);
        let state = tokio::task::spawn_blocking(move || {
            let current = provider.authorization_status(resource);
            if current == AuthorizationState::NotDetermined {
                info!("Prompting user for access");
                provider.request_access(resource)
            } else {
                Ok(current)
            }
        })
        .await
        .map_err(|err| SnapfindError::Bridge(format!("permission prompt stopped: {err}")))??;

        if state.is_terminal() {
            self.outcomes
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(resource, state);
        }
        info!(?state, "Authorization resolved");
        Ok(state)
    }

    /// `Ok` only when access to `resource` is authorized.
    pub async fn ensure(&self, resource: Resource) -> Result<()> {
        let state = self.request_authorization(resource).await?;
        if state.may_proceed() {
            Ok(())
        } else {
            warn!(%resource, ?state, "Access not granted");
            Err(SnapfindError::PermissionDenied { resource, state })
        }
    }

    fn cached(&self, resource: Resource) -> Option<AuthorizationState> {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&resource)
            .copied()
    }
}
