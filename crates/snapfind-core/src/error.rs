// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Snapfind.

use thiserror::Error;

use crate::types::{AuthorizationState, Resource};

/// Top-level error type for all Snapfind operations.
#[derive(Debug, Error)]
pub enum SnapfindError {
    // -- Permissions --
    #[error("access to the {resource} was not granted ({state:?})")]
    PermissionDenied {
        resource: Resource,
        state: AuthorizationState,
    },

    // -- Capture --
    #[error("no capture device available: {0}")]
    DeviceUnavailable(String),

    #[error("capture configuration rejected: {0}")]
    ConfigurationRejected(String),

    #[error("photo capture failed: {0}")]
    CaptureFailed(String),

    // -- Recognition --
    #[error("text recognition failed: {0}")]
    RecognitionFailed(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("{operation} timed out after {seconds}s")]
    TimedOut { operation: String, seconds: u64 },

    // -- Images --
    #[error("image processing failed: {0}")]
    ImageError(String),

    #[error("no image selected")]
    NoImage,

    // -- Persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // -- Platform bridge --
    #[error("platform bridge error: {0}")]
    Bridge(String),

    #[error("feature not available on this platform")]
    PlatformUnavailable,
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, SnapfindError>;
