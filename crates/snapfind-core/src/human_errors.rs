// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable error messages.
//
// Every pipeline error is mapped to plain English with a clear suggestion so
// the UI can show a dialog instead of silently aborting.

use crate::error::SnapfindError;
use crate::types::{AuthorizationState, Resource};

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Hiccup; trying again may well work.
    Transient,
    /// The user must do something (grant access, pick another photo).
    ActionRequired,
    /// Cannot be fixed from inside the app.
    Permanent,
}

/// A human-readable error with plain English message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether offering a "Try again" button makes sense.
    pub retriable: bool,
    pub severity: Severity,
}

/// Convert a `SnapfindError` into a `HumanError`.
pub fn humanize_error(err: &SnapfindError) -> HumanError {
    match err {
        SnapfindError::PermissionDenied { resource, state } => humanize_permission(*resource, *state),

        SnapfindError::DeviceUnavailable(_) => HumanError {
            message: "This device has no camera we can use.".into(),
            suggestion: "Choose an existing photo instead.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        SnapfindError::ConfigurationRejected(detail) => HumanError {
            message: "The camera couldn't be set up.".into(),
            suggestion: format!(
                "Close other apps that may be using the camera, then reopen this screen. ({detail})"
            ),
            retriable: true,
            severity: Severity::Transient,
        },

        SnapfindError::CaptureFailed(detail) => HumanError {
            message: "The photo couldn't be taken.".into(),
            suggestion: format!("Hold the device steady and try again. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },

        SnapfindError::RecognitionFailed(detail) => HumanError {
            message: "We couldn't read any text in this photo.".into(),
            suggestion: format!(
                "Try a sharper photo with good lighting and the text filling the frame. ({detail})"
            ),
            retriable: true,
            severity: Severity::ActionRequired,
        },

        SnapfindError::Cancelled => HumanError {
            message: "Stopped.".into(),
            suggestion: "Tap Find Text to start again.".into(),
            retriable: true,
            severity: Severity::Transient,
        },

        SnapfindError::TimedOut { operation, seconds } => HumanError {
            message: "That took too long.".into(),
            suggestion: format!(
                "The {operation} step gave up after {seconds} seconds. Try a smaller or clearer photo."
            ),
            retriable: true,
            severity: Severity::Transient,
        },

        SnapfindError::ImageError(detail) => HumanError {
            message: "This picture couldn't be opened.".into(),
            suggestion: format!("Try a JPEG or PNG photo instead. ({detail})"),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        SnapfindError::NoImage => HumanError {
            message: "No photo selected.".into(),
            suggestion: "Take a photo or choose one from your library first.".into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        SnapfindError::Io(e) => HumanError {
            message: "A file couldn't be read or written.".into(),
            suggestion: format!("Check that there is free storage space. ({e})"),
            retriable: true,
            severity: Severity::Transient,
        },

        SnapfindError::Serialization(_) => HumanError {
            message: "Your settings file is damaged.".into(),
            suggestion: "Default settings will be used. Change them again in Settings.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        SnapfindError::Bridge(detail) => HumanError {
            message: "Something went wrong talking to the system.".into(),
            suggestion: format!("Try again. ({detail})"),
            retriable: true,
            severity: Severity::Transient,
        },

        SnapfindError::PlatformUnavailable => HumanError {
            message: "This isn't available on this device.".into(),
            suggestion: "Choose an existing photo instead.".into(),
            retriable: false,
            severity: Severity::Permanent,
        },
    }
}

fn humanize_permission(resource: Resource, state: AuthorizationState) -> HumanError {
    let place = match resource {
        Resource::Camera => "camera",
        Resource::PhotoLibrary => "photos",
    };
    match state {
        AuthorizationState::Restricted => HumanError {
            message: format!("Access to your {place} is blocked on this device."),
            suggestion: "A device policy (such as parental controls) prevents access. Ask the device owner."
                .into(),
            retriable: false,
            severity: Severity::Permanent,
        },
        _ => HumanError {
            message: format!("Snapfind isn't allowed to use your {place}."),
            suggestion: format!("Open Settings, find Snapfind, and turn on {place} access."),
            retriable: false,
            severity: Severity::ActionRequired,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn denied_camera_is_action_required() {
        let err = SnapfindError::PermissionDenied {
            resource: Resource::Camera,
            state: AuthorizationState::Denied,
        };
        let human = humanize_error(&err);
        assert_eq!(human.severity, Severity::ActionRequired);
        assert!(human.message.contains("camera"));
        assert!(!human.retriable);
    }

    #[test]
    fn restricted_library_is_permanent() {
        let err = SnapfindError::PermissionDenied {
            resource: Resource::PhotoLibrary,
            state: AuthorizationState::Restricted,
        };
        assert_eq!(humanize_error(&err).severity, Severity::Permanent);
    }

    #[test]
    fn capture_failure_is_retriable() {
        let human = humanize_error(&SnapfindError::CaptureFailed("phase two error".into()));
        assert!(human.retriable);
        assert_eq!(human.severity, Severity::Transient);
    }

    #[test]
    fn timeout_mentions_duration() {
        let err = SnapfindError::TimedOut {
            operation: "recognition".into(),
            seconds: 60,
        };
        assert!(humanize_error(&err).suggestion.contains("60 seconds"));
    }
}
