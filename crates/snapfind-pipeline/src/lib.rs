// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// snapfind-pipeline — The capture-to-recognition pipeline.
//
// Ties the platform bridge to the vision crate: consent (permission), the
// live camera session (session), picker-based acquisition (source) and the
// per-screen orchestrator that owns the current image and result
// (controller).

pub mod controller;
pub mod permission;
pub mod session;
pub mod source;

pub use controller::ScreenController;
pub use permission::PermissionGate;
pub use session::{CaptureSession, SessionCore};
pub use source::{ImageSource, SourceChoice};
