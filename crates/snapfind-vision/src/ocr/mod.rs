// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Optical character recognition — backend seam, recogniser, and the optional
// `ocrs` engine.

pub mod engine;
pub mod recognizer;

#[cfg(feature = "ocr")]
pub mod ocrs_backend;

pub use engine::{OcrBackend, RecognitionEvent, RecognitionMonitor, UnavailableBackend};
pub use recognizer::{RecognitionOptions, RecognitionTask, Recognizer};
