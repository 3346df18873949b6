// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// snapfind-vision — Image handling for the Snapfind pipeline.
//
// Provides orientation normalisation and resizing (image), black-and-white
// preprocessing (scan), the OCR recogniser with progress and cancellation
// (ocr), and bounding-box overlays (render).

pub mod image;
pub mod ocr;
pub mod render;
pub mod scan;

pub use self::image::captured::CapturedImage;
pub use self::image::processor::ImageProcessor;
pub use ocr::recognizer::{RecognitionOptions, RecognitionTask, Recognizer};
pub use render::ResultRenderer;
pub use scan::binarize::Binarizer;

#[cfg(feature = "ocr")]
pub use ocr::ocrs_backend::OcrsBackend;
