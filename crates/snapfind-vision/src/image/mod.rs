// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — orientation normalisation, resizing, and acquired images.

pub mod captured;
pub mod processor;

pub use captured::CapturedImage;
pub use processor::ImageProcessor;
