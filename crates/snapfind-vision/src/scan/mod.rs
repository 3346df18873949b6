// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognition preprocessing — reduce photos to black and white.

pub mod binarize;

pub use binarize::Binarizer;
