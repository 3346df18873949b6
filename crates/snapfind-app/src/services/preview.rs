// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Turns rendered images into something the webview can display.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use image::DynamicImage;
use snapfind_core::error::Result;
use snapfind_vision::ImageProcessor;

/// PNG encoding of `image`.
pub fn encode_png(image: &DynamicImage) -> Result<Vec<u8>> {
    ImageProcessor::from_dynamic(image.clone()).to_png_bytes()
}

/// `data:` URL for an `img` element.
pub fn data_url(image: &DynamicImage) -> Result<String> {
    let png = encode_png(image)?;
    Ok(format!("data:image/png;base64,{}", STANDARD.encode(png)))
}
