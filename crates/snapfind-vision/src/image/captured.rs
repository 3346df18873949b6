// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// An acquired image: stored pixels plus the orientation tag they arrived with.

use image::DynamicImage;
use snapfind_core::error::SnapfindError;
use snapfind_core::types::{ImageId, ImageInfo, ImageOrientation, ImageOrigin};

use super::processor::ImageProcessor;

/// Pixels as delivered by the camera or picker, not yet rotated upright.
#[derive(Debug, Clone)]
pub struct CapturedImage {
    pub info: ImageInfo,
    pub pixels: DynamicImage,
}

impl CapturedImage {
    pub fn new(pixels: DynamicImage, origin: ImageOrigin, orientation: ImageOrientation) -> Self {
        Self {
            info: ImageInfo::new(origin, orientation),
            pixels,
        }
    }

    /// Decode encoded bytes (e.g. from a picker).
    pub fn decode(
        data: &[u8],
        origin: ImageOrigin,
        orientation: ImageOrientation,
    ) -> Result<Self, SnapfindError> {
        let pixels = ImageProcessor::from_bytes(data)?.into_dynamic();
        Ok(Self::new(pixels, origin, orientation))
    }

    pub fn id(&self) -> ImageId {
        self.info.id
    }

    pub fn orientation(&self) -> ImageOrientation {
        self.info.orientation
    }

    /// Upright copy of the pixels.
    pub fn normalized(&self) -> DynamicImage {
        ImageProcessor::from_dynamic(self.pixels.clone())
            .apply_orientation(self.info.orientation)
            .into_dynamic()
    }

    /// Width and height once displayed upright.
    pub fn display_dimensions(&self) -> (u32, u32) {
        let (w, h) = (self.pixels.width(), self.pixels.height());
        if self.info.orientation.swaps_dimensions() {
            (h, w)
        } else {
            (w, h)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::GrayImage;

    #[test]
    fn portrait_capture_displays_tall() {
        let landscape_pixels = DynamicImage::ImageLuma8(GrayImage::new(40, 30));
        let captured = CapturedImage::new(
            landscape_pixels,
            ImageOrigin::LiveCapture,
            ImageOrientation::Right,
        );
        assert_eq!(captured.display_dimensions(), (30, 40));
        let upright = captured.normalized();
        assert_eq!((upright.width(), upright.height()), (30, 40));
        // The stored pixels are left untouched.
        assert_eq!(captured.pixels.width(), 40);
    }

    #[test]
    fn each_capture_gets_a_fresh_id() {
        let a = CapturedImage::new(
            DynamicImage::ImageLuma8(GrayImage::new(1, 1)),
            ImageOrigin::Library,
            ImageOrientation::Up,
        );
        let b = a.clone();
        let c = CapturedImage::new(a.pixels.clone(), ImageOrigin::Library, ImageOrientation::Up);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
    }
}
