// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image processor — decode, orientation normalisation, downscaling and
// encoding. Operates on in-memory images using the `image` crate.

use image::{DynamicImage, ImageFormat};
use snapfind_core::error::SnapfindError;
use snapfind_core::types::ImageOrientation;
use tracing::{debug, info, instrument};

/// Image processing pipeline operating on a single in-memory image.
///
/// Each method consumes `self` and returns a new `ImageProcessor` wrapping the
/// transformed image, enabling method chaining:
///
/// ```ignore
/// let upright = ImageProcessor::from_bytes(&jpeg)?
///     .apply_orientation(ImageOrientation::Right)
///     .limit_dimension(2048)
///     .into_dynamic();
/// ```
pub struct ImageProcessor {
    /// The current working image.
    image: DynamicImage,
}

impl ImageProcessor {
    // -- Construction ---------------------------------------------------------

    /// Create a processor from raw encoded bytes (JPEG, PNG, etc.).
    #[instrument(skip(data), fields(data_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self, SnapfindError> {
        let img = image::load_from_memory(data).map_err(|err| {
            SnapfindError::ImageError(format!("failed to decode image: {}", err))
        })?;
        debug!(
            width = img.width(),
            height = img.height(),
            "Image decoded from bytes"
        );
        Ok(Self { image: img })
    }

    /// Wrap an already-decoded `DynamicImage`.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        Self { image }
    }

    // -- Accessors ------------------------------------------------------------

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn into_dynamic(self) -> DynamicImage {
        self.image
    }

    // -- Transformations ------------------------------------------------------

    /// Rotate and/or mirror so that the pixels display upright.
    ///
    /// Rotations by multiples of 90° and flips are lossless.
    #[instrument(skip(self))]
    pub fn apply_orientation(self, orientation: ImageOrientation) -> Self {
        let image = match orientation {
            ImageOrientation::Up => return self,
            ImageOrientation::UpMirrored => self.image.fliph(),
            ImageOrientation::Down => self.image.rotate180(),
            ImageOrientation::DownMirrored => self.image.flipv(),
            ImageOrientation::Left => self.image.rotate270(),
            ImageOrientation::LeftMirrored => self.image.rotate270().fliph(),
            ImageOrientation::Right => self.image.rotate90(),
            ImageOrientation::RightMirrored => self.image.rotate90().fliph(),
        };
        debug!(
            width = image.width(),
            height = image.height(),
            "Orientation applied"
        );
        Self { image }
    }

    /// Shrink the image so that its longest edge is at most `max_dimension`,
    /// preserving aspect ratio. Images already within the limit are untouched.
    #[instrument(skip(self))]
    pub fn limit_dimension(self, max_dimension: u32) -> Self {
        let longest = self.image.width().max(self.image.height());
        if max_dimension == 0 || longest <= max_dimension {
            return self;
        }
        info!(
            from_w = self.image.width(),
            from_h = self.image.height(),
            max_dimension,
            "Downscaling image"
        );
        let resized = self.image.resize(
            max_dimension,
            max_dimension,
            image::imageops::FilterType::Lanczos3,
        );
        Self { image: resized }
    }

    // -- Output ---------------------------------------------------------------

    /// Encode the current image as PNG bytes.
    pub fn to_png_bytes(&self) -> Result<Vec<u8>, SnapfindError> {
        encode_to_format(&self.image, ImageFormat::Png)
    }
}

/// Encode a `DynamicImage` into the specified format, returning the raw bytes.
fn encode_to_format(image: &DynamicImage, format: ImageFormat) -> Result<Vec<u8>, SnapfindError> {
    let mut buffer = Vec::new();
    let mut cursor = std::io::Cursor::new(&mut buffer);
    image
        .write_to(&mut cursor, format)
        .map_err(|err| SnapfindError::ImageError(format!("image encoding failed: {}", err)))?;
    Ok(buffer)
}
