// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Desktop image picker — a native file dialog standing in for the photo
// library. Desktop has no camera sheet.

use std::io::Cursor;

use image::metadata::Orientation;
use image::{ImageDecoder, ImageReader};
use snapfind_bridge::traits::{ImagePicker, PickedImage, PickerSource};
use snapfind_core::error::{Result, SnapfindError};
use snapfind_core::types::ImageOrientation;
use tracing::info;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "tiff", "tif", "bmp", "webp"];

pub struct DesktopPicker;

impl ImagePicker for DesktopPicker {
    fn is_source_available(&self, source: PickerSource) -> bool {
        matches!(source, PickerSource::PhotoLibrary)
    }

    fn pick_image(&self, source: PickerSource) -> Result<Option<PickedImage>> {
        if source == PickerSource::Camera {
            return Err(SnapfindError::PlatformUnavailable);
        }

        let Some(path) = rfd::FileDialog::new()
            .set_title("Choose Existing")
            .add_filter("Images", IMAGE_EXTENSIONS)
            .pick_file()
        else {
            return Ok(None);
        };

        let data = std::fs::read(&path)?;
        let orientation = embedded_orientation(&data);
        info!(path = %path.display(), bytes = data.len(), ?orientation, "image chosen");
        Ok(Some(PickedImage { data, orientation }))
    }
}

/// Orientation recorded in the file's metadata (EXIF), `Up` when absent.
pub fn embedded_orientation(data: &[u8]) -> ImageOrientation {
    let orientation = ImageReader::new(Cursor::new(data))
        .with_guessed_format()
        .ok()
        .and_then(|reader| reader.into_decoder().ok())
        .and_then(|mut decoder| decoder.orientation().ok());

    match orientation {
        Some(Orientation::Rotate90) => ImageOrientation::Right,
        Some(Orientation::Rotate180) => ImageOrientation::Down,
        Some(Orientation::Rotate270) => ImageOrientation::Left,
        Some(Orientation::FlipHorizontal) => ImageOrientation::UpMirrored,
        Some(Orientation::FlipVertical) => ImageOrientation::DownMirrored,
        Some(Orientation::Rotate90FlipH) => ImageOrientation::RightMirrored,
        Some(Orientation::Rotate270FlipH) => ImageOrientation::LeftMirrored,
        Some(Orientation::NoTransforms) | None => ImageOrientation::Up,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn desktop_offers_library_only() {
        assert!(DesktopPicker.is_source_available(PickerSource::PhotoLibrary));
        assert!(!DesktopPicker.is_source_available(PickerSource::Camera));
        assert!(matches!(
            DesktopPicker.pick_image(PickerSource::Camera),
            Err(SnapfindError::PlatformUnavailable)
        ));
    }

    #[test]
    fn files_without_metadata_are_upright() {
        let png = crate::services::preview::encode_png(&image::DynamicImage::new_rgb8(3, 2))
            .expect("encode");
        assert_eq!(embedded_orientation(&png), ImageOrientation::Up);
        assert_eq!(embedded_orientation(b"garbage"), ImageOrientation::Up);
    }
}
