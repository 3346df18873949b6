// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image source — the "Take Photo / Choose Existing / Cancel" choice backed by
// the system picker.

use std::sync::Arc;

use snapfind_bridge::traits::{ImagePicker, PickerSource};
use snapfind_core::error::{Result, SnapfindError};
use snapfind_core::types::{ImageOrigin, Resource};
use snapfind_vision::CapturedImage;
use tracing::{debug, info, instrument};

/// One entry of the acquisition menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceChoice {
    TakePhoto,
    ChooseExisting,
    Cancel,
}

impl SourceChoice {
    pub fn label(self) -> &'static str {
        match self {
            Self::TakePhoto => "Take Photo",
            Self::ChooseExisting => "Choose Existing",
            Self::Cancel => "Cancel",
        }
    }

    /// Consent needed before presenting this choice.
    pub fn required_resource(self) -> Option<Resource> {
        match self {
            Self::TakePhoto => Some(Resource::Camera),
            Self::ChooseExisting => Some(Resource::PhotoLibrary),
            Self::Cancel => None,
        }
    }

    fn picker_source(self) -> Option<(PickerSource, ImageOrigin)> {
        match self {
            Self::TakePhoto => Some((PickerSource::Camera, ImageOrigin::CameraPicker)),
            Self::ChooseExisting => Some((PickerSource::PhotoLibrary, ImageOrigin::Library)),
            Self::Cancel => None,
        }
    }
}

/// Acquires images through the platform picker.
#[derive(Clone)]
pub struct ImageSource {
    picker: Arc<dyn ImagePicker>,
}

impl ImageSource {
    pub fn new(picker: Arc<dyn ImagePicker>) -> Self {
        Self { picker }
    }

    /// Menu entries for this device. "Take Photo" only appears when a
    /// camera can be presented.
    pub fn options(&self) -> Vec<SourceChoice> {
        let mut options = Vec::with_capacity(3);
        if self.picker.is_source_available(PickerSource::Camera) {
            options.push(SourceChoice::TakePhoto);
        }
        options.push(SourceChoice::ChooseExisting);
        options.push(SourceChoice::Cancel);
        options
    }

    /// Present the picker for `choice` and decode the selection.
    ///
    /// `Ok(None)` when the user backs out at any point.
    #[instrument(skip(self))]
    pub async fn acquire(&self, choice: SourceChoice) -> Result<Option<CapturedImage>> {
        let Some((source, origin)) = choice.picker_source() else {
            debug!("Acquisition cancelled from menu");
            return Ok(None);
        };
        if !self.picker.is_source_available(source) {
            return Err(SnapfindError::DeviceUnavailable(format!(
                "{} is not available on this device",
                choice.label()
            )));
        }

        let picker = Arc::clone(&self.picker);
        let picked = tokio::task::spawn_blocking(move || -> Result<Option<CapturedImage>> {
            let Some(picked) = picker.pick_image(source)? else {
                return Ok(None);
            };
            let image = CapturedImage::decode(&picked.data, origin, picked.orientation)?;
            Ok(Some(image))
        })
        .await
        .map_err(|err| SnapfindError::Bridge(format!("image picker stopped: {err}")))??;

        match &picked {
            Some(image) => info!(
                image_id = %image.id(),
                orientation = ?image.orientation(),
                "Image acquired"
            ),
            None => info!("Picker dismissed without a selection"),
        }
        Ok(picked)
    }
}
