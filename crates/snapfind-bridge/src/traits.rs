// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-agnostic trait definitions for native capabilities.
//
// Each trait mirrors one OS collaborator of the capture-to-recognition
// pipeline. Implementations are free to block: the pipeline calls them from
// background workers, never from the interactive thread.

use std::sync::mpsc::Sender;

use snapfind_core::error::Result;
use snapfind_core::types::{AuthorizationState, ImageOrientation, Resource, VideoOrientation};

/// Unified bridge that groups all native capabilities.
pub trait PlatformBridge: PermissionProvider + ImagePicker + Send + Sync {
    /// Human-readable platform name (e.g. "iOS 17", "Android 14").
    fn platform_name(&self) -> &str;

    /// Open a fresh handle to the camera hardware.
    fn camera(&self) -> Result<Box<dyn CameraHardware>>;
}

/// Camera and photo-library consent.
pub trait PermissionProvider: Send + Sync {
    /// Current status without prompting.
    fn authorization_status(&self, resource: Resource) -> AuthorizationState;

    /// Show the OS consent prompt and block until the user answers.
    fn request_access(&self, resource: Resource) -> Result<AuthorizationState>;
}

/// Where the system picker gets its image from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickerSource {
    Camera,
    PhotoLibrary,
}

/// An image handed back by the system picker.
#[derive(Debug, Clone)]
pub struct PickedImage {
    /// Encoded image bytes (JPEG, PNG, HEIF converted to JPEG, ...).
    pub data: Vec<u8>,
    /// Orientation the platform reported for the image.
    pub orientation: ImageOrientation,
}

/// System image picker (camera sheet or photo library).
pub trait ImagePicker: Send + Sync {
    /// Whether the given source can be presented on this device.
    fn is_source_available(&self, source: PickerSource) -> bool;

    /// Present the picker and block until the user finishes.
    /// Returns Ok(None) if the user cancelled.
    fn pick_image(&self, source: PickerSource) -> Result<Option<PickedImage>>;
}

// ---------------------------------------------------------------------------
// Camera hardware
// ---------------------------------------------------------------------------

/// A physical capture device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureDevice {
    pub unique_id: String,
    pub name: String,
}

/// Input node wrapping a [`CaptureDevice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInput {
    pub device: CaptureDevice,
}

/// Still-photo output node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoOutput {
    pub high_resolution_capture: bool,
    pub live_photo_capture: bool,
}

impl Default for PhotoOutput {
    fn default() -> Self {
        Self {
            high_resolution_capture: true,
            live_photo_capture: false,
        }
    }
}

/// Quality preset for the whole session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPreset {
    /// Full-resolution stills.
    Photo,
    High,
    Medium,
}

/// Uncompressed pixel layouts a photo output can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 16 bits per channel, RGB, native endian.
    Rgb48,
    /// 8 bits per channel, BGRA.
    Bgra32,
    /// 8 bits per channel, RGB.
    Rgb24,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb48 => 6,
            Self::Bgra32 => 4,
            Self::Rgb24 => 3,
        }
    }
}

/// Flash behaviour for a single capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashMode {
    Off,
    On,
    Auto,
}

/// Per-capture settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoSettings {
    /// Uncompressed format requested; `None` lets the hardware choose.
    pub pixel_format: Option<PixelFormat>,
    pub auto_still_image_stabilization: bool,
    pub high_resolution_photo: bool,
    pub flash_mode: FlashMode,
}

/// Raw pixels delivered in the first capture phase.
#[derive(Debug, Clone)]
pub struct SampleBuffer {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// Tightly packed rows (`width * bytes_per_pixel` bytes each).
    pub data: Vec<u8>,
}

/// Settings the hardware actually used, reported in the second phase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
    pub width: u32,
    pub height: u32,
    pub flash_fired: bool,
}

/// Two-phase still-image delivery.
///
/// Hardware sends exactly one `PhotoProcessed` followed by exactly one
/// `CaptureFinished`. A photo is valid only when both succeed.
#[derive(Debug)]
pub enum CaptureEvent {
    PhotoProcessed(Result<SampleBuffer>),
    CaptureFinished(Result<ResolvedSettings>),
}

/// Live camera pipeline (session, inputs, outputs, connections).
///
/// Mutating calls between `begin_configuration` and `commit_configuration`
/// take effect together on commit.
pub trait CameraHardware: Send {
    /// The default back-facing video device, if any.
    fn default_video_device(&self) -> Option<CaptureDevice>;

    /// Open an input for `device`.
    fn make_input(&self, device: &CaptureDevice) -> Result<DeviceInput>;

    fn can_add_input(&self, input: &DeviceInput) -> bool;
    fn can_add_output(&self, output: &PhotoOutput) -> bool;

    fn begin_configuration(&mut self);
    fn set_preset(&mut self, preset: SessionPreset);
    fn add_input(&mut self, input: DeviceInput);
    fn add_output(&mut self, output: PhotoOutput);
    fn commit_configuration(&mut self);

    fn start_running(&mut self);
    /// Stop the session and release the camera.
    fn stop_running(&mut self);
    fn is_running(&self) -> bool;

    /// Uncompressed formats the photo output offers, most preferred first.
    fn available_pixel_formats(&self) -> Vec<PixelFormat>;

    /// Set the orientation of the photo output's video connection.
    /// Returns false if the output has no video connection.
    fn set_output_orientation(&mut self, orientation: VideoOrientation) -> bool;

    /// Start a capture; both delivery phases are sent on `delivery`.
    fn capture_photo(&mut self, settings: PhotoSettings, delivery: Sender<CaptureEvent>);
}
