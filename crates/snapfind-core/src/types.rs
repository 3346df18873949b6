// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for the Snapfind capture-to-recognition pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

/// A protected resource that needs user consent before use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Resource {
    Camera,
    PhotoLibrary,
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Camera => f.write_str("camera"),
            Self::PhotoLibrary => f.write_str("photo library"),
        }
    }
}

/// OS authorization status for a [`Resource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorizationState {
    /// The user granted access.
    Authorized,
    /// The user refused access.
    Denied,
    /// Access is blocked by policy (e.g. parental controls); the user cannot grant it.
    Restricted,
    /// The user has not been asked yet.
    NotDetermined,
}

impl AuthorizationState {
    /// Whether the pipeline may use the resource.
    pub fn may_proceed(self) -> bool {
        matches!(self, Self::Authorized)
    }

    /// Whether the state is final for the current run.
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::NotDetermined)
    }
}

// ---------------------------------------------------------------------------
// Orientation
// ---------------------------------------------------------------------------

/// Physical orientation of the device as reported by its motion sensors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceOrientation {
    Portrait,
    PortraitUpsideDown,
    /// Device rotated so the home edge is on the right.
    LandscapeLeft,
    /// Device rotated so the home edge is on the left.
    LandscapeRight,
    FaceUp,
    FaceDown,
    Unknown,
}

/// Orientation of a capture connection (preview layer or photo output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VideoOrientation {
    #[default]
    Portrait,
    PortraitUpsideDown,
    LandscapeRight,
    LandscapeLeft,
}

impl VideoOrientation {
    /// Map a device orientation onto a capture orientation.
    ///
    /// Landscape is swapped: the camera sensor is mounted rotated relative to
    /// the screen, so a device in `LandscapeLeft` captures `LandscapeRight`.
    /// Flat and unknown orientations have no mapping.
    pub fn from_device(orientation: DeviceOrientation) -> Option<Self> {
        match orientation {
            DeviceOrientation::Portrait => Some(Self::Portrait),
            DeviceOrientation::PortraitUpsideDown => Some(Self::PortraitUpsideDown),
            DeviceOrientation::LandscapeLeft => Some(Self::LandscapeRight),
            DeviceOrientation::LandscapeRight => Some(Self::LandscapeLeft),
            DeviceOrientation::FaceUp | DeviceOrientation::FaceDown | DeviceOrientation::Unknown => {
                None
            }
        }
    }
}

/// EXIF-style orientation tag describing how stored pixels must be
/// transformed to display upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ImageOrientation {
    #[default]
    Up,
    UpMirrored,
    Down,
    DownMirrored,
    /// Stored rotated 90° clockwise; display needs a 90° counter-clockwise turn.
    Left,
    LeftMirrored,
    /// Stored rotated 90° counter-clockwise; display needs a 90° clockwise turn.
    Right,
    RightMirrored,
}

impl ImageOrientation {
    /// Orientation tag for a photo delivered through a connection with the
    /// given capture orientation.
    pub fn for_capture(orientation: VideoOrientation) -> Self {
        match orientation {
            VideoOrientation::Portrait => Self::Right,
            VideoOrientation::PortraitUpsideDown => Self::Left,
            VideoOrientation::LandscapeLeft => Self::Down,
            VideoOrientation::LandscapeRight => Self::Up,
        }
    }

    /// Whether applying the orientation swaps width and height.
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Self::Left | Self::LeftMirrored | Self::Right | Self::RightMirrored
        )
    }
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// Identifier for an acquired image; recognition results carry the id of the
/// image they were computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageId(pub Uuid);

impl ImageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an image came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImageOrigin {
    /// Snapshot from the live capture session.
    LiveCapture,
    /// Photo taken through the system camera picker.
    CameraPicker,
    /// Existing photo chosen from the library (or a file on desktop).
    Library,
}

/// Metadata recorded alongside every acquired image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    pub id: ImageId,
    pub origin: ImageOrigin,
    pub orientation: ImageOrientation,
    pub acquired_at: DateTime<Utc>,
}

impl ImageInfo {
    pub fn new(origin: ImageOrigin, orientation: ImageOrientation) -> Self {
        Self {
            id: ImageId::new(),
            origin,
            orientation,
            acquired_at: Utc::now(),
        }
    }
}

// ---------------------------------------------------------------------------
// Recognition
// ---------------------------------------------------------------------------

/// Level of detail of a recognised block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Granularity {
    Symbol,
    Word,
    Line,
}

/// Page segmentation strategy passed to the OCR engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SegmentationMode {
    /// Fully automatic layout analysis.
    #[default]
    Auto,
    /// Treat the image as one uniform block of text.
    SingleBlock,
    /// Treat the image as a single text line.
    SingleLine,
    /// Find as much text as possible in no particular order.
    SparseText,
}

/// Axis-aligned rectangle in pixel coordinates of the recognised image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl BoundingBox {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Scale the box by independent horizontal and vertical factors.
    pub fn scaled(self, sx: f32, sy: f32) -> Self {
        Self {
            left: self.left * sx,
            top: self.top * sy,
            width: self.width * sx,
            height: self.height * sy,
        }
    }

    /// Smallest box containing both `self` and `other`.
    pub fn union(self, other: Self) -> Self {
        let left = self.left.min(other.left);
        let top = self.top.min(other.top);
        let right = (self.left + self.width).max(other.left + other.width);
        let bottom = (self.top + self.height).max(other.top + other.height);
        Self::new(left, top, right - left, bottom - top)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// A region of recognised text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognizedBlock {
    pub bounds: BoundingBox,
    pub granularity: Granularity,
    pub text: String,
}

/// Output of one recognition run.
///
/// Block coordinates are relative to an image of `source_width` x
/// `source_height`, which may differ from the displayed image when the
/// recogniser downscaled its input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecognitionResult {
    pub image_id: ImageId,
    pub text: String,
    pub blocks: Vec<RecognizedBlock>,
    pub source_width: u32,
    pub source_height: u32,
}

impl RecognitionResult {
    /// A result with no text and no blocks.
    pub fn empty(image_id: ImageId, source_width: u32, source_height: u32) -> Self {
        Self {
            image_id,
            text: String::new(),
            blocks: Vec::new(),
            source_width,
            source_height,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.blocks.is_empty()
    }

    /// Blocks of a single granularity, in recognition order.
    pub fn blocks_of(&self, granularity: Granularity) -> impl Iterator<Item = &RecognizedBlock> {
        self.blocks
            .iter()
            .filter(move |block| block.granularity == granularity)
    }
}

/// Search text applied when rendering results.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchFilter {
    query: String,
    case_sensitive: bool,
}

impl SearchFilter {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            case_sensitive: false,
        }
    }

    pub fn case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// An empty (or whitespace-only) filter selects everything.
    pub fn is_empty(&self) -> bool {
        self.query.trim().is_empty()
    }

    /// Whether `text` is selected by this filter.
    pub fn matches(&self, text: &str) -> bool {
        if self.is_empty() {
            return true;
        }
        let needle = self.query.trim();
        if self.case_sensitive {
            text.contains(needle)
        } else {
            text.to_lowercase().contains(&needle.to_lowercase())
        }
    }
}
