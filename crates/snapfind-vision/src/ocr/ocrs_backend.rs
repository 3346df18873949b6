// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// `ocrs` OCR backend — a pure-Rust engine backed by neural network models
// executed via `rten`.
//
// # Feature Gate
//
// Only available when the `ocr` feature is enabled:
//
// ```toml
// snapfind-vision = { path = "crates/snapfind-vision", features = ["ocr"] }
// ```
//
// # Model Setup
//
// The engine requires two model files:
//
// - **Detection model** (`text-detection.rten`): locates words in the image.
// - **Recognition model** (`text-recognition.rten`): decodes characters of each line.
//
// Running the `ocrs-cli` tool once downloads both to the default cache
// directory, `$XDG_CACHE_HOME/ocrs` (typically `~/.cache/ocrs`):
//   ```sh
//   cargo install ocrs-cli
//   ocrs some-image.png
//   ```

use std::path::{Path, PathBuf};

use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine as OcrsEngine, OcrEngineParams, TextItem};
use rten::Model;
use rten_imageproc::Rect;
use snapfind_core::error::{Result, SnapfindError};
use snapfind_core::types::{BoundingBox, Granularity, RecognizedBlock};
use tracing::{debug, info, instrument};

use super::engine::{EngineOutput, EngineRequest, OcrBackend, RecognitionMonitor};

const DETECTION_MODEL_FILENAME: &str = "text-detection.rten";
const RECOGNITION_MODEL_FILENAME: &str = "text-recognition.rten";

/// The shipped models read Latin script only.
const SUPPORTED_LANGUAGES: &[&str] = &["eng"];

/// `$XDG_CACHE_HOME/ocrs`, falling back to `~/.cache/ocrs`.
fn default_model_dir() -> PathBuf {
    if let Ok(xdg) = std::env::var("XDG_CACHE_HOME") {
        PathBuf::from(xdg).join("ocrs")
    } else if let Ok(home) = std::env::var("HOME") {
        PathBuf::from(home).join(".cache").join("ocrs")
    } else {
        PathBuf::from("ocrs-models")
    }
}

/// Locations of the detection and recognition models.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    pub detection: PathBuf,
    pub recognition: PathBuf,
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self::from_dir(default_model_dir())
    }
}

impl ModelPaths {
    /// Both models inside `dir`, under their well-known file names.
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            detection: dir.join(DETECTION_MODEL_FILENAME),
            recognition: dir.join(RECOGNITION_MODEL_FILENAME),
        }
    }

    /// Whether both model files exist.
    pub fn available(&self) -> bool {
        self.detection.exists() && self.recognition.exists()
    }

    pub fn validate(&self) -> Result<()> {
        for (kind, path) in [("detection", &self.detection), ("recognition", &self.recognition)] {
            if !path.exists() {
                return Err(SnapfindError::RecognitionFailed(format!(
                    "{kind} model not found at {}; run `ocrs-cli` once to download models",
                    path.display()
                )));
            }
        }
        Ok(())
    }
}

/// OCR backend wrapping the `ocrs` engine.
///
/// Model loading is the expensive step; build one backend and share it.
pub struct OcrsBackend {
    engine: OcrsEngine,
}

impl OcrsBackend {
    #[instrument(skip_all, fields(
        detection = %paths.detection.display(),
        recognition = %paths.recognition.display(),
    ))]
    pub fn new(paths: &ModelPaths) -> Result<Self> {
        paths.validate()?;

        info!("Loading OCR detection model");
        let detection_model = Model::load_file(&paths.detection).map_err(|err| {
            SnapfindError::RecognitionFailed(format!(
                "failed to load detection model from {}: {}",
                paths.detection.display(),
                err
            ))
        })?;

        info!("Loading OCR recognition model");
        let recognition_model = Model::load_file(&paths.recognition).map_err(|err| {
            SnapfindError::RecognitionFailed(format!(
                "failed to load recognition model from {}: {}",
                paths.recognition.display(),
                err
            ))
        })?;

        let engine = OcrsEngine::new(OcrEngineParams {
            detection_model: Some(detection_model),
            recognition_model: Some(recognition_model),
            ..Default::default()
        })
        .map_err(|err| {
            SnapfindError::RecognitionFailed(format!("failed to initialise OCR engine: {}", err))
        })?;

        info!("OCR engine initialised");
        Ok(Self { engine })
    }

    /// Backend using models from the default cache directory.
    pub fn with_defaults() -> Result<Self> {
        Self::new(&ModelPaths::default())
    }
}

impl OcrBackend for OcrsBackend {
    fn name(&self) -> &str {
        "ocrs"
    }

    fn supports_language(&self, language: &str) -> bool {
        SUPPORTED_LANGUAGES.contains(&language)
    }

    #[instrument(skip_all, fields(width = request.image.width(), height = request.image.height()))]
    fn recognize(
        &self,
        request: &EngineRequest<'_>,
        monitor: &mut RecognitionMonitor,
    ) -> Result<EngineOutput> {
        // ocrs does its own layout analysis; the segmentation mode is advisory.
        debug!(mode = ?request.mode, "Starting ocrs recognition");

        let rgb = DynamicImage::ImageLuma8(request.image.clone()).to_rgb8();
        let (width, height) = rgb.dimensions();

        let source = ImageSource::from_bytes(rgb.as_raw(), (width, height)).map_err(|err| {
            SnapfindError::RecognitionFailed(format!(
                "failed to create image source ({}x{}): {}",
                width, height, err
            ))
        })?;
        let input = self.engine.prepare_input(source).map_err(|err| {
            SnapfindError::RecognitionFailed(format!("OCR preprocessing failed: {}", err))
        })?;
        monitor.report(10);
        monitor.checkpoint()?;

        let word_rects = self.engine.detect_words(&input).map_err(|err| {
            SnapfindError::RecognitionFailed(format!("word detection failed: {}", err))
        })?;
        debug!(word_count = word_rects.len(), "Words detected");
        monitor.report(40);
        monitor.checkpoint()?;

        let line_rects = self.engine.find_text_lines(&input, &word_rects);
        debug!(line_count = line_rects.len(), "Text lines found");
        monitor.report(50);
        monitor.checkpoint()?;

        let lines = self
            .engine
            .recognize_text(&input, &line_rects)
            .map_err(|err| {
                SnapfindError::RecognitionFailed(format!("line recognition failed: {}", err))
            })?;
        monitor.report(95);

        let mut text_lines = Vec::with_capacity(lines.len());
        let mut blocks = Vec::new();
        for line in lines.iter().flatten() {
            let line_text = line.to_string();
            if line_text.trim().is_empty() {
                continue;
            }

            blocks.push(RecognizedBlock {
                bounds: to_box(line.bounding_rect()),
                granularity: Granularity::Line,
                text: line_text.clone(),
            });
            for word in line.words() {
                blocks.push(RecognizedBlock {
                    bounds: to_box(word.bounding_rect()),
                    granularity: Granularity::Word,
                    text: word.to_string(),
                });
            }
            for ch in line.chars().iter().filter(|c| !c.char.is_whitespace()) {
                blocks.push(RecognizedBlock {
                    bounds: to_box(ch.rect),
                    granularity: Granularity::Symbol,
                    text: ch.char.to_string(),
                });
            }
            text_lines.push(line_text);
        }

        info!(lines = text_lines.len(), blocks = blocks.len(), "ocrs recognition complete");
        Ok(EngineOutput {
            text: text_lines.join("\n"),
            blocks,
        })
    }
}

fn to_box(rect: Rect) -> BoundingBox {
    BoundingBox::new(
        rect.left() as f32,
        rect.top() as f32,
        rect.width() as f32,
        rect.height() as f32,
    )
}
