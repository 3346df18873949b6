// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Application configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::{Granularity, SegmentationMode};

/// File name of the persisted configuration inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// How a colour image is reduced to black and white before recognition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinarizeMethod {
    /// Local-mean threshold over a `(2 * block_radius + 1)` square window,
    /// minus `offset`.
    Adaptive { block_radius: u32, offset: i32 },
    /// Global threshold chosen from the histogram.
    Otsu,
}

/// Persistent application settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// OCR language code (e.g. "eng").
    pub language: String,
    /// Page segmentation mode handed to the engine.
    pub segmentation_mode: SegmentationMode,
    /// Binarization applied before recognition.
    pub binarize: BinarizeMethod,
    /// Longest edge, in pixels, of the image handed to the engine.
    pub max_recognition_dimension: u32,
    /// Abort recognition after this many seconds (0 disables the timeout).
    pub recognition_timeout_secs: u64,
    /// How long to wait for both phases of a photo delivery.
    pub capture_timeout_secs: u64,
    /// Which blocks the overlay draws.
    pub overlay_granularity: Granularity,
    /// Stroke colour of overlay boxes (RGBA).
    pub overlay_color: [u8; 4],
    /// Whether the search box matches case-sensitively.
    pub case_sensitive_search: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            language: "eng".into(),
            segmentation_mode: SegmentationMode::Auto,
            binarize: BinarizeMethod::Adaptive {
                block_radius: 15,
                offset: 10,
            },
            max_recognition_dimension: 2048,
            recognition_timeout_secs: 60,
            capture_timeout_secs: 10,
            overlay_granularity: Granularity::Word,
            overlay_color: [255, 0, 0, 255],
            case_sensitive_search: false,
        }
    }
}

impl AppConfig {
    /// Load `config.json` from `data_dir`. Returns `None` if the file is
    /// missing or unreadable.
    pub fn load(data_dir: &Path) -> Option<Self> {
        let data = std::fs::read_to_string(data_dir.join(CONFIG_FILE)).ok()?;
        serde_json::from_str(&data).ok()
    }

    /// Write the configuration to `config.json` in `data_dir`.
    pub fn persist(&self, data_dir: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(data_dir.join(CONFIG_FILE), json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persist_then_load() {
        let dir = tempfile::tempdir().expect("tempdir");
        let config = AppConfig {
            language: "deu".into(),
            binarize: BinarizeMethod::Otsu,
            overlay_granularity: Granularity::Line,
            ..AppConfig::default()
        };
        config.persist(dir.path()).expect("persist");

        let loaded = AppConfig::load(dir.path()).expect("load");
        assert_eq!(loaded, config);
    }

    #[test]
    fn missing_file_loads_none() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(AppConfig::load(dir.path()).is_none());
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join(CONFIG_FILE), r#"{ "language": "fra" }"#)
            .expect("write");

        let loaded = AppConfig::load(dir.path()).expect("load");
        assert_eq!(loaded.language, "fra");
        assert_eq!(loaded.max_recognition_dimension, 2048);
    }
}
