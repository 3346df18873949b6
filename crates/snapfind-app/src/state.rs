// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Global application state — reactive signals for the Dioxus UI.

use snapfind_core::AppConfig;
use snapfind_core::error::Result;
use snapfind_core::human_errors::HumanError;
use snapfind_pipeline::ScreenController;

use crate::services::app_services::AppServices;
use crate::services::preview;

/// Where the "Find Text" action is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FindStage {
    /// Nothing running.
    #[default]
    Idle,
    /// Recognition in progress; percent once the engine has reported.
    Recognizing { percent: Option<u8> },
    /// Finished with a result.
    Done,
    /// Stopped by the user.
    Cancelled,
    Failed,
}

impl FindStage {
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Recognizing { .. })
    }

    pub fn label(self) -> String {
        match self {
            Self::Idle => String::new(),
            Self::Recognizing { percent: None } => "Finding text...".into(),
            Self::Recognizing { percent: Some(p) } => format!("Finding text... {p}%"),
            Self::Done => "Done.".into(),
            Self::Cancelled => "Cancelled.".into(),
            Self::Failed => "Recognition failed.".into(),
        }
    }
}

/// Shared state accessible to all pages via `use_context`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application settings.
    pub config: AppConfig,
    pub stage: FindStage,
    /// Error shown in the dialog, if any.
    pub error: Option<HumanError>,
}

impl AppState {
    /// Create initial state from the backend services.
    pub fn new(svc: &AppServices) -> Self {
        Self {
            config: svc.config(),
            ..Self::default()
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            config: AppConfig::default(),
            stage: FindStage::Idle,
            error: None,
        }
    }
}

/// What the finder page displays, derived from the controller.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FinderView {
    /// `data:` URL of the upright image with outlines drawn.
    pub image_url: Option<String>,
    pub text: Option<String>,
    pub matches: usize,
    pub has_image: bool,
    pub live_camera: bool,
}

impl FinderView {
    pub fn from_controller(screen: &ScreenController, query: &str) -> Result<Self> {
        let filter = screen.filter(query);
        let image_url = screen
            .overlay(&filter)
            .map(|image| preview::data_url(&image))
            .transpose()?;
        Ok(Self {
            image_url,
            text: screen.text().map(str::to_owned),
            matches: screen.match_count(&filter),
            has_image: screen.current_image().is_some(),
            live_camera: screen.has_live_camera(),
        })
    }
}
