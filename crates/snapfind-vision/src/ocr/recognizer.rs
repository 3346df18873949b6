// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Recognizer — preprocesses an upright image and runs it through an OCR
// backend, either inline or as a background task with progress events,
// cancellation and a timeout.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use image::{DynamicImage, GrayImage};
use snapfind_core::config::{AppConfig, BinarizeMethod};
use snapfind_core::error::{Result, SnapfindError};
use snapfind_core::types::{ImageId, RecognitionResult, SegmentationMode};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use super::engine::{EngineRequest, OcrBackend, RecognitionEvent, RecognitionMonitor};
use crate::image::processor::ImageProcessor;
use crate::scan::binarize::{Binarizer, has_ink};

/// Knobs for one recogniser.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognitionOptions {
    pub language: String,
    pub mode: SegmentationMode,
    pub binarize: BinarizeMethod,
    /// Longest edge handed to the engine; 0 disables downscaling.
    pub max_dimension: u32,
    /// Background runs give up after this long.
    pub timeout: Option<Duration>,
}

impl RecognitionOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            language: config.language.clone(),
            mode: config.segmentation_mode,
            binarize: config.binarize,
            max_dimension: config.max_recognition_dimension,
            timeout: (config.recognition_timeout_secs > 0)
                .then(|| Duration::from_secs(config.recognition_timeout_secs)),
        }
    }
}

impl Default for RecognitionOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// Runs OCR over images. Cheap to clone; clones share the backend.
#[derive(Clone)]
pub struct Recognizer {
    backend: Arc<dyn OcrBackend>,
    options: Arc<RecognitionOptions>,
}

impl Recognizer {
    pub fn new(backend: Arc<dyn OcrBackend>, options: RecognitionOptions) -> Self {
        Self {
            backend,
            options: Arc::new(options),
        }
    }

    /// A recogniser sharing this one's backend with different options.
    pub fn with_options(&self, options: RecognitionOptions) -> Self {
        Self::new(Arc::clone(&self.backend), options)
    }

    pub fn options(&self) -> &RecognitionOptions {
        &self.options
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Downscale to the configured limit and binarize.
    pub fn preprocess(&self, image: &DynamicImage) -> GrayImage {
        let scaled = ImageProcessor::from_dynamic(image.clone())
            .limit_dimension(self.options.max_dimension)
            .into_dynamic();
        Binarizer::new(self.options.binarize).binarize(&scaled)
    }

    /// Recognise `image` on the current thread, reporting through `monitor`.
    ///
    /// The monitor always receives its final event before this returns.
    #[instrument(skip_all, fields(image_id = %image_id, backend = self.backend.name()))]
    pub fn recognize_blocking(
        &self,
        image: &DynamicImage,
        image_id: ImageId,
        monitor: &mut RecognitionMonitor,
    ) -> Result<RecognitionResult> {
        let outcome = self.run(image, image_id, monitor);
        match &outcome {
            Ok(result) => info!(
                blocks = result.blocks.len(),
                chars = result.text.len(),
                "Recognition complete"
            ),
            Err(e) => warn!(error = %e, "Recognition did not complete"),
        }
        monitor.finish(outcome.is_ok());
        outcome
    }

    /// Text-only recognition without progress reporting.
    pub fn recognize_text(&self, image: &DynamicImage) -> Result<String> {
        let mut monitor = RecognitionMonitor::detached();
        self.recognize_blocking(image, ImageId::new(), &mut monitor)
            .map(|result| result.text)
    }

    /// Start recognition on the blocking pool and return immediately.
    ///
    /// Must be called from within a tokio runtime. Cancelling, or the
    /// configured timeout expiring, resolves the task and ends the event
    /// stream straight away, even if the engine never looks at its monitor.
    /// Such an engine keeps its blocking thread until it returns.
    pub fn start(&self, image: DynamicImage, image_id: ImageId) -> RecognitionTask {
        let (tx, rx) = unbounded_channel();
        let cancel = CancellationToken::new();
        let recognizer = self.clone();
        let token = cancel.clone();
        let timeout = self.options.timeout;

        let handle = tokio::spawn(async move {
            let worker_token = token.clone();
            let blocking = tokio::task::spawn_blocking(move || {
                let mut monitor = RecognitionMonitor::new(Some(tx), worker_token);
                recognizer.recognize_blocking(&image, image_id, &mut monitor)
            });
            let deadline = async {
                match timeout {
                    Some(limit) => tokio::time::sleep(limit).await,
                    None => std::future::pending().await,
                }
            };

            tokio::select! {
                biased;
                joined = blocking => joined.unwrap_or_else(|err| {
                    Err(SnapfindError::RecognitionFailed(format!(
                        "recognition worker stopped: {err}"
                    )))
                }),
                () = token.cancelled() => {
                    debug!("Recognition cancelled before the engine returned");
                    Err(SnapfindError::Cancelled)
                }
                () = deadline => {
                    let seconds = timeout.map_or(0, |limit| limit.as_secs());
                    warn!(seconds, "Recognition timed out; cancelling");
                    token.cancel();
                    Err(SnapfindError::TimedOut {
                        operation: "recognition".into(),
                        seconds,
                    })
                }
            }
        });

        RecognitionTask {
            events: rx,
            cancel,
            handle,
            ended: false,
        }
    }

    fn run(
        &self,
        image: &DynamicImage,
        image_id: ImageId,
        monitor: &mut RecognitionMonitor,
    ) -> Result<RecognitionResult> {
        let language = self.options.language.as_str();
        if !self.backend.supports_language(language) {
            return Err(SnapfindError::RecognitionFailed(format!(
                "the {} engine cannot read language '{language}'",
                self.backend.name()
            )));
        }
        monitor.checkpoint()?;
        monitor.report(0);

        let binary = self.preprocess(image);
        let (width, height) = binary.dimensions();
        debug!(width, height, "Image preprocessed");

        if !has_ink(&binary) {
            info!("Blank image after binarization; skipping engine");
            return Ok(RecognitionResult::empty(image_id, width, height));
        }
        monitor.checkpoint()?;

        let request = EngineRequest {
            image: &binary,
            language,
            mode: self.options.mode,
        };
        let output = panic::catch_unwind(AssertUnwindSafe(|| self.backend.recognize(&request, monitor)))
            .map_err(|payload| {
                SnapfindError::RecognitionFailed(format!(
                    "the {} engine crashed: {}",
                    self.backend.name(),
                    panic_message(payload.as_ref())
                ))
            })??;

        Ok(RecognitionResult {
            image_id,
            text: output.text,
            blocks: output.blocks,
            source_width: width,
            source_height: height,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

/// Handle to a background recognition run.
pub struct RecognitionTask {
    events: UnboundedReceiver<RecognitionEvent>,
    cancel: CancellationToken,
    handle: JoinHandle<Result<RecognitionResult>>,
    ended: bool,
}

impl RecognitionTask {
    /// Next progress event; `None` once the run has finished reporting.
    ///
    /// After cancellation (including a timeout) the stream ends with
    /// `Finished { success: false }` without waiting for the engine.
    pub async fn next_event(&mut self) -> Option<RecognitionEvent> {
        if self.ended {
            return None;
        }
        let event = tokio::select! {
            biased;
            event = self.events.recv() => event,
            () = self.cancel.cancelled() => Some(RecognitionEvent::Finished { success: false }),
        };
        if !matches!(event, Some(RecognitionEvent::Progress(_))) {
            self.ended = true;
            self.events.close();
        }
        event
    }

    /// Token that stops the run when cancelled (e.g. from a Cancel button).
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the outcome.
    pub async fn result(self) -> Result<RecognitionResult> {
        self.handle.await.map_err(|err| {
            SnapfindError::RecognitionFailed(format!("recognition task stopped: {err}"))
        })?
    }
}
