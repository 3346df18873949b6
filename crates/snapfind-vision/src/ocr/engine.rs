// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// OCR engine seam — the trait every recognition backend implements, plus the
// progress/cancellation monitor the backend reports through.

use image::GrayImage;
use snapfind_core::error::{Result, SnapfindError};
use snapfind_core::types::{RecognizedBlock, SegmentationMode};
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Input handed to a backend: an already binarized image.
pub struct EngineRequest<'a> {
    pub image: &'a GrayImage,
    pub language: &'a str,
    pub mode: SegmentationMode,
}

/// What a backend recognised, in the coordinate space of the request image.
#[derive(Debug, Clone, Default)]
pub struct EngineOutput {
    pub text: String,
    pub blocks: Vec<RecognizedBlock>,
}

/// An OCR engine.
///
/// Implementations block; the recogniser calls them from the blocking pool.
/// Long-running engines should call [`RecognitionMonitor::report`] as they go
/// and bail out with [`SnapfindError::Cancelled`] once
/// [`RecognitionMonitor::should_cancel`] returns true.
pub trait OcrBackend: Send + Sync {
    /// Short name for logs and diagnostics.
    fn name(&self) -> &str;

    /// Whether the engine can read `language` (e.g. "eng").
    fn supports_language(&self, language: &str) -> bool;

    fn recognize(
        &self,
        request: &EngineRequest<'_>,
        monitor: &mut RecognitionMonitor,
    ) -> Result<EngineOutput>;
}

/// Progress notifications for one recognition run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionEvent {
    /// Percent complete, 0–100. Never decreases within a run.
    Progress(u8),
    /// Last event of a run.
    Finished { success: bool },
}

/// Handed to the backend during recognition: forwards progress and answers
/// cancellation queries.
pub struct RecognitionMonitor {
    last_percent: Option<u8>,
    finished: bool,
    events: Option<UnboundedSender<RecognitionEvent>>,
    cancel: CancellationToken,
}

impl RecognitionMonitor {
    pub fn new(events: Option<UnboundedSender<RecognitionEvent>>, cancel: CancellationToken) -> Self {
        Self {
            last_percent: None,
            finished: false,
            events,
            cancel,
        }
    }

    /// A monitor that reports nowhere and is never cancelled.
    pub fn detached() -> Self {
        Self::new(None, CancellationToken::new())
    }

    /// Report progress. Values above 100 are clamped; values below the last
    /// reported one (and repeats) are dropped.
    pub fn report(&mut self, percent: u8) {
        if self.finished {
            return;
        }
        let percent = percent.min(100);
        if self.last_percent.is_some_and(|last| percent <= last) {
            return;
        }
        self.last_percent = Some(percent);
        self.send(RecognitionEvent::Progress(percent));
    }

    /// Whether the engine should stop as soon as possible.
    pub fn should_cancel(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// `Err(Cancelled)` once cancellation was requested.
    pub fn checkpoint(&self) -> Result<()> {
        if self.should_cancel() {
            debug!("Recognition cancellation observed");
            return Err(SnapfindError::Cancelled);
        }
        Ok(())
    }

    pub fn last_percent(&self) -> Option<u8> {
        self.last_percent
    }

    /// Emit the final event. Only the first call has any effect.
    pub fn finish(&mut self, success: bool) {
        if self.finished {
            return;
        }
        if success {
            self.report(100);
        }
        self.finished = true;
        self.send(RecognitionEvent::Finished { success });
    }

    fn send(&self, event: RecognitionEvent) {
        if let Some(tx) = &self.events {
            // The receiver may have been dropped by a screen that went away.
            let _ = tx.send(event);
        }
    }
}

impl Drop for RecognitionMonitor {
    // A backend that panics or a run abandoned midway still terminates the
    // event stream.
    fn drop(&mut self) {
        if !self.finished {
            self.finished = true;
            self.send(RecognitionEvent::Finished { success: false });
        }
    }
}

/// Backend used when no OCR engine is installed.
pub struct UnavailableBackend;

impl OcrBackend for UnavailableBackend {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn supports_language(&self, _language: &str) -> bool {
        true
    }

    fn recognize(
        &self,
        _request: &EngineRequest<'_>,
        _monitor: &mut RecognitionMonitor,
    ) -> Result<EngineOutput> {
        Err(SnapfindError::RecognitionFailed(
            "no OCR engine is installed; rebuild with the `ocr` feature and download models".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc::unbounded_channel;

    fn drain(rx: &mut tokio::sync::mpsc::UnboundedReceiver<RecognitionEvent>) -> Vec<RecognitionEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    #[test]
    fn progress_is_monotonic_and_clamped() {
        let (tx, mut rx) = unbounded_channel();
        let mut monitor = RecognitionMonitor::new(Some(tx), CancellationToken::new());
        for p in [0, 10, 10, 5, 60, 250, 90] {
            monitor.report(p);
        }
        monitor.finish(true);

        assert_eq!(
            drain(&mut rx),
            vec![
                RecognitionEvent::Progress(0),
                RecognitionEvent::Progress(10),
                RecognitionEvent::Progress(60),
                RecognitionEvent::Progress(100),
                RecognitionEvent::Finished { success: true },
            ]
        );
    }

    #[test]
    fn failure_does_not_jump_to_100() {
        let (tx, mut rx) = unbounded_channel();
        let mut monitor = RecognitionMonitor::new(Some(tx), CancellationToken::new());
        monitor.report(40);
        monitor.finish(false);
        monitor.finish(true);
        monitor.report(80);

        assert_eq!(
            drain(&mut rx),
            vec![
                RecognitionEvent::Progress(40),
                RecognitionEvent::Finished { success: false },
            ]
        );
    }

    #[test]
    fn checkpoint_observes_cancellation() {
        let token = CancellationToken::new();
        let monitor = RecognitionMonitor::new(None, token.clone());
        assert!(monitor.checkpoint().is_ok());
        token.cancel();
        assert!(monitor.should_cancel());
        assert!(matches!(monitor.checkpoint(), Err(SnapfindError::Cancelled)));
    }
}
