// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Screen controller — owns everything one capture-and-recognise screen needs
// and drives it through an explicit enter/exit lifecycle.

use std::sync::Arc;
use std::time::Duration;

use image::DynamicImage;
use snapfind_bridge::traits::{CameraHardware, ImagePicker, PermissionProvider};
use snapfind_core::config::AppConfig;
use snapfind_core::error::{Result, SnapfindError};
use snapfind_core::types::{DeviceOrientation, RecognitionResult, Resource, SearchFilter};
use snapfind_vision::{
    CapturedImage, RecognitionOptions, RecognitionTask, Recognizer, ResultRenderer,
};
use tracing::{debug, info, instrument, warn};

use crate::permission::PermissionGate;
use crate::session::CaptureSession;
use crate::source::{ImageSource, SourceChoice};

/// The image currently on screen, kept alongside its upright rendering.
struct CurrentImage {
    captured: CapturedImage,
    upright: DynamicImage,
}

/// Orchestrates permissions, acquisition, recognition and rendering for one
/// screen.
///
/// At most one image is current. Replacing it drops any result computed for
/// the previous one, and a result that arrives for an image that is no longer
/// current is discarded.
pub struct ScreenController {
    gate: PermissionGate,
    source: ImageSource,
    recognizer: Recognizer,
    renderer: ResultRenderer,
    camera: Option<Box<dyn CameraHardware>>,
    session: Option<CaptureSession>,
    /// Set only while the session is configured and running.
    live: bool,
    capture_timeout: Duration,
    case_sensitive: bool,
    current: Option<CurrentImage>,
    result: Option<RecognitionResult>,
}

impl ScreenController {
    /// `camera` is `None` on devices without live capture.
    pub fn new(
        permissions: Arc<dyn PermissionProvider>,
        picker: Arc<dyn ImagePicker>,
        camera: Option<Box<dyn CameraHardware>>,
        recognizer: Recognizer,
        config: &AppConfig,
    ) -> Self {
        Self {
            gate: PermissionGate::new(permissions),
            source: ImageSource::new(picker),
            recognizer,
            renderer: ResultRenderer::from_config(config),
            camera,
            session: None,
            live: false,
            capture_timeout: Duration::from_secs(config.capture_timeout_secs),
            case_sensitive: config.case_sensitive_search,
            current: None,
            result: None,
        }
    }

    /// Pick up edited settings. Affects the next recognition and render; a
    /// running camera session keeps its capture timeout.
    pub fn apply_config(&mut self, config: &AppConfig) {
        self.recognizer = self
            .recognizer
            .with_options(RecognitionOptions::from_config(config));
        self.renderer = ResultRenderer::from_config(config);
        self.capture_timeout = Duration::from_secs(config.capture_timeout_secs);
        self.case_sensitive = config.case_sensitive_search;
        debug!(language = %config.language, "Settings applied");
    }

    pub fn backend_name(&self) -> &str {
        self.recognizer.backend_name()
    }

    // -- lifecycle -----------------------------------------------------------

    /// Check consent and bring up the live camera.
    ///
    /// The session is started whenever camera access is granted, even if the
    /// photo library is refused; the first refusal is still reported.
    #[instrument(skip_all)]
    pub async fn enter(&mut self) -> Result<()> {
        let camera = self.gate.ensure(Resource::Camera).await;
        let library = self.gate.ensure(Resource::PhotoLibrary).await;

        if camera.is_ok() {
            self.start_session().await?;
        }
        camera.and(library)
    }

    /// Stop the live camera. The current image and result survive.
    #[instrument(skip_all)]
    pub async fn exit(&mut self) -> Result<()> {
        self.live = false;
        if let Some(session) = &self.session {
            session.stop().await?;
            info!("Left capture screen");
        }
        Ok(())
    }

    async fn start_session(&mut self) -> Result<()> {
        if self.session.is_none() {
            let Some(hardware) = self.camera.take() else {
                debug!("No camera hardware; live capture disabled");
                return Ok(());
            };
            self.session = Some(CaptureSession::spawn(hardware, self.capture_timeout)?);
        }
        let Some(session) = &self.session else {
            return Ok(());
        };
        let brought_up = async {
            session.configure().await?;
            session.start().await
        }
        .await;
        if let Err(e) = &brought_up {
            warn!(error = %e, "Live capture unavailable");
            self.session = None;
        }
        self.live = brought_up.is_ok();
        brought_up
    }

    /// Whether "Snap" can be offered: the session is configured and running.
    pub fn has_live_camera(&self) -> bool {
        self.live
    }

    pub async fn device_rotated(&self, orientation: DeviceOrientation) -> Result<()> {
        if let Some(session) = &self.session {
            session.update_preview_orientation(orientation).await?;
        }
        Ok(())
    }

    // -- acquisition ---------------------------------------------------------

    pub fn source_options(&self) -> Vec<SourceChoice> {
        self.source.options()
    }

    /// Acquire a new image through the picker.
    ///
    /// Returns `false` when the user cancelled; nothing changes in that case.
    #[instrument(skip(self))]
    pub async fn acquire(&mut self, choice: SourceChoice) -> Result<bool> {
        if let Some(resource) = choice.required_resource() {
            self.gate.ensure(resource).await?;
        }
        match self.source.acquire(choice).await? {
            Some(image) => {
                self.set_image(image);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Take a photo with the live session and make it current.
    #[instrument(skip_all)]
    pub async fn snap(&mut self) -> Result<()> {
        let session = self
            .session
            .as_ref()
            .filter(|_| self.live)
            .ok_or_else(|| SnapfindError::DeviceUnavailable("live capture is not running".into()))?;
        let image = session.snap_photo().await?;
        self.set_image(image);
        Ok(())
    }

    /// Make `image` current, discarding the previous result.
    pub fn set_image(&mut self, image: CapturedImage) {
        info!(image_id = %image.id(), origin = ?image.info.origin, "Current image replaced");
        let upright = image.normalized();
        self.current = Some(CurrentImage {
            captured: image,
            upright,
        });
        self.result = None;
    }

    pub fn current_image(&self) -> Option<&CapturedImage> {
        self.current.as_ref().map(|c| &c.captured)
    }

    /// The current image rotated upright.
    pub fn upright_image(&self) -> Option<&DynamicImage> {
        self.current.as_ref().map(|c| &c.upright)
    }

    // -- recognition ---------------------------------------------------------

    /// Start recognising the current image in the background.
    ///
    /// Feed the outcome back through [`accept_result`](Self::accept_result).
    pub fn start_recognition(&self) -> Result<RecognitionTask> {
        let current = self.current.as_ref().ok_or(SnapfindError::NoImage)?;
        Ok(self
            .recognizer
            .start(current.upright.clone(), current.captured.id()))
    }

    /// Store `result` if it belongs to the current image.
    pub fn accept_result(&mut self, result: RecognitionResult) -> bool {
        let is_current = self
            .current
            .as_ref()
            .is_some_and(|c| c.captured.id() == result.image_id);
        if is_current {
            self.result = Some(result);
        } else {
            warn!(image_id = %result.image_id, "Discarding result for a replaced image");
        }
        is_current
    }

    /// Recognise the current image and keep the result.
    pub async fn recognize(&mut self) -> Result<&RecognitionResult> {
        let result = self.start_recognition()?.result().await?;
        self.accept_result(result);
        self.result.as_ref().ok_or(SnapfindError::NoImage)
    }

    pub fn result(&self) -> Option<&RecognitionResult> {
        self.result.as_ref()
    }

    // -- rendering -----------------------------------------------------------

    /// Search filter honouring the configured case sensitivity.
    pub fn filter(&self, query: &str) -> SearchFilter {
        SearchFilter::new(query).case_sensitive(self.case_sensitive)
    }

    /// Upright image with outlines for the blocks matching `filter`.
    pub fn overlay(&self, filter: &SearchFilter) -> Option<DynamicImage> {
        let current = self.current.as_ref()?;
        Some(match &self.result {
            Some(result) => self.renderer.render_boxes(&current.upright, result, filter),
            None => current.upright.clone(),
        })
    }

    pub fn match_count(&self, filter: &SearchFilter) -> usize {
        self.result
            .as_ref()
            .map_or(0, |result| self.renderer.count_matches(result, filter))
    }

    pub fn text(&self) -> Option<&str> {
        self.result
            .as_ref()
            .map(|result| self.renderer.render_text(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::tests::{FakeCamera, FakeState};
    use crate::source::tests::{FakePicker, png_bytes};
    use image::{GrayImage, Luma};
    use snapfind_bridge::traits::PickedImage;
    use snapfind_core::types::{
        AuthorizationState, BoundingBox, Granularity, ImageOrientation, ImageOrigin,
        RecognizedBlock,
    };
    use snapfind_vision::ocr::{OcrBackend, RecognitionMonitor};
    use snapfind_vision::ocr::engine::{EngineOutput, EngineRequest};

    struct FixedPermissions(AuthorizationState, AuthorizationState);

    impl PermissionProvider for FixedPermissions {
        fn authorization_status(&self, resource: Resource) -> AuthorizationState {
            match resource {
                Resource::Camera => self.0,
                Resource::PhotoLibrary => self.1,
            }
        }

        fn request_access(&self, resource: Resource) -> Result<AuthorizationState> {
            Ok(self.authorization_status(resource))
        }
    }

    /// Backend that reports one word covering the whole input.
    struct WholeImageBackend;

    impl OcrBackend for WholeImageBackend {
        fn name(&self) -> &str {
            "whole-image"
        }

        fn supports_language(&self, _language: &str) -> bool {
            true
        }

        fn recognize(
            &self,
            request: &EngineRequest<'_>,
            monitor: &mut RecognitionMonitor,
        ) -> Result<EngineOutput> {
            monitor.report(50);
            let (w, h) = request.image.dimensions();
            Ok(EngineOutput {
                text: "Receipt".into(),
                blocks: vec![RecognizedBlock {
                    bounds: BoundingBox::new(1.0, 1.0, w as f32 - 2.0, h as f32 - 2.0),
                    granularity: Granularity::Word,
                    text: "Receipt".into(),
                }],
            })
        }
    }

    fn controller(
        camera: Option<FakeCamera>,
        picker: Arc<FakePicker>,
        permissions: (AuthorizationState, AuthorizationState),
    ) -> ScreenController {
        let config = AppConfig::default();
        let recognizer = Recognizer::new(
            Arc::new(WholeImageBackend),
            RecognitionOptions::from_config(&config),
        );
        ScreenController::new(
            Arc::new(FixedPermissions(permissions.0, permissions.1)),
            picker,
            camera.map(|c| Box::new(c) as Box<dyn CameraHardware>),
            recognizer,
            &config,
        )
    }

    const GRANTED: (AuthorizationState, AuthorizationState) =
        (AuthorizationState::Authorized, AuthorizationState::Authorized);

    fn page() -> CapturedImage {
        let mut img = GrayImage::from_pixel(40, 20, Luma([230u8]));
        for x in 5..35 {
            for y in 8..12 {
                img.put_pixel(x, y, Luma([20u8]));
            }
        }
        CapturedImage::new(
            DynamicImage::ImageLuma8(img),
            ImageOrigin::Library,
            ImageOrientation::Up,
        )
    }

    #[tokio::test]
    async fn enter_starts_and_exit_stops_the_camera() {
        let (camera, shared) = FakeCamera::new(FakeState::default());
        let mut screen = controller(Some(camera), FakePicker::new(true, vec![]), GRANTED);

        screen.enter().await.unwrap();
        assert!(shared.lock().unwrap().running);

        screen.exit().await.unwrap();
        assert!(!shared.lock().unwrap().running);

        // Re-entering restarts without reconfiguring.
        screen.enter().await.unwrap();
        let calls = shared.lock().unwrap().calls.clone();
        assert_eq!(calls.iter().filter(|c| *c == "commit").count(), 1);
        assert_eq!(calls.iter().filter(|c| *c == "start").count(), 2);
    }

    #[tokio::test]
    async fn camera_denied_keeps_session_down() {
        let (camera, shared) = FakeCamera::new(FakeState::default());
        let mut screen = controller(
            Some(camera),
            FakePicker::new(true, vec![]),
            (AuthorizationState::Denied, AuthorizationState::Authorized),
        );
        let err = screen.enter().await.unwrap_err();
        assert!(matches!(
            err,
            SnapfindError::PermissionDenied {
                resource: Resource::Camera,
                ..
            }
        ));
        assert!(shared.lock().unwrap().calls.is_empty());
        assert!(!screen.has_live_camera());
        assert!(screen.snap().await.is_err());
    }

    #[tokio::test]
    async fn rejected_configuration_disables_snap() {
        let (camera, shared) = FakeCamera::new(FakeState {
            can_add_output: false,
            ..FakeState::default()
        });
        let mut screen = controller(Some(camera), FakePicker::new(true, vec![]), GRANTED);

        let err = screen.enter().await.unwrap_err();
        assert!(matches!(err, SnapfindError::ConfigurationRejected(_)));
        assert!(!screen.has_live_camera());
        assert!(!shared.lock().unwrap().running);
        assert!(matches!(
            screen.snap().await,
            Err(SnapfindError::DeviceUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn live_camera_follows_enter_and_exit() {
        let (camera, _shared) = FakeCamera::new(FakeState::default());
        let mut screen = controller(Some(camera), FakePicker::new(true, vec![]), GRANTED);
        assert!(!screen.has_live_camera());

        screen.enter().await.unwrap();
        assert!(screen.has_live_camera());

        screen.exit().await.unwrap();
        assert!(!screen.has_live_camera());
    }

    #[tokio::test]
    async fn cancelled_pick_leaves_state_untouched() {
        let picker = FakePicker::new(
            false,
            vec![
                Some(PickedImage {
                    data: png_bytes(8, 4),
                    orientation: ImageOrientation::Up,
                }),
                None,
            ],
        );
        let mut screen = controller(None, picker, GRANTED);

        assert!(screen.acquire(SourceChoice::ChooseExisting).await.unwrap());
        let first = screen.current_image().unwrap().id();

        assert!(!screen.acquire(SourceChoice::ChooseExisting).await.unwrap());
        assert!(!screen.acquire(SourceChoice::Cancel).await.unwrap());
        assert_eq!(screen.current_image().unwrap().id(), first);
    }

    #[tokio::test]
    async fn library_denied_blocks_choose_existing() {
        let mut screen = controller(
            None,
            FakePicker::new(false, vec![]),
            (AuthorizationState::Authorized, AuthorizationState::Restricted),
        );
        assert!(matches!(
            screen.acquire(SourceChoice::ChooseExisting).await,
            Err(SnapfindError::PermissionDenied { .. })
        ));
        assert!(screen.current_image().is_none());
    }

    #[tokio::test]
    async fn snap_replaces_image_and_clears_result() {
        let (camera, _) = FakeCamera::new(FakeState::default());
        let mut screen = controller(Some(camera), FakePicker::new(true, vec![]), GRANTED);
        screen.enter().await.unwrap();

        screen.set_image(page());
        screen.recognize().await.unwrap();
        assert!(screen.result().is_some());

        screen.snap().await.unwrap();
        assert_eq!(
            screen.current_image().unwrap().info.origin,
            ImageOrigin::LiveCapture
        );
        assert!(screen.result().is_none());
        assert!(screen.text().is_none());
    }

    #[tokio::test]
    async fn recognize_then_render() {
        let mut screen = controller(None, FakePicker::new(false, vec![]), GRANTED);
        assert!(matches!(
            screen.recognize().await,
            Err(SnapfindError::NoImage)
        ));

        screen.set_image(page());
        let result = screen.recognize().await.unwrap();
        assert_eq!(result.text, "Receipt");
        assert_eq!(screen.text(), Some("Receipt"));

        let hit = screen.filter("receipt");
        assert_eq!(screen.match_count(&hit), 1);
        let overlay = screen.overlay(&hit).unwrap().to_rgba8();
        assert_eq!(overlay.get_pixel(1, 1).0, [255, 0, 0, 255]);

        let miss = screen.filter("total");
        assert_eq!(screen.match_count(&miss), 0);
        assert_eq!(
            screen.overlay(&miss).unwrap(),
            *screen.upright_image().unwrap()
        );
    }

    #[tokio::test]
    async fn applied_config_changes_rendering() {
        let mut screen = controller(None, FakePicker::new(false, vec![]), GRANTED);
        screen.set_image(page());
        screen.recognize().await.unwrap();

        let config = AppConfig {
            overlay_color: [0, 0, 255, 255],
            case_sensitive_search: true,
            ..AppConfig::default()
        };
        screen.apply_config(&config);

        assert_eq!(screen.match_count(&screen.filter("receipt")), 0);
        let overlay = screen.overlay(&screen.filter("Receipt")).unwrap().to_rgba8();
        assert_eq!(overlay.get_pixel(1, 1).0, [0, 0, 255, 255]);
        assert_eq!(screen.backend_name(), "whole-image");
    }

    #[tokio::test]
    async fn stale_results_are_discarded() {
        let mut screen = controller(None, FakePicker::new(false, vec![]), GRANTED);
        screen.set_image(page());
        let task = screen.start_recognition().unwrap();

        // The user picks another image while recognition runs.
        screen.set_image(page());
        let stale = task.result().await.unwrap();
        assert!(!screen.accept_result(stale));
        assert!(screen.result().is_none());
    }
}
