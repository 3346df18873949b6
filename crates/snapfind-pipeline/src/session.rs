// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Live capture session — configures the camera pipeline, tracks preview
// orientation and turns two-phase photo delivery into a single image.
//
// `SessionCore` holds the logic and runs synchronously. `CaptureSession`
// moves a core onto a dedicated worker thread and exposes it through async
// request/reply calls, so every hardware mutation happens on that one thread.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use image::{DynamicImage, ImageBuffer, Rgb, RgbImage, RgbaImage};
use snapfind_bridge::traits::{
    CameraHardware, CaptureEvent, FlashMode, PhotoOutput, PhotoSettings, PixelFormat,
    ResolvedSettings, SampleBuffer, SessionPreset,
};
use snapfind_core::error::{Result, SnapfindError};
use snapfind_core::types::{DeviceOrientation, ImageOrientation, ImageOrigin, VideoOrientation};
use snapfind_vision::CapturedImage;
use tokio::sync::{mpsc as async_mpsc, oneshot};
use tracing::{debug, info, instrument, warn};

// ---------------------------------------------------------------------------
// Synchronous core
// ---------------------------------------------------------------------------

/// Camera session state machine.
pub struct SessionCore {
    hardware: Box<dyn CameraHardware>,
    configured: bool,
    preview_orientation: VideoOrientation,
    capture_timeout: Duration,
}

impl SessionCore {
    pub fn new(hardware: Box<dyn CameraHardware>, capture_timeout: Duration) -> Self {
        Self {
            hardware,
            configured: false,
            preview_orientation: VideoOrientation::default(),
            capture_timeout,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.configured
    }

    pub fn is_running(&self) -> bool {
        self.hardware.is_running()
    }

    pub fn preview_orientation(&self) -> VideoOrientation {
        self.preview_orientation
    }

    /// Attach the default camera and a still-photo output.
    ///
    /// Nothing is changed unless both the input and the output can be added.
    #[instrument(skip_all)]
    pub fn configure(&mut self) -> Result<()> {
        if self.configured {
            debug!("Session already configured");
            return Ok(());
        }

        let device = self.hardware.default_video_device().ok_or_else(|| {
            warn!("No default video device");
            SnapfindError::DeviceUnavailable("no camera found on this device".into())
        })?;
        let input = self.hardware.make_input(&device)?;
        let output = PhotoOutput::default();

        if !self.hardware.can_add_input(&input) {
            warn!(device = %device.name, "Session refused the camera input");
            return Err(SnapfindError::ConfigurationRejected(format!(
                "cannot add input for {}",
                device.name
            )));
        }
        if !self.hardware.can_add_output(&output) {
            warn!("Session refused the photo output");
            return Err(SnapfindError::ConfigurationRejected(
                "cannot add photo output".into(),
            ));
        }

        self.hardware.begin_configuration();
        self.hardware.set_preset(SessionPreset::Photo);
        self.hardware.add_input(input);
        self.hardware.add_output(output);
        self.hardware.commit_configuration();
        self.configured = true;

        info!(device = %device.name, "Capture session configured");
        Ok(())
    }

    pub fn start(&mut self) -> Result<()> {
        if !self.configured {
            return Err(SnapfindError::ConfigurationRejected(
                "start requested before the session was configured".into(),
            ));
        }
        if self.hardware.is_running() {
            debug!("Session already running");
            return Ok(());
        }
        self.hardware.start_running();
        info!("Capture session started");
        Ok(())
    }

    pub fn stop(&mut self) {
        if self.hardware.is_running() {
            self.hardware.stop_running();
            info!("Capture session stopped");
        }
    }

    /// Follow the device orientation. Flat and unknown orientations keep the
    /// previous value.
    pub fn update_preview_orientation(&mut self, device: DeviceOrientation) -> VideoOrientation {
        if let Some(orientation) = VideoOrientation::from_device(device) {
            if orientation != self.preview_orientation {
                debug!(?device, ?orientation, "Preview orientation changed");
            }
            self.preview_orientation = orientation;
        }
        self.preview_orientation
    }

    /// Settings for the next still capture.
    pub fn photo_settings(&self) -> PhotoSettings {
        let formats = self.hardware.available_pixel_formats();
        let pixel_format = if formats.contains(&PixelFormat::Rgb48) {
            Some(PixelFormat::Rgb48)
        } else {
            formats.first().copied()
        };
        PhotoSettings {
            pixel_format,
            auto_still_image_stabilization: true,
            high_resolution_photo: true,
            flash_mode: FlashMode::Auto,
        }
    }

    /// Take a still photo and wait for both delivery phases.
    #[instrument(skip_all, fields(orientation = ?self.preview_orientation))]
    pub fn snap_photo(&mut self) -> Result<CapturedImage> {
        if !self.configured {
            return Err(SnapfindError::ConfigurationRejected(
                "capture requested before the session was configured".into(),
            ));
        }
        if !self.hardware.is_running() {
            return Err(SnapfindError::CaptureFailed("the session is not running".into()));
        }

        let orientation = self.preview_orientation;
        if !self.hardware.set_output_orientation(orientation) {
            warn!("Photo output has no video connection; orientation not synced");
        }

        let settings = self.photo_settings();
        debug!(format = ?settings.pixel_format, "Capturing photo");

        let (tx, rx) = mpsc::channel();
        self.hardware.capture_photo(settings, tx);
        let (buffer, resolved) = self.await_delivery(&rx)?;

        let pixels = sample_to_image(buffer)?;
        info!(
            width = resolved.width,
            height = resolved.height,
            flash = resolved.flash_fired,
            "Photo captured"
        );
        Ok(CapturedImage::new(
            pixels,
            ImageOrigin::LiveCapture,
            ImageOrientation::for_capture(orientation),
        ))
    }

    /// Hold the phase-one buffer until phase two reports; either error
    /// rejects the photo.
    fn await_delivery(
        &self,
        rx: &mpsc::Receiver<CaptureEvent>,
    ) -> Result<(SampleBuffer, ResolvedSettings)> {
        let deadline = Instant::now() + self.capture_timeout;
        let mut photo: Option<Result<SampleBuffer>> = None;

        let finished = loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match rx.recv_timeout(remaining) {
                Ok(CaptureEvent::PhotoProcessed(outcome)) => {
                    debug!(ok = outcome.is_ok(), "Photo processed");
                    photo = Some(outcome);
                }
                // The camera always delivers the processed photo before
                // signalling that the capture finished.
                Ok(CaptureEvent::CaptureFinished(outcome)) => break outcome,
                Err(RecvTimeoutError::Timeout) => {
                    warn!("Photo delivery timed out");
                    return Err(SnapfindError::TimedOut {
                        operation: "photo capture".into(),
                        seconds: self.capture_timeout.as_secs(),
                    });
                }
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(SnapfindError::CaptureFailed(
                        "camera stopped delivering before the capture finished".into(),
                    ));
                }
            }
        };

        let resolved = finished.map_err(|err| {
            warn!(error = %err, "Capture finished with an error; discarding photo");
            SnapfindError::CaptureFailed(err.to_string())
        })?;
        let buffer = photo
            .ok_or_else(|| SnapfindError::CaptureFailed("no photo was delivered".into()))?
            .map_err(|err| SnapfindError::CaptureFailed(err.to_string()))?;
        Ok((buffer, resolved))
    }
}

/// Decode a raw sample buffer into an image.
pub fn sample_to_image(buffer: SampleBuffer) -> Result<DynamicImage> {
    let SampleBuffer {
        width,
        height,
        format,
        data,
    } = buffer;
    let expected = width as usize * height as usize * format.bytes_per_pixel();
    if data.len() != expected {
        return Err(SnapfindError::CaptureFailed(format!(
            "{format:?} buffer of {width}x{height} should hold {expected} bytes, got {}",
            data.len()
        )));
    }

    let image = match format {
        PixelFormat::Rgb48 => {
            let samples: Vec<u16> = data
                .chunks_exact(2)
                .map(|pair| u16::from_ne_bytes([pair[0], pair[1]]))
                .collect();
            ImageBuffer::<Rgb<u16>, Vec<u16>>::from_raw(width, height, samples)
                .map(DynamicImage::ImageRgb16)
        }
        PixelFormat::Bgra32 => {
            let rgba: Vec<u8> = data
                .chunks_exact(4)
                .flat_map(|px| [px[2], px[1], px[0], px[3]])
                .collect();
            RgbaImage::from_raw(width, height, rgba).map(DynamicImage::ImageRgba8)
        }
        PixelFormat::Rgb24 => RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8),
    };
    image.ok_or_else(|| {
        SnapfindError::CaptureFailed(format!("could not build a {width}x{height} image"))
    })
}

// ---------------------------------------------------------------------------
// Worker-thread session
// ---------------------------------------------------------------------------

enum Command {
    Configure(oneshot::Sender<Result<()>>),
    Start(oneshot::Sender<Result<()>>),
    Stop(oneshot::Sender<()>),
    UpdateOrientation(DeviceOrientation, oneshot::Sender<VideoOrientation>),
    Snap(oneshot::Sender<Result<CapturedImage>>),
    IsRunning(oneshot::Sender<bool>),
    Shutdown,
}

/// Handle to a [`SessionCore`] running on its own thread.
///
/// Commands are processed one at a time in the order they were sent.
/// Dropping the handle stops the camera and joins the worker.
pub struct CaptureSession {
    commands: async_mpsc::UnboundedSender<Command>,
    worker: Option<JoinHandle<()>>,
}

impl CaptureSession {
    pub fn spawn(hardware: Box<dyn CameraHardware>, capture_timeout: Duration) -> Result<Self> {
        let (tx, mut rx) = async_mpsc::unbounded_channel();
        let mut core = SessionCore::new(hardware, capture_timeout);

        let worker = std::thread::Builder::new()
            .name("capture-session".into())
            .spawn(move || {
                debug!("Capture worker started");
                while let Some(command) = rx.blocking_recv() {
                    // A dropped reply receiver means the caller gave up.
                    match command {
                        Command::Configure(reply) => {
                            let _ = reply.send(core.configure());
                        }
                        Command::Start(reply) => {
                            let _ = reply.send(core.start());
                        }
                        Command::Stop(reply) => {
                            core.stop();
                            let _ = reply.send(());
                        }
                        Command::UpdateOrientation(device, reply) => {
                            let _ = reply.send(core.update_preview_orientation(device));
                        }
                        Command::Snap(reply) => {
                            let _ = reply.send(core.snap_photo());
                        }
                        Command::IsRunning(reply) => {
                            let _ = reply.send(core.is_running());
                        }
                        Command::Shutdown => break,
                    }
                }
                core.stop();
                debug!("Capture worker exiting");
            })?;

        Ok(Self {
            commands: tx,
            worker: Some(worker),
        })
    }

    pub async fn configure(&self) -> Result<()> {
        self.request(Command::Configure).await?
    }

    pub async fn start(&self) -> Result<()> {
        self.request(Command::Start).await?
    }

    pub async fn stop(&self) -> Result<()> {
        self.request(Command::Stop).await
    }

    pub async fn update_preview_orientation(
        &self,
        device: DeviceOrientation,
    ) -> Result<VideoOrientation> {
        self.request(|reply| Command::UpdateOrientation(device, reply))
            .await
    }

    pub async fn snap_photo(&self) -> Result<CapturedImage> {
        self.request(Command::Snap).await?
    }

    pub async fn is_running(&self) -> Result<bool> {
        self.request(Command::IsRunning).await
    }

    async fn request<T>(&self, command: impl FnOnce(oneshot::Sender<T>) -> Command) -> Result<T> {
        let (reply, response) = oneshot::channel();
        self.commands
            .send(command(reply))
            .map_err(|_| SnapfindError::DeviceUnavailable("capture worker has stopped".into()))?;
        response
            .await
            .map_err(|_| SnapfindError::DeviceUnavailable("capture worker has stopped".into()))
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use snapfind_bridge::traits::{CaptureDevice, DeviceInput};
    use std::sync::mpsc::Sender;
    use std::sync::{Arc, Mutex};

    /// How the fake camera answers a capture request.
    #[derive(Clone)]
    pub(crate) enum Delivery {
        Both,
        PhaseTwoFails,
        PhaseOneFails,
        Silent,
    }

    pub(crate) struct FakeState {
        pub calls: Vec<String>,
        pub has_device: bool,
        pub can_add_input: bool,
        pub can_add_output: bool,
        pub running: bool,
        pub formats: Vec<PixelFormat>,
        pub output_orientation: Option<VideoOrientation>,
        pub last_settings: Option<PhotoSettings>,
        pub delivery: Delivery,
    }

    impl Default for FakeState {
        fn default() -> Self {
            Self {
                calls: Vec::new(),
                has_device: true,
                can_add_input: true,
                can_add_output: true,
                running: false,
                formats: vec![PixelFormat::Bgra32, PixelFormat::Rgb48],
                output_orientation: None,
                last_settings: None,
                delivery: Delivery::Both,
            }
        }
    }

    /// Camera that records every call into shared state.
    pub(crate) struct FakeCamera(pub Arc<Mutex<FakeState>>);

    impl FakeCamera {
        pub(crate) fn new(state: FakeState) -> (Self, Arc<Mutex<FakeState>>) {
            let shared = Arc::new(Mutex::new(state));
            (Self(shared.clone()), shared)
        }

        fn log(&self, call: &str) {
            self.0.lock().unwrap().calls.push(call.to_string());
        }
    }

    impl CameraHardware for FakeCamera {
        fn default_video_device(&self) -> Option<CaptureDevice> {
            self.0.lock().unwrap().has_device.then(|| CaptureDevice {
                unique_id: "back-wide".into(),
                name: "Back Camera".into(),
            })
        }

        fn make_input(&self, device: &CaptureDevice) -> Result<DeviceInput> {
            Ok(DeviceInput {
                device: device.clone(),
            })
        }

        fn can_add_input(&self, _input: &DeviceInput) -> bool {
            self.0.lock().unwrap().can_add_input
        }

        fn can_add_output(&self, _output: &PhotoOutput) -> bool {
            self.0.lock().unwrap().can_add_output
        }

        fn begin_configuration(&mut self) {
            self.log("begin");
        }

        fn set_preset(&mut self, preset: SessionPreset) {
            self.log(&format!("preset:{preset:?}"));
        }

        fn add_input(&mut self, _input: DeviceInput) {
            self.log("add_input");
        }

        fn add_output(&mut self, output: PhotoOutput) {
            assert!(output.high_resolution_capture);
            assert!(!output.live_photo_capture);
            self.log("add_output");
        }

        fn commit_configuration(&mut self) {
            self.log("commit");
        }

        fn start_running(&mut self) {
            self.log("start");
            self.0.lock().unwrap().running = true;
        }

        fn stop_running(&mut self) {
            self.log("stop");
            self.0.lock().unwrap().running = false;
        }

        fn is_running(&self) -> bool {
            self.0.lock().unwrap().running
        }

        fn available_pixel_formats(&self) -> Vec<PixelFormat> {
            self.0.lock().unwrap().formats.clone()
        }

        fn set_output_orientation(&mut self, orientation: VideoOrientation) -> bool {
            self.0.lock().unwrap().output_orientation = Some(orientation);
            true
        }

        fn capture_photo(&mut self, settings: PhotoSettings, delivery: Sender<CaptureEvent>) {
            let mode = {
                let mut state = self.0.lock().unwrap();
                state.last_settings = Some(settings);
                state.delivery.clone()
            };
            let buffer = SampleBuffer {
                width: 4,
                height: 2,
                format: PixelFormat::Rgb24,
                data: vec![128; 4 * 2 * 3],
            };
            let resolved = ResolvedSettings {
                width: 4,
                height: 2,
                flash_fired: false,
            };
            match mode {
                Delivery::Both => {
                    let _ = delivery.send(CaptureEvent::PhotoProcessed(Ok(buffer)));
                    let _ = delivery.send(CaptureEvent::CaptureFinished(Ok(resolved)));
                }
                Delivery::PhaseTwoFails => {
                    let _ = delivery.send(CaptureEvent::PhotoProcessed(Ok(buffer)));
                    let _ = delivery.send(CaptureEvent::CaptureFinished(Err(
                        SnapfindError::Bridge("sensor fault".into()),
                    )));
                }
                Delivery::PhaseOneFails => {
                    let _ = delivery.send(CaptureEvent::PhotoProcessed(Err(
                        SnapfindError::Bridge("encode failed".into()),
                    )));
                    let _ = delivery.send(CaptureEvent::CaptureFinished(Ok(resolved)));
                }
                Delivery::Silent => {
                    // Keep the sender alive past the timeout.
                    std::mem::forget(delivery);
                }
            }
        }
    }

    fn core_with(state: FakeState) -> (SessionCore, Arc<Mutex<FakeState>>) {
        let (camera, shared) = FakeCamera::new(state);
        (
            SessionCore::new(Box::new(camera), Duration::from_millis(200)),
            shared,
        )
    }

    fn running_core(state: FakeState) -> (SessionCore, Arc<Mutex<FakeState>>) {
        let (mut core, shared) = core_with(state);
        core.configure().unwrap();
        core.start().unwrap();
        (core, shared)
    }

    #[test]
    fn configure_brackets_in_order() {
        let (mut core, shared) = core_with(FakeState::default());
        core.configure().unwrap();
        assert_eq!(
            shared.lock().unwrap().calls,
            vec!["begin", "preset:Photo", "add_input", "add_output", "commit"]
        );
        // Second configure is a no-op.
        core.configure().unwrap();
        assert_eq!(shared.lock().unwrap().calls.len(), 5);
    }

    #[test]
    fn rejected_output_adds_nothing() {
        let (mut core, shared) = core_with(FakeState {
            can_add_output: false,
            ..FakeState::default()
        });
        let err = core.configure().unwrap_err();
        assert!(matches!(err, SnapfindError::ConfigurationRejected(_)));
        assert!(shared.lock().unwrap().calls.is_empty());
        assert!(!core.is_configured());
    }

    #[test]
    fn rejected_input_adds_nothing() {
        let (mut core, shared) = core_with(FakeState {
            can_add_input: false,
            ..FakeState::default()
        });
        assert!(core.configure().is_err());
        assert!(shared.lock().unwrap().calls.is_empty());
    }

    #[test]
    fn missing_device_is_an_error() {
        let (mut core, _) = core_with(FakeState {
            has_device: false,
            ..FakeState::default()
        });
        assert!(matches!(
            core.configure(),
            Err(SnapfindError::DeviceUnavailable(_))
        ));
    }

    #[test]
    fn start_requires_configuration_and_is_idempotent() {
        let (mut core, shared) = core_with(FakeState::default());
        assert!(matches!(
            core.start(),
            Err(SnapfindError::ConfigurationRejected(_))
        ));

        core.configure().unwrap();
        core.start().unwrap();
        core.start().unwrap();
        core.stop();
        core.stop();

        let calls = shared.lock().unwrap().calls.clone();
        assert_eq!(calls.iter().filter(|c| *c == "start").count(), 1);
        assert_eq!(calls.iter().filter(|c| *c == "stop").count(), 1);
    }

    #[test]
    fn preview_orientation_follows_device() {
        let (mut core, _) = core_with(FakeState::default());
        assert_eq!(
            core.update_preview_orientation(DeviceOrientation::LandscapeLeft),
            VideoOrientation::LandscapeRight
        );
        // Flat keeps the last real orientation.
        assert_eq!(
            core.update_preview_orientation(DeviceOrientation::FaceUp),
            VideoOrientation::LandscapeRight
        );
        assert_eq!(
            core.update_preview_orientation(DeviceOrientation::LandscapeRight),
            VideoOrientation::LandscapeLeft
        );
    }

    #[test]
    fn settings_prefer_rgb48() {
        let (core, shared) = core_with(FakeState::default());
        let settings = core.photo_settings();
        assert_eq!(settings.pixel_format, Some(PixelFormat::Rgb48));
        assert!(settings.auto_still_image_stabilization);
        assert!(settings.high_resolution_photo);
        assert_eq!(settings.flash_mode, FlashMode::Auto);

        shared.lock().unwrap().formats = vec![PixelFormat::Bgra32, PixelFormat::Rgb24];
        assert_eq!(core.photo_settings().pixel_format, Some(PixelFormat::Bgra32));

        shared.lock().unwrap().formats.clear();
        assert_eq!(core.photo_settings().pixel_format, None);
    }

    #[test]
    fn snap_tags_orientation_and_syncs_output() {
        let (mut core, shared) = running_core(FakeState::default());
        core.update_preview_orientation(DeviceOrientation::Portrait);
        let image = core.snap_photo().unwrap();

        assert_eq!(image.orientation(), ImageOrientation::Right);
        assert_eq!(image.info.origin, ImageOrigin::LiveCapture);
        assert_eq!(image.display_dimensions(), (2, 4));
        assert_eq!(
            shared.lock().unwrap().output_orientation,
            Some(VideoOrientation::Portrait)
        );
    }

    #[test]
    fn phase_two_error_rejects_photo() {
        let (mut core, _) = running_core(FakeState {
            delivery: Delivery::PhaseTwoFails,
            ..FakeState::default()
        });
        assert!(matches!(
            core.snap_photo(),
            Err(SnapfindError::CaptureFailed(_))
        ));
    }

    #[test]
    fn phase_one_error_rejects_photo() {
        let (mut core, _) = running_core(FakeState {
            delivery: Delivery::PhaseOneFails,
            ..FakeState::default()
        });
        assert!(matches!(
            core.snap_photo(),
            Err(SnapfindError::CaptureFailed(_))
        ));
    }

    #[test]
    fn silent_camera_times_out() {
        let (mut core, _) = running_core(FakeState {
            delivery: Delivery::Silent,
            ..FakeState::default()
        });
        assert!(matches!(
            core.snap_photo(),
            Err(SnapfindError::TimedOut { .. })
        ));
    }

    #[test]
    fn snap_requires_running_session() {
        let (mut core, _) = core_with(FakeState::default());
        core.configure().unwrap();
        assert!(matches!(
            core.snap_photo(),
            Err(SnapfindError::CaptureFailed(_))
        ));
    }

    #[test]
    fn bgra_is_swizzled() {
        let image = sample_to_image(SampleBuffer {
            width: 1,
            height: 1,
            format: PixelFormat::Bgra32,
            data: vec![10, 20, 30, 255],
        })
        .unwrap();
        assert_eq!(image.to_rgba8().get_pixel(0, 0).0, [30, 20, 10, 255]);
    }

    #[test]
    fn rgb48_keeps_sixteen_bits() {
        let mut data = Vec::new();
        for sample in [1000u16, 2000, 65535] {
            data.extend_from_slice(&sample.to_ne_bytes());
        }
        let image = sample_to_image(SampleBuffer {
            width: 1,
            height: 1,
            format: PixelFormat::Rgb48,
            data,
        })
        .unwrap();
        let rgb16 = image.as_rgb16().unwrap();
        assert_eq!(rgb16.get_pixel(0, 0).0, [1000, 2000, 65535]);
    }

    #[test]
    fn short_buffer_is_rejected() {
        let err = sample_to_image(SampleBuffer {
            width: 2,
            height: 2,
            format: PixelFormat::Rgb24,
            data: vec![0; 5],
        })
        .unwrap_err();
        assert!(matches!(err, SnapfindError::CaptureFailed(_)));
    }

    #[tokio::test]
    async fn worker_session_round_trip() {
        let (camera, shared) = FakeCamera::new(FakeState::default());
        let session = CaptureSession::spawn(Box::new(camera), Duration::from_millis(200)).unwrap();

        assert!(session.start().await.is_err());
        session.configure().await.unwrap();
        session.start().await.unwrap();
        assert!(session.is_running().await.unwrap());

        let orientation = session
            .update_preview_orientation(DeviceOrientation::LandscapeLeft)
            .await
            .unwrap();
        assert_eq!(orientation, VideoOrientation::LandscapeRight);

        let image = session.snap_photo().await.unwrap();
        assert_eq!(image.orientation(), ImageOrientation::Up);

        drop(session);
        assert!(!shared.lock().unwrap().running);
    }
}
