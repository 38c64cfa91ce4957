use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use super::captured::CapturedImage;
use super::device::{
    CameraDevice, FacingMode, StreamInfo, VideoConstraints, VideoSink, VideoStream,
};
use crate::config::CameraConfig;
use crate::error::{CameraError, DeviceAccessError};

/// Displayed state of a camera session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraPhase {
    Idle,
    Starting,
    Live,
    Previewing,
}

/// Tunables for stream requests and stills
#[derive(Debug, Clone)]
pub struct CameraPolicy {
    pub ideal_resolution: (u32, u32),
    pub jpeg_quality: u8,
    /// Retry once with the front camera when the rear camera is missing
    pub front_camera_fallback: bool,
    pub initial_facing: FacingMode,
}

impl Default for CameraPolicy {
    fn default() -> Self {
        Self {
            ideal_resolution: (1280, 720),
            jpeg_quality: 80,
            front_camera_fallback: true,
            initial_facing: FacingMode::Environment,
        }
    }
}

impl From<&CameraConfig> for CameraPolicy {
    fn from(config: &CameraConfig) -> Self {
        Self {
            ideal_resolution: config.ideal_resolution,
            jpeg_quality: config.jpeg_quality,
            front_camera_fallback: config.front_camera_fallback,
            initial_facing: config.default_facing,
        }
    }
}

struct SessionState {
    stream: Option<Box<dyn VideoStream>>,
    facing: FacingMode,
    captured: Option<CapturedImage>,
}

struct SessionInner {
    device: Arc<dyn CameraDevice>,
    sink: Arc<dyn VideoSink>,
    policy: CameraPolicy,
    // Held for the whole of every operation, so operations never interleave
    state: Mutex<SessionState>,
    phase: watch::Sender<CameraPhase>,
    closed: AtomicBool,
}

/// Owns at most one live device stream and the still captured from it.
///
/// Cloning yields another handle to the same session.
#[derive(Clone)]
pub struct CameraSession {
    inner: Arc<SessionInner>,
}

impl CameraSession {
    pub fn new(
        device: Arc<dyn CameraDevice>,
        sink: Arc<dyn VideoSink>,
        policy: CameraPolicy,
    ) -> Self {
        let (phase, _) = watch::channel(CameraPhase::Idle);
        let facing = policy.initial_facing;

        Self {
            inner: Arc::new(SessionInner {
                device,
                sink,
                policy,
                state: Mutex::new(SessionState {
                    stream: None,
                    facing,
                    captured: None,
                }),
                phase,
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn phase(&self) -> CameraPhase {
        *self.inner.phase.borrow()
    }

    /// Watch phase transitions
    pub fn subscribe(&self) -> watch::Receiver<CameraPhase> {
        self.inner.phase.subscribe()
    }

    /// True while another operation holds the session
    pub fn is_busy(&self) -> bool {
        self.inner.state.try_lock().is_err()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub fn policy(&self) -> &CameraPolicy {
        &self.inner.policy
    }

    pub async fn facing(&self) -> FacingMode {
        self.inner.state.lock().await.facing
    }

    pub async fn captured_image(&self) -> Option<CapturedImage> {
        self.inner.state.lock().await.captured.clone()
    }

    /// Id and facing of the live stream, if any
    pub async fn active_stream(&self) -> Option<StreamInfo> {
        let state = self.inner.state.lock().await;
        state
            .stream
            .as_ref()
            .filter(|stream| stream.is_live())
            .map(|stream| stream.info())
    }

    /// Open a stream for `facing`, releasing any current stream first
    pub async fn start(&self, facing: FacingMode) -> Result<StreamInfo, CameraError> {
        let mut state = self.inner.state.lock().await;
        self.ensure_open()?;
        self.open_stream(&mut state, facing).await
    }

    /// Release the stream; safe to call when already stopped
    pub async fn stop(&self) {
        let mut state = self.inner.state.lock().await;
        self.release_stream(&mut state);
        self.set_phase(CameraPhase::Idle);
    }

    /// Toggle facing and restart on the other camera
    pub async fn switch_facing(&self) -> Result<StreamInfo, CameraError> {
        let mut state = self.inner.state.lock().await;
        self.ensure_open()?;
        let next = state.facing.toggled();
        info!("Switching camera from {} to {}", state.facing, next);
        self.open_stream(&mut state, next).await
    }

    /// Freeze the current frame into a JPEG still. The stream keeps running.
    pub async fn capture(&self) -> Result<CapturedImage, CameraError> {
        let mut state = self.inner.state.lock().await;
        self.ensure_open()?;

        let stream = state
            .stream
            .as_ref()
            .filter(|stream| stream.is_live())
            .ok_or(CameraError::NotActive)?;
        let frame = stream.current_frame().ok_or(CameraError::FrameNotReady)?;
        if !frame.has_dimensions() {
            return Err(CameraError::FrameNotReady);
        }

        let (width, height) = (frame.width, frame.height);
        let quality = self.inner.policy.jpeg_quality;
        let jpeg = tokio::task::spawn_blocking(move || frame.encode_jpeg(quality))
            .await
            .map_err(|e| CameraError::Encoding {
                details: format!("encoder task failed: {}", e),
            })??;

        let image = CapturedImage::from_jpeg(&jpeg, width, height);
        state.captured = Some(image.clone());
        self.set_phase(CameraPhase::Previewing);

        info!("Captured {}x{} still ({} bytes)", width, height, jpeg.len());
        Ok(image)
    }

    /// Drop the captured still and go back to a fresh live stream
    pub async fn retake(&self) -> Result<StreamInfo, CameraError> {
        let mut state = self.inner.state.lock().await;
        self.ensure_open()?;
        state.captured = None;
        let facing = state.facing;
        self.open_stream(&mut state, facing).await
    }

    /// Release everything and refuse further starts. Idempotent.
    pub async fn destroy(&self) {
        if !self.inner.closed.swap(true, Ordering::SeqCst) {
            debug!("Closing camera session");
        }

        let mut state = self.inner.state.lock().await;
        self.release_stream(&mut state);
        state.captured = None;
        self.set_phase(CameraPhase::Idle);
    }

    fn ensure_open(&self) -> Result<(), CameraError> {
        if self.is_closed() {
            Err(CameraError::SessionClosed)
        } else {
            Ok(())
        }
    }

    fn set_phase(&self, phase: CameraPhase) {
        let previous = self.inner.phase.send_replace(phase);
        if previous != phase {
            debug!("Camera phase {:?} -> {:?}", previous, phase);
        }
    }

    fn release_stream(&self, state: &mut SessionState) {
        if let Some(stream) = state.stream.take() {
            stream.stop_tracks();
            self.inner.sink.detach();
            debug!("Released camera stream {}", stream.id());
        }
    }

    async fn open_stream(
        &self,
        state: &mut SessionState,
        facing: FacingMode,
    ) -> Result<StreamInfo, CameraError> {
        self.release_stream(state);
        state.facing = facing;
        self.set_phase(CameraPhase::Starting);

        let stream = match self.request_with_fallback(facing).await {
            Ok(stream) => stream,
            Err(_) if self.is_closed() => {
                debug!("Camera request for {} answered after close", facing);
                self.set_phase(CameraPhase::Idle);
                return Err(CameraError::SessionClosed);
            }
            Err(e) => {
                warn!("Failed to start camera ({}): {}", facing, e);
                self.set_phase(CameraPhase::Idle);
                return Err(e);
            }
        };

        // The session may have been torn down while the grant was pending
        if self.is_closed() {
            debug!("Discarding stream {} granted after close", stream.id());
            stream.stop_tracks();
            self.set_phase(CameraPhase::Idle);
            return Err(CameraError::SessionClosed);
        }

        let info = stream.info();
        self.inner.sink.attach(&info);
        state.facing = info.facing;
        state.stream = Some(stream);
        self.set_phase(CameraPhase::Live);

        info!("Camera live on {} stream {}", info.facing, info.id);
        Ok(info)
    }

    async fn request_with_fallback(
        &self,
        facing: FacingMode,
    ) -> Result<Box<dyn VideoStream>, CameraError> {
        let policy = &self.inner.policy;
        let constraints = VideoConstraints::video_only(facing, policy.ideal_resolution);

        match self.inner.device.request_video_stream(&constraints).await {
            Ok(stream) => Ok(stream),
            Err(DeviceAccessError::NotFound)
                if facing == FacingMode::Environment
                    && policy.front_camera_fallback
                    && !self.is_closed() =>
            {
                info!("No rear camera found, retrying with the front camera");
                let fallback =
                    VideoConstraints::video_only(FacingMode::User, policy.ideal_resolution);
                self.inner
                    .device
                    .request_video_stream(&fallback)
                    .await
                    .map_err(|e| CameraError::from_device(e, FacingMode::User))
            }
            Err(e) => Err(CameraError::from_device(e, facing)),
        }
    }
}
