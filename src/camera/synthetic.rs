use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, trace};
use uuid::Uuid;

use super::device::{CameraDevice, FacingMode, VideoConstraints, VideoStream};
use crate::error::DeviceAccessError;
use crate::frame::{FrameFormat, VideoFrame};

/// Test-pattern camera for machines without capture hardware.
///
/// Streams render a gradient that differs per facing mode. The device keeps
/// count of streams whose tracks are still running, so callers can verify
/// that nothing leaks.
pub struct SyntheticCamera {
    facings: HashSet<FacingMode>,
    native_resolution: (u32, u32),
    grant_delay: Duration,
    renders_frames: bool,
    scripted_failures: Mutex<VecDeque<DeviceAccessError>>,
    requests: Mutex<Vec<FacingMode>>,
    live_streams: Arc<AtomicUsize>,
    opened_streams: AtomicUsize,
}

impl SyntheticCamera {
    /// Device with both a rear and a front camera
    pub fn new() -> Self {
        Self::with_facings(&[FacingMode::Environment, FacingMode::User])
    }

    /// Device exposing only the given cameras
    pub fn with_facings(facings: &[FacingMode]) -> Self {
        Self {
            facings: facings.iter().copied().collect(),
            native_resolution: (1920, 1080),
            grant_delay: Duration::ZERO,
            renders_frames: true,
            scripted_failures: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            live_streams: Arc::new(AtomicUsize::new(0)),
            opened_streams: AtomicUsize::new(0),
        }
    }

    pub fn native_resolution(mut self, width: u32, height: u32) -> Self {
        self.native_resolution = (width, height);
        self
    }

    /// Delay before a stream request is granted
    pub fn grant_delay(mut self, delay: Duration) -> Self {
        self.grant_delay = delay;
        self
    }

    /// Streams that never produce a frame (a video element still at 0x0)
    pub fn without_frames(mut self) -> Self {
        self.renders_frames = false;
        self
    }

    /// Fail the next stream request with `error`
    pub fn fail_next(&self, error: DeviceAccessError) {
        self.scripted_failures.lock().push_back(error);
    }

    /// Number of streams whose tracks have not been stopped
    pub fn live_stream_count(&self) -> usize {
        self.live_streams.load(Ordering::SeqCst)
    }

    /// Number of streams ever granted
    pub fn opened_stream_count(&self) -> usize {
        self.opened_streams.load(Ordering::SeqCst)
    }

    /// Facing modes requested so far, in order
    pub fn requested_facings(&self) -> Vec<FacingMode> {
        self.requests.lock().clone()
    }
}

impl Default for SyntheticCamera {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CameraDevice for SyntheticCamera {
    async fn request_video_stream(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn VideoStream>, DeviceAccessError> {
        self.requests.lock().push(constraints.facing);

        if !self.grant_delay.is_zero() {
            tokio::time::sleep(self.grant_delay).await;
        }

        if let Some(error) = self.scripted_failures.lock().pop_front() {
            debug!("Synthetic camera failing request: {}", error);
            return Err(error);
        }

        if constraints.audio {
            return Err(DeviceAccessError::Type(
                "synthetic camera has no audio track".to_string(),
            ));
        }

        if !self.facings.contains(&constraints.facing) {
            return Err(DeviceAccessError::NotFound);
        }

        let width = constraints.ideal_width.min(self.native_resolution.0);
        let height = constraints.ideal_height.min(self.native_resolution.1);

        self.live_streams.fetch_add(1, Ordering::SeqCst);
        self.opened_streams.fetch_add(1, Ordering::SeqCst);

        let stream = SyntheticStream {
            id: Uuid::new_v4().to_string(),
            facing: constraints.facing,
            width,
            height,
            renders_frames: self.renders_frames,
            live: AtomicBool::new(true),
            frame_counter: AtomicU64::new(0),
            live_streams: Arc::clone(&self.live_streams),
        };

        debug!(
            "Synthetic camera granted stream {} ({}, {}x{})",
            stream.id, stream.facing, width, height
        );

        Ok(Box::new(stream))
    }
}

struct SyntheticStream {
    id: String,
    facing: FacingMode,
    width: u32,
    height: u32,
    renders_frames: bool,
    live: AtomicBool,
    frame_counter: AtomicU64,
    live_streams: Arc<AtomicUsize>,
}

impl VideoStream for SyntheticStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn facing(&self) -> FacingMode {
        self.facing
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        if !self.is_live() || !self.renders_frames {
            return None;
        }

        let frame_id = self.frame_counter.fetch_add(1, Ordering::Relaxed);
        let tint = match self.facing {
            FacingMode::Environment => 0u8,
            FacingMode::User => 128u8,
        };

        let mut data = Vec::with_capacity((self.width * self.height * 3) as usize);
        for y in 0..self.height {
            for x in 0..self.width {
                data.push((x * 255 / self.width.max(1)) as u8);
                data.push((y * 255 / self.height.max(1)) as u8);
                data.push(tint.wrapping_add((frame_id % 64) as u8));
            }
        }

        trace!(
            "Generated synthetic frame {} ({}x{}, {} bytes)",
            frame_id,
            self.width,
            self.height,
            data.len()
        );

        Some(VideoFrame::new(
            frame_id,
            SystemTime::now(),
            data,
            self.width,
            self.height,
            FrameFormat::Rgb24,
        ))
    }

    fn stop_tracks(&self) {
        if self.live.swap(false, Ordering::SeqCst) {
            self.live_streams.fetch_sub(1, Ordering::SeqCst);
            debug!("Stopped tracks of synthetic stream {}", self.id);
        }
    }
}
