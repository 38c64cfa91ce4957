use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DeviceAccessError;
use crate::frame::VideoFrame;

/// Which physical camera a capture session targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Rear camera
    Environment,
    /// Front camera
    User,
}

impl FacingMode {
    pub fn toggled(self) -> Self {
        match self {
            FacingMode::Environment => FacingMode::User,
            FacingMode::User => FacingMode::Environment,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FacingMode::Environment => "environment",
            FacingMode::User => "user",
        }
    }
}

impl fmt::Display for FacingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FacingMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "environment" | "rear" | "back" => Ok(FacingMode::Environment),
            "user" | "front" => Ok(FacingMode::User),
            other => Err(format!("unknown facing mode '{}'", other)),
        }
    }
}

/// Constraints for a video-only stream request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoConstraints {
    pub facing: FacingMode,
    pub ideal_width: u32,
    pub ideal_height: u32,
    pub audio: bool,
}

impl VideoConstraints {
    pub fn video_only(facing: FacingMode, ideal_resolution: (u32, u32)) -> Self {
        Self {
            facing,
            ideal_width: ideal_resolution.0,
            ideal_height: ideal_resolution.1,
            audio: false,
        }
    }
}

/// Description of a stream handed to a video sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamInfo {
    pub id: String,
    pub facing: FacingMode,
}

/// Camera device capability (the platform's media-device API)
#[async_trait]
pub trait CameraDevice: Send + Sync {
    /// Request a video stream; the returned stream is live until its tracks are stopped.
    async fn request_video_stream(
        &self,
        constraints: &VideoConstraints,
    ) -> Result<Box<dyn VideoStream>, DeviceAccessError>;
}

/// An open device stream
pub trait VideoStream: Send + Sync {
    fn id(&self) -> &str;

    fn facing(&self) -> FacingMode;

    /// True until `stop_tracks` is called
    fn is_live(&self) -> bool;

    /// Latest frame, `None` while the stream has not rendered anything yet
    fn current_frame(&self) -> Option<VideoFrame>;

    /// Stop every track of the stream; calling it again is a no-op
    fn stop_tracks(&self);

    fn info(&self) -> StreamInfo {
        StreamInfo {
            id: self.id().to_string(),
            facing: self.facing(),
        }
    }
}

/// Where a live stream is rendered (a video element, a preview window...)
pub trait VideoSink: Send + Sync {
    fn attach(&self, stream: &StreamInfo);

    fn detach(&self);
}

/// Sink for headless sessions
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl VideoSink for NullSink {
    fn attach(&self, stream: &StreamInfo) {
        tracing::trace!("Null sink ignoring stream {}", stream.id);
    }

    fn detach(&self) {}
}
