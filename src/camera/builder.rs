use std::sync::Arc;

use super::device::{CameraDevice, NullSink, VideoSink};
use super::session::{CameraPolicy, CameraSession};
use crate::config::CameraConfig;
use crate::error::{Result, StorycamError};

/// Builder for camera sessions
pub struct CameraSessionBuilder {
    device: Option<Arc<dyn CameraDevice>>,
    sink: Option<Arc<dyn VideoSink>>,
    policy: CameraPolicy,
}

impl CameraSessionBuilder {
    pub fn new() -> Self {
        Self {
            device: None,
            sink: None,
            policy: CameraPolicy::default(),
        }
    }

    pub fn device(mut self, device: Arc<dyn CameraDevice>) -> Self {
        self.device = Some(device);
        self
    }

    pub fn sink(mut self, sink: Arc<dyn VideoSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(mut self, config: &CameraConfig) -> Self {
        self.policy = CameraPolicy::from(config);
        self
    }

    pub fn policy(mut self, policy: CameraPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Disable the rear-to-front retry, e.g. for rigs with a single camera
    pub fn without_front_fallback(mut self) -> Self {
        self.policy.front_camera_fallback = false;
        self
    }

    pub fn build(self) -> Result<CameraSession> {
        let device = self
            .device
            .ok_or_else(|| StorycamError::system("Camera device must be specified"))?;
        let sink = self.sink.unwrap_or_else(|| Arc::new(NullSink));

        Ok(CameraSession::new(device, sink, self.policy))
    }
}

impl Default for CameraSessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}
