mod builder;
mod captured;
mod device;
mod session;
mod synthetic;
#[cfg(test)]
mod tests;

pub use builder::CameraSessionBuilder;
pub use captured::{CapturedImage, CAPTURED_FILENAME};
pub use device::{
    CameraDevice, FacingMode, NullSink, StreamInfo, VideoConstraints, VideoSink, VideoStream,
};
pub use session::{CameraPhase, CameraPolicy, CameraSession};
pub use synthetic::SyntheticCamera;
