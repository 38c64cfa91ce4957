pub mod api;
pub mod camera;
pub mod config;
pub mod error;
pub mod feed;
pub mod form;
pub mod frame;
pub mod geo;
pub mod map;
pub mod photo;

pub use api::{
    ApiMessage, CredentialProvider, HttpStoryApi, LoginResult, StaticCredentials, Story,
    StoryCatalog, StorySubmitter, SubmissionPayload, TokenStore,
};
pub use camera::{
    CameraDevice, CameraPhase, CameraPolicy, CameraSession, CameraSessionBuilder, CapturedImage,
    FacingMode, SyntheticCamera, VideoSink, VideoStream,
};
pub use config::StorycamConfig;
pub use error::{
    CameraError, FormError, FormField, GeolocationError, MapError, PhotoError, Result,
    StorycamError, SubmissionError, UserFacing,
};
pub use feed::{FeedSummary, StoryFeed};
pub use form::{ConsoleView, FormOptions, FormView, Route, StatusKind, StorySubmissionForm};
pub use frame::{FrameFormat, VideoFrame};
pub use geo::{LatLngBounds, SelectedLocation};
pub use map::{
    FixedGeolocation, GeolocationProvider, LocationPicker, MapBackend, MapMode, MemoryMap,
    PickerOptions,
};
pub use photo::{PhotoFile, PhotoInput, PhotoMode, PhotoSource};
