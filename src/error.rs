use thiserror::Error;

use crate::camera::FacingMode;

#[derive(Error, Debug)]
pub enum StorycamError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Geolocation error: {0}")]
    Geolocation(#[from] GeolocationError),

    #[error("Map error: {0}")]
    Map(#[from] MapError),

    #[error("Photo error: {0}")]
    Photo(#[from] PhotoError),

    #[error("Submission error: {0}")]
    Submission(#[from] SubmissionError),

    #[error("Form error: {0}")]
    Form(#[from] FormError),

    #[error("System error: {message}")]
    System { message: String },
}

impl StorycamError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }
}

/// Failures reported by a camera device when a stream is requested.
///
/// Variants mirror the error names raised by media-device APIs so adapters can
/// translate them with [`DeviceAccessError::from_name`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceAccessError {
    #[error("permission to use the camera was not granted")]
    NotAllowed,

    #[error("no camera matches the requested facing mode")]
    NotFound,

    #[error("the camera could not be read: {0}")]
    NotReadable(String),

    #[error("constraint '{constraint}' cannot be satisfied")]
    Overconstrained { constraint: String },

    #[error("invalid constraints: {0}")]
    Type(String),

    #[error("{0}")]
    Other(String),
}

impl DeviceAccessError {
    /// Translate a media-device error name (e.g. `NotAllowedError`).
    pub fn from_name(name: &str, message: &str) -> Self {
        match name {
            "NotAllowedError" | "SecurityError" | "PermissionDeniedError" => Self::NotAllowed,
            "NotFoundError" | "DevicesNotFoundError" => Self::NotFound,
            "NotReadableError" | "TrackStartError" | "AbortError" => {
                Self::NotReadable(message.to_string())
            }
            "OverconstrainedError" | "ConstraintNotSatisfiedError" => Self::Overconstrained {
                constraint: message.to_string(),
            },
            "TypeError" => Self::Type(message.to_string()),
            _ => Self::Other(format!("{}: {}", name, message)),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CameraError {
    #[error("Camera access was denied")]
    PermissionDenied,

    #[error("No camera found for facing mode {facing}")]
    DeviceNotFound { facing: FacingMode },

    #[error("Camera is already in use: {details}")]
    DeviceBusy { details: String },

    #[error("Camera cannot satisfy constraint: {constraint}")]
    ConstraintsUnsatisfiable { constraint: String },

    #[error("Invalid camera constraints: {details}")]
    InvalidConstraints { details: String },

    #[error("Camera is not active")]
    NotActive,

    #[error("Camera is not ready. Please wait a moment and try again.")]
    FrameNotReady,

    #[error("Failed to encode captured frame: {details}")]
    Encoding { details: String },

    #[error("Camera session has been closed")]
    SessionClosed,

    #[error("Failed to access camera: {details}")]
    Device { details: String },
}

impl CameraError {
    /// Map a device-level failure for a request that targeted `facing`.
    pub fn from_device(error: DeviceAccessError, facing: FacingMode) -> Self {
        match error {
            DeviceAccessError::NotAllowed => Self::PermissionDenied,
            DeviceAccessError::NotFound => Self::DeviceNotFound { facing },
            DeviceAccessError::NotReadable(details) => Self::DeviceBusy { details },
            DeviceAccessError::Overconstrained { constraint } => {
                Self::ConstraintsUnsatisfiable { constraint }
            }
            DeviceAccessError::Type(details) => Self::InvalidConstraints { details },
            DeviceAccessError::Other(details) => Self::Device { details },
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeolocationError {
    #[error("Geolocation is not supported by this device")]
    Unsupported,

    #[error("Permission to read the current location was denied")]
    PermissionDenied,

    #[error("Current location is unavailable")]
    Unavailable,

    #[error("Timed out while reading the current location")]
    Timeout,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MapError {
    #[error("Map has not been initialized")]
    NotInitialized,

    #[error("Invalid coordinates ({lat}, {lon})")]
    InvalidCoordinates { lat: f64, lon: f64 },

    #[error("Unknown map instance {0}")]
    UnknownMap(u64),

    #[error("Map backend error: {0}")]
    Backend(String),
}

#[derive(Error, Debug)]
pub enum PhotoError {
    #[error("File size exceeds {limit} byte limit ({size} bytes)")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("Please select an image file (got '{mime}')")]
    InvalidFileType { mime: String },

    #[error("Malformed data URL: {details}")]
    MalformedDataUrl { details: String },

    #[error("Captured image is empty")]
    EmptyImage,

    #[error("Failed to read photo: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum SubmissionError {
    #[error("{message}")]
    SubmissionFailed { message: String },

    #[error("No response from server. Please check your internet connection.")]
    NetworkUnavailable,

    #[error("You need to log in before sharing a story")]
    Unauthenticated,

    #[error("Unexpected response from server: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for SubmissionError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_connect() || error.is_timeout() || error.is_request() {
            Self::NetworkUnavailable
        } else if error.is_decode() {
            Self::Decode(error.to_string())
        } else {
            Self::SubmissionFailed {
                message: error.to_string(),
            }
        }
    }
}

/// Form field that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Description,
    Photo,
    Location,
}

impl FormField {
    pub fn prompt(&self) -> &'static str {
        match self {
            FormField::Description => "Please enter a description",
            FormField::Photo => "Please select a photo",
            FormField::Location => "Please select a location on the map",
        }
    }
}

impl std::fmt::Display for FormField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FormField::Description => "description",
            FormField::Photo => "photo",
            FormField::Location => "location",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum FormError {
    #[error("{}", field.prompt())]
    Validation { field: FormField },

    #[error(transparent)]
    Submission(#[from] SubmissionError),
}

/// User-visible rendering of errors surfaced on a status line.
pub trait UserFacing {
    fn is_recoverable(&self) -> bool;
    fn user_message(&self) -> String;
}

impl UserFacing for CameraError {
    fn is_recoverable(&self) -> bool {
        !matches!(self, CameraError::SessionClosed)
    }

    fn user_message(&self) -> String {
        match self {
            CameraError::DeviceNotFound { .. } => "No camera found".to_string(),
            CameraError::DeviceBusy { .. } => "Camera is already in use".to_string(),
            other => other.to_string(),
        }
    }
}

impl UserFacing for PhotoError {
    fn is_recoverable(&self) -> bool {
        true
    }

    fn user_message(&self) -> String {
        match self {
            PhotoError::FileTooLarge { limit, .. } if *limit == 1024 * 1024 => {
                "Error: File size exceeds 1MB limit".to_string()
            }
            PhotoError::FileTooLarge { limit, .. } => {
                format!("Error: File size exceeds {} byte limit", limit)
            }
            PhotoError::InvalidFileType { .. } => "Error: Please select an image file".to_string(),
            other => format!("Error: {}", other),
        }
    }
}

impl UserFacing for GeolocationError {
    fn is_recoverable(&self) -> bool {
        !matches!(self, GeolocationError::Unsupported)
    }

    fn user_message(&self) -> String {
        format!("Error getting current location: {}", self)
    }
}

impl UserFacing for SubmissionError {
    fn is_recoverable(&self) -> bool {
        !matches!(self, SubmissionError::Unauthenticated)
    }

    fn user_message(&self) -> String {
        self.to_string()
    }
}

pub type Result<T> = std::result::Result<T, StorycamError>;
