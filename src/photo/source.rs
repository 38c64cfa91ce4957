use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::data_url;
use crate::camera::{CapturedImage, CAPTURED_FILENAME};
use crate::error::PhotoError;

/// Upload limit applied when nothing else is configured
pub const MAX_PHOTO_BYTES: u64 = 1024 * 1024;

/// A named binary blob ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhotoFile {
    name: String,
    mime: String,
    bytes: Arc<Vec<u8>>,
}

impl PhotoFile {
    pub fn new(name: impl Into<String>, mime: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.into(),
            bytes: Arc::new(bytes),
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self, PhotoError> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo".to_string());
        let mime = mime_from_extension(path);

        debug!("Read {} ({}, {} bytes)", name, mime, bytes.len());
        Ok(Self::new(name, mime, bytes))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.mime.trim().to_ascii_lowercase().starts_with("image/")
    }

    pub fn to_data_url(&self) -> String {
        data_url::encode(&self.mime, &self.bytes)
    }
}

fn mime_from_extension(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "heic" => "image/heic",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}

/// Which input control is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhotoMode {
    File,
    Camera,
}

/// The photo that would be submitted right now
#[derive(Debug, Clone, PartialEq)]
pub enum PhotoInput {
    File { file: PhotoFile, preview: String },
    Camera {
        image: CapturedImage,
        file: PhotoFile,
    },
}

impl PhotoInput {
    pub fn kind(&self) -> PhotoMode {
        match self {
            PhotoInput::File { .. } => PhotoMode::File,
            PhotoInput::Camera { .. } => PhotoMode::Camera,
        }
    }

    pub fn file(&self) -> &PhotoFile {
        match self {
            PhotoInput::File { file, .. } | PhotoInput::Camera { file, .. } => file,
        }
    }

    pub fn preview_data_url(&self) -> &str {
        match self {
            PhotoInput::File { preview, .. } => preview,
            PhotoInput::Camera { image, .. } => image.data_url(),
        }
    }
}

/// Holds the current photo input.
///
/// Last write wins: a valid file or capture replaces whatever was there, and
/// switching modes leaves the stored input alone.
#[derive(Debug)]
pub struct PhotoSource {
    max_bytes: u64,
    mode: PhotoMode,
    current: Option<PhotoInput>,
}

impl PhotoSource {
    pub fn new() -> Self {
        Self::with_limit(MAX_PHOTO_BYTES)
    }

    pub fn with_limit(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            mode: PhotoMode::File,
            current: None,
        }
    }

    pub fn limit(&self) -> u64 {
        self.max_bytes
    }

    pub fn mode(&self) -> PhotoMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: PhotoMode) {
        if self.mode != mode {
            debug!("Photo input mode {:?} -> {:?}", self.mode, mode);
            self.mode = mode;
        }
    }

    pub fn current(&self) -> Option<&PhotoInput> {
        self.current.as_ref()
    }

    /// Validate an uploaded file. On failure the current input is kept.
    pub fn from_file(&mut self, file: PhotoFile) -> Result<&PhotoInput, PhotoError> {
        if file.size() > self.max_bytes {
            warn!(
                "Rejected {}: {} bytes exceeds {} byte limit",
                file.name(),
                file.size(),
                self.max_bytes
            );
            return Err(PhotoError::FileTooLarge {
                size: file.size(),
                limit: self.max_bytes,
            });
        }

        if !file.is_image() {
            warn!("Rejected non-image file {} ({})", file.name(), file.mime());
            return Err(PhotoError::InvalidFileType {
                mime: file.mime().to_string(),
            });
        }

        info!("Selected photo {} ({} bytes)", file.name(), file.size());
        let preview = file.to_data_url();
        Ok(self.current.insert(PhotoInput::File { file, preview }))
    }

    /// Turn a camera still into an uploadable `camera-photo.jpg`
    pub fn from_captured_image(&mut self, image: CapturedImage) -> Result<&PhotoInput, PhotoError> {
        let (mime, bytes) = data_url::decode(image.data_url())?;
        if bytes.is_empty() {
            return Err(PhotoError::EmptyImage);
        }

        let file = PhotoFile::new(CAPTURED_FILENAME, mime, bytes);
        info!("Using captured photo ({} bytes)", file.size());
        Ok(self.current.insert(PhotoInput::Camera { image, file }))
    }

    /// Forget an uploaded file; a camera capture is left in place
    pub fn remove_file(&mut self) -> bool {
        self.take_if(PhotoMode::File)
    }

    /// Forget a camera capture; an uploaded file is left in place
    pub fn discard_capture(&mut self) -> bool {
        self.take_if(PhotoMode::Camera)
    }

    fn take_if(&mut self, kind: PhotoMode) -> bool {
        if self.current.as_ref().map(PhotoInput::kind) == Some(kind) {
            self.current = None;
            true
        } else {
            false
        }
    }
}

impl Default for PhotoSource {
    fn default() -> Self {
        Self::new()
    }
}
