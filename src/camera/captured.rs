use chrono::{DateTime, Utc};

use crate::photo::data_url;

/// Name given to stills produced by the camera when they are uploaded
pub const CAPTURED_FILENAME: &str = "camera-photo.jpg";

/// A still frozen from the live camera, held as a `data:` URL
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedImage {
    data_url: String,
    width: u32,
    height: u32,
    captured_at: DateTime<Utc>,
}

impl CapturedImage {
    pub fn from_jpeg(jpeg: &[u8], width: u32, height: u32) -> Self {
        Self {
            data_url: data_url::encode("image/jpeg", jpeg),
            width,
            height,
            captured_at: Utc::now(),
        }
    }

    /// Wrap an already encoded data URL (e.g. produced by a canvas)
    pub fn from_data_url(data_url: impl Into<String>, width: u32, height: u32) -> Self {
        Self {
            data_url: data_url.into(),
            width,
            height,
            captured_at: Utc::now(),
        }
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// MIME type declared in the data URL header
    pub fn mime(&self) -> Option<&str> {
        data_url::mime_of(&self.data_url)
    }

    pub fn filename(&self) -> &'static str {
        CAPTURED_FILENAME
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }
}
