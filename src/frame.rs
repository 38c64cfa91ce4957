use image::codecs::jpeg::JpegEncoder;
use image::{ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::SystemTime;

use crate::error::CameraError;

/// Pixel layout of a frame delivered by a video stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameFormat {
    /// Motion JPEG format - compressed JPEG frames
    Mjpeg,
    /// RGB24 format - uncompressed RGB data
    Rgb24,
    /// RGBA32 format - uncompressed RGB data with alpha
    Rgba32,
}

impl FrameFormat {
    /// Get bytes per pixel for the format
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            FrameFormat::Mjpeg => 0, // Variable size, compressed
            FrameFormat::Rgb24 => 3,
            FrameFormat::Rgba32 => 4,
        }
    }

    /// Check if format is compressed
    pub fn is_compressed(&self) -> bool {
        matches!(self, FrameFormat::Mjpeg)
    }
}

/// A single frame read from a live video stream
#[derive(Debug, Clone)]
pub struct VideoFrame {
    /// Unique frame identifier within its stream
    pub id: u64,
    /// Timestamp when frame was produced
    pub timestamp: SystemTime,
    /// Raw frame data (shared ownership for efficiency)
    pub data: Arc<Vec<u8>>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Frame format
    pub format: FrameFormat,
}

impl VideoFrame {
    /// Create a new frame
    pub fn new(
        id: u64,
        timestamp: SystemTime,
        data: Vec<u8>,
        width: u32,
        height: u32,
        format: FrameFormat,
    ) -> Self {
        Self {
            id,
            timestamp,
            data: Arc::new(data),
            width,
            height,
            format,
        }
    }

    /// Get the expected frame size for uncompressed formats
    pub fn expected_size(&self) -> Option<usize> {
        if self.format.is_compressed() {
            None
        } else {
            let pixels = self.width as usize * self.height as usize;
            Some(pixels * self.format.bytes_per_pixel())
        }
    }

    /// Validate frame data size against expected size
    pub fn validate_size(&self) -> bool {
        match self.expected_size() {
            Some(expected) => self.data.len() == expected,
            None => !self.data.is_empty(),
        }
    }

    /// A frame with zero dimensions has not been rendered yet
    pub fn has_dimensions(&self) -> bool {
        self.width > 0 && self.height > 0
    }

    /// Encode this frame as a JPEG at its native resolution.
    ///
    /// `quality` is on the 1..=100 scale used by the `image` encoder.
    pub fn encode_jpeg(&self, quality: u8) -> Result<Vec<u8>, CameraError> {
        if !self.has_dimensions() {
            return Err(CameraError::FrameNotReady);
        }
        if !self.validate_size() {
            return Err(CameraError::Encoding {
                details: format!(
                    "frame {} has {} bytes, expected {:?}",
                    self.id,
                    self.data.len(),
                    self.expected_size()
                ),
            });
        }

        let rgb = self.to_rgb_image()?;

        let mut buf = Vec::new();
        let mut encoder = JpegEncoder::new_with_quality(&mut buf, quality.clamp(1, 100));
        encoder
            .encode_image(&rgb)
            .map_err(|e| CameraError::Encoding {
                details: e.to_string(),
            })?;

        tracing::trace!(
            "Encoded frame {} ({}x{}) to {} JPEG bytes at quality {}",
            self.id,
            self.width,
            self.height,
            buf.len(),
            quality
        );

        Ok(buf)
    }

    fn to_rgb_image(&self) -> Result<RgbImage, CameraError> {
        let rgb = match self.format {
            FrameFormat::Mjpeg => image::load_from_memory_with_format(&self.data, ImageFormat::Jpeg)
                .map_err(|e| CameraError::Encoding {
                    details: format!("JPEG decode failed: {}", e),
                })?
                .to_rgb8(),
            FrameFormat::Rgb24 => RgbImage::from_raw(self.width, self.height, self.data.to_vec())
                .ok_or_else(|| CameraError::Encoding {
                    details: "RGB buffer does not match frame dimensions".to_string(),
                })?,
            FrameFormat::Rgba32 => {
                let stripped: Vec<u8> = self
                    .data
                    .chunks_exact(4)
                    .flat_map(|px| [px[0], px[1], px[2]])
                    .collect();
                RgbImage::from_raw(self.width, self.height, stripped).ok_or_else(|| {
                    CameraError::Encoding {
                        details: "RGBA buffer does not match frame dimensions".to_string(),
                    }
                })?
            }
        };
        Ok(rgb)
    }
}
