use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

use crate::camera::FacingMode;

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorycamConfig {
    pub api: ApiConfig,
    pub camera: CameraConfig,
    pub map: MapConfig,
    pub geolocation: GeolocationConfig,
    pub photo: PhotoConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiConfig {
    /// Base URL of the story service
    #[serde(default = "default_api_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_api_timeout")]
    pub timeout_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Ideal capture resolution (width, height)
    #[serde(default = "default_ideal_resolution")]
    pub ideal_resolution: (u32, u32),

    /// Facing mode used when the camera is first started
    #[serde(default = "default_facing")]
    pub default_facing: FacingMode,

    /// JPEG quality for captured stills (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Retry with the front camera when no rear camera exists
    #[serde(default = "default_front_camera_fallback")]
    pub front_camera_fallback: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct MapConfig {
    /// Initial map centre (lat, lon)
    #[serde(default = "default_map_center")]
    pub default_center: (f64, f64),

    /// Initial zoom level
    #[serde(default = "default_map_zoom")]
    pub default_zoom: u8,

    /// Tile URL template handed to the map backend
    #[serde(default = "default_tile_url")]
    pub tile_url: String,

    /// Attribution shown with the tiles
    #[serde(default = "default_tile_attribution")]
    pub attribution: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GeolocationConfig {
    /// How long to wait for a position fix, in seconds
    #[serde(default = "default_geolocation_timeout")]
    pub timeout_seconds: u64,

    /// Request a high-accuracy fix
    #[serde(default = "default_high_accuracy")]
    pub high_accuracy: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PhotoConfig {
    /// Largest accepted upload in bytes
    #[serde(default = "default_max_file_bytes")]
    pub max_file_bytes: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AuthConfig {
    /// File holding the saved login token
    #[serde(default = "default_token_path")]
    pub token_path: String,
}

impl StorycamConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("storycam.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            // Start with default values
            .set_default("api.base_url", default_api_base_url())?
            .set_default("api.timeout_seconds", default_api_timeout())?
            .set_default(
                "camera.ideal_resolution",
                vec![default_ideal_resolution().0, default_ideal_resolution().1],
            )?
            .set_default("camera.default_facing", default_facing().as_str())?
            .set_default("camera.jpeg_quality", default_jpeg_quality() as u64)?
            .set_default(
                "camera.front_camera_fallback",
                default_front_camera_fallback(),
            )?
            .set_default(
                "map.default_center",
                vec![default_map_center().0, default_map_center().1],
            )?
            .set_default("map.default_zoom", default_map_zoom() as u64)?
            .set_default("map.tile_url", default_tile_url())?
            .set_default("map.attribution", default_tile_attribution())?
            .set_default("geolocation.timeout_seconds", default_geolocation_timeout())?
            .set_default("geolocation.high_accuracy", default_high_accuracy())?
            .set_default("photo.max_file_bytes", default_max_file_bytes())?
            .set_default("auth.token_path", default_token_path())?
            // Add configuration file (optional)
            .add_source(File::with_name(&path_str).required(false))
            // Add environment variables, e.g. STORYCAM__API__BASE_URL
            .add_source(
                Environment::with_prefix("STORYCAM")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;

        let config: StorycamConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(ConfigError::Message(
                "API base_url must be an http(s) URL".to_string(),
            ));
        }

        if self.api.timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "API timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.camera.ideal_resolution.0 == 0 || self.camera.ideal_resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera ideal_resolution must be greater than 0".to_string(),
            ));
        }

        if !(1..=100).contains(&self.camera.jpeg_quality) {
            return Err(ConfigError::Message(
                "Camera jpeg_quality must be between 1 and 100".to_string(),
            ));
        }

        let (lat, lon) = self.map.default_center;
        if !crate::geo::SelectedLocation::is_valid_pair(lat, lon) {
            return Err(ConfigError::Message(format!(
                "Map default_center ({}, {}) is not a valid coordinate",
                lat, lon
            )));
        }

        if self.geolocation.timeout_seconds == 0 {
            return Err(ConfigError::Message(
                "Geolocation timeout_seconds must be greater than 0".to_string(),
            ));
        }

        if self.photo.max_file_bytes == 0 {
            return Err(ConfigError::Message(
                "Photo max_file_bytes must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for StorycamConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                base_url: default_api_base_url(),
                timeout_seconds: default_api_timeout(),
            },
            camera: CameraConfig {
                ideal_resolution: default_ideal_resolution(),
                default_facing: default_facing(),
                jpeg_quality: default_jpeg_quality(),
                front_camera_fallback: default_front_camera_fallback(),
            },
            map: MapConfig {
                default_center: default_map_center(),
                default_zoom: default_map_zoom(),
                tile_url: default_tile_url(),
                attribution: default_tile_attribution(),
            },
            geolocation: GeolocationConfig {
                timeout_seconds: default_geolocation_timeout(),
                high_accuracy: default_high_accuracy(),
            },
            photo: PhotoConfig {
                max_file_bytes: default_max_file_bytes(),
            },
            auth: AuthConfig {
                token_path: default_token_path(),
            },
        }
    }
}

// Default value functions
fn default_api_base_url() -> String {
    "https://story-api.dicoding.dev/v1".to_string()
}
fn default_api_timeout() -> u64 {
    30
}

fn default_ideal_resolution() -> (u32, u32) {
    (1280, 720)
}
fn default_facing() -> FacingMode {
    FacingMode::Environment
}
fn default_jpeg_quality() -> u8 {
    80
}
fn default_front_camera_fallback() -> bool {
    true
}

fn default_map_center() -> (f64, f64) {
    (-6.2088, 106.8456)
}
fn default_map_zoom() -> u8 {
    13
}
fn default_tile_url() -> String {
    "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_string()
}
fn default_tile_attribution() -> String {
    "&copy; OpenStreetMap contributors".to_string()
}

fn default_geolocation_timeout() -> u64 {
    10
}
fn default_high_accuracy() -> bool {
    true
}

fn default_max_file_bytes() -> u64 {
    1024 * 1024
}

fn default_token_path() -> String {
    "./storycam-token.json".to_string()
}
