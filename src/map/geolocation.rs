use async_trait::async_trait;
use std::time::Duration;

use crate::config::GeolocationConfig;
use crate::error::GeolocationError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPosition {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy radius in metres, when the provider reports one
    pub accuracy: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionOptions {
    pub timeout: Duration,
    pub high_accuracy: bool,
    pub maximum_age: Duration,
}

impl Default for PositionOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
            high_accuracy: true,
            maximum_age: Duration::ZERO,
        }
    }
}

impl From<&GeolocationConfig> for PositionOptions {
    fn from(config: &GeolocationConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_seconds),
            high_accuracy: config.high_accuracy,
            maximum_age: Duration::ZERO,
        }
    }
}

/// Device geolocation capability
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_position(
        &self,
        options: &PositionOptions,
    ) -> Result<GeoPosition, GeolocationError>;
}

/// Provider that always answers with the same outcome
#[derive(Debug, Clone)]
pub struct FixedGeolocation {
    outcome: Result<GeoPosition, GeolocationError>,
    delay: Duration,
}

impl FixedGeolocation {
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            outcome: Ok(GeoPosition {
                latitude,
                longitude,
                accuracy: None,
            }),
            delay: Duration::ZERO,
        }
    }

    pub fn failing(error: GeolocationError) -> Self {
        Self {
            outcome: Err(error),
            delay: Duration::ZERO,
        }
    }

    /// No geolocation on this platform
    pub fn unsupported() -> Self {
        Self::failing(GeolocationError::Unsupported)
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl GeolocationProvider for FixedGeolocation {
    async fn current_position(
        &self,
        _options: &PositionOptions,
    ) -> Result<GeoPosition, GeolocationError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.outcome.clone()
    }
}
