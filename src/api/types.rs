use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::FormField;
use crate::geo::SelectedLocation;
use crate::photo::{PhotoFile, PhotoInput};

/// `{ error, message }` envelope every story service response carries
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiMessage {
    pub error: bool,
    pub message: String,
}

/// Session returned by a successful login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResult {
    pub user_id: String,
    pub name: String,
    pub token: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginResponse {
    pub login_result: LoginResult,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct StoryListResponse {
    #[serde(default)]
    pub list_story: Vec<Story>,
}

/// A published story as listed by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: String,
    pub name: String,
    pub description: String,
    pub photo_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

impl Story {
    /// Where the story was posted, if it carries a usable coordinate pair
    pub fn location(&self) -> Option<SelectedLocation> {
        match (self.lat, self.lon) {
            (Some(lat), Some(lon)) => SelectedLocation::new(lat, lon).ok(),
            _ => None,
        }
    }
}

/// One part of the `POST /stories` multipart body
#[derive(Debug, Clone, PartialEq)]
pub enum MultipartField {
    Text {
        name: &'static str,
        value: String,
    },
    File {
        name: &'static str,
        file_name: String,
        mime: String,
        bytes: Arc<Vec<u8>>,
    },
}

impl MultipartField {
    pub fn name(&self) -> &'static str {
        match self {
            MultipartField::Text { name, .. } | MultipartField::File { name, .. } => name,
        }
    }
}

/// A complete, validated story ready to upload.
///
/// Only [`SubmissionPayload::build`] creates one, so every payload has a
/// trimmed non-empty description, a photo and a valid location.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionPayload {
    description: String,
    photo: PhotoFile,
    location: SelectedLocation,
}

impl SubmissionPayload {
    /// Check description, photo and location in that order
    pub fn build(
        description: &str,
        photo: Option<&PhotoInput>,
        location: Option<SelectedLocation>,
    ) -> Result<Self, FormField> {
        let description = description.trim();
        if description.is_empty() {
            return Err(FormField::Description);
        }

        let photo = photo.ok_or(FormField::Photo)?.file().clone();

        let location = location
            .filter(SelectedLocation::is_valid)
            .ok_or(FormField::Location)?;

        Ok(Self {
            description: description.to_string(),
            photo,
            location,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn photo(&self) -> &PhotoFile {
        &self.photo
    }

    pub fn location(&self) -> SelectedLocation {
        self.location
    }

    /// Multipart parts in upload order: description, photo, lat, lon
    pub fn fields(&self) -> Vec<MultipartField> {
        vec![
            MultipartField::Text {
                name: "description",
                value: self.description.clone(),
            },
            MultipartField::File {
                name: "photo",
                file_name: self.photo.name().to_string(),
                mime: self.photo.mime().to_string(),
                bytes: Arc::new(self.photo.bytes().to_vec()),
            },
            MultipartField::Text {
                name: "lat",
                value: self.location.lat.to_string(),
            },
            MultipartField::Text {
                name: "lon",
                value: self.location.lon.to_string(),
            },
        ]
    }
}
