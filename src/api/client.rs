use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

use super::credentials::CredentialProvider;
use super::types::{
    ApiMessage, LoginResponse, LoginResult, MultipartField, Story, StoryListResponse,
    SubmissionPayload,
};
use crate::config::ApiConfig;
use crate::error::SubmissionError;

pub const DEFAULT_BASE_URL: &str = "https://story-api.dicoding.dev/v1";

/// Receives validated stories from the form
#[async_trait]
pub trait StorySubmitter: Send + Sync {
    async fn submit_story(&self, payload: &SubmissionPayload)
        -> Result<ApiMessage, SubmissionError>;
}

/// Lists published stories
#[async_trait]
pub trait StoryCatalog: Send + Sync {
    async fn stories(&self, with_location: bool) -> Result<Vec<Story>, SubmissionError>;
}

/// Client for the story service REST API
pub struct HttpStoryApi {
    http: reqwest::Client,
    base_url: String,
    credentials: Arc<dyn CredentialProvider>,
}

impl HttpStoryApi {
    pub fn new(
        config: &ApiConfig,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Result<Self, SubmissionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| SubmissionError::SubmissionFailed {
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn bearer(&self) -> Result<String, SubmissionError> {
        self.credentials
            .bearer_token()
            .filter(|token| !token.is_empty())
            .map(|token| format!("Bearer {}", token))
            .ok_or(SubmissionError::Unauthenticated)
    }

    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<ApiMessage, SubmissionError> {
        debug!("Registering account");
        let response = self
            .http
            .post(self.endpoint("register"))
            .json(&json!({
                "name": name,
                "email": email,
                "password": password,
            }))
            .send()
            .await?;

        let message: ApiMessage = read_response(response).await?;
        info!("Registered account for {}", email);
        Ok(message)
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResult, SubmissionError> {
        debug!("Logging in");
        let response = self
            .http
            .post(self.endpoint("login"))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;

        let body: LoginResponse = read_response(response).await?;
        info!("Logged in as {}", body.login_result.name);
        Ok(body.login_result)
    }

    #[instrument(skip(self))]
    pub async fn stories(&self, with_location: bool) -> Result<Vec<Story>, SubmissionError> {
        let bearer = self.bearer()?;
        let response = self
            .http
            .get(self.endpoint("stories"))
            .query(&[("location", if with_location { "1" } else { "0" })])
            .header("Authorization", bearer)
            .send()
            .await?;

        let body: StoryListResponse = read_response(response).await?;
        debug!("Fetched {} stories", body.list_story.len());
        Ok(body.list_story)
    }

    #[instrument(skip(self, payload), fields(photo = %payload.photo().name()))]
    pub async fn add_story(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<ApiMessage, SubmissionError> {
        let bearer = self.bearer()?;
        let form = multipart_form(payload)?;

        debug!(
            "Uploading story ({} byte photo) at {}",
            payload.photo().size(),
            payload.location()
        );
        let response = self
            .http
            .post(self.endpoint("stories"))
            .header("Authorization", bearer)
            .multipart(form)
            .send()
            .await?;

        let message: ApiMessage = read_response(response).await?;
        info!("Story uploaded: {}", message.message);
        Ok(message)
    }
}

#[async_trait]
impl StorySubmitter for HttpStoryApi {
    async fn submit_story(
        &self,
        payload: &SubmissionPayload,
    ) -> Result<ApiMessage, SubmissionError> {
        self.add_story(payload).await
    }
}

#[async_trait]
impl StoryCatalog for HttpStoryApi {
    async fn stories(&self, with_location: bool) -> Result<Vec<Story>, SubmissionError> {
        HttpStoryApi::stories(self, with_location).await
    }
}

fn multipart_form(payload: &SubmissionPayload) -> Result<Form, SubmissionError> {
    let mut form = Form::new();
    for field in payload.fields() {
        form = match field {
            MultipartField::Text { name, value } => form.text(name, value),
            MultipartField::File {
                name,
                file_name,
                mime,
                bytes,
            } => {
                let part = Part::bytes(bytes.as_ref().clone())
                    .file_name(file_name)
                    .mime_str(&mime)?;
                form.part(name, part)
            }
        };
    }
    Ok(form)
}

async fn read_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, SubmissionError> {
    let status = response.status();
    let text = response.text().await?;
    decode_response(status, &text)
}

/// Decode a raw response body. Bodies that are not JSON, such as a proxy's
/// HTML error page, are reported by HTTP status when the status is a failure.
pub(crate) fn decode_response<T: DeserializeOwned>(
    status: StatusCode,
    text: &str,
) -> Result<T, SubmissionError> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(body) => interpret_response(status, body),
        Err(e) if status.is_success() => Err(SubmissionError::Decode(e.to_string())),
        Err(_) => {
            let message = format!("Request failed with status {}", status.as_u16());
            warn!("Story service answered {} without a JSON body", status);
            Err(SubmissionError::SubmissionFailed { message })
        }
    }
}

/// Turn a decoded response body into `T`, or the server's failure message
pub(crate) fn interpret_response<T: DeserializeOwned>(
    status: StatusCode,
    body: serde_json::Value,
) -> Result<T, SubmissionError> {
    let flagged = body.get("error").and_then(|e| e.as_bool()) == Some(true);

    if flagged || !status.is_success() {
        let message = body
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16()));
        warn!("Story service rejected request ({}): {}", status, message);
        return Err(SubmissionError::SubmissionFailed { message });
    }

    serde_json::from_value(body).map_err(|e| SubmissionError::Decode(e.to_string()))
}
