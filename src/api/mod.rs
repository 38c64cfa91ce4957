mod client;
mod credentials;
mod types;
#[cfg(test)]
mod tests;

pub use client::{HttpStoryApi, StoryCatalog, StorySubmitter, DEFAULT_BASE_URL};
pub use credentials::{CredentialProvider, StaticCredentials, TokenStore};
pub use types::{ApiMessage, LoginResult, MultipartField, Story, SubmissionPayload};
