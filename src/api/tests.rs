use super::client::{decode_response, interpret_response};
use super::types::{LoginResponse, StoryListResponse};
use super::*;
use crate::config::ApiConfig;
use crate::error::{FormField, SubmissionError};
use crate::geo::SelectedLocation;
use crate::photo::{PhotoFile, PhotoInput};
use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;
use tempfile::TempDir;

fn jpeg_input(size: usize) -> PhotoInput {
    let file = PhotoFile::new("sunset.jpg", "image/jpeg", vec![0xAB; size]);
    let preview = file.to_data_url();
    PhotoInput::File { file, preview }
}

fn jakarta() -> SelectedLocation {
    SelectedLocation::new(-6.2088, 106.8456).unwrap()
}

#[test]
fn test_payload_fields_are_exactly_four() {
    let photo = jpeg_input(500 * 1024);
    let payload = SubmissionPayload::build("Sunset", Some(&photo), Some(jakarta())).unwrap();

    let fields = payload.fields();
    let names: Vec<&str> = fields.iter().map(MultipartField::name).collect();
    assert_eq!(names, vec!["description", "photo", "lat", "lon"]);

    let files: Vec<_> = fields
        .iter()
        .filter(|f| matches!(f, MultipartField::File { .. }))
        .collect();
    assert_eq!(files.len(), 1);

    match &fields[1] {
        MultipartField::File {
            file_name,
            mime,
            bytes,
            ..
        } => {
            assert_eq!(file_name, "sunset.jpg");
            assert_eq!(mime, "image/jpeg");
            assert_eq!(bytes.len(), 500 * 1024);
        }
        other => panic!("Expected photo part, got {:?}", other),
    }

    assert_eq!(
        fields[0],
        MultipartField::Text {
            name: "description",
            value: "Sunset".to_string()
        }
    );
    assert_eq!(
        fields[2],
        MultipartField::Text {
            name: "lat",
            value: "-6.2088".to_string()
        }
    );
    assert_eq!(
        fields[3],
        MultipartField::Text {
            name: "lon",
            value: "106.8456".to_string()
        }
    );
}

#[test]
fn test_payload_trims_description() {
    let photo = jpeg_input(10);
    let payload =
        SubmissionPayload::build("  Morning walk \n", Some(&photo), Some(jakarta())).unwrap();
    assert_eq!(payload.description(), "Morning walk");
}

#[test]
fn test_payload_validation_order() {
    let photo = jpeg_input(10);

    assert_eq!(
        SubmissionPayload::build("   ", None, None),
        Err(FormField::Description)
    );
    assert_eq!(
        SubmissionPayload::build("Sunset", None, None),
        Err(FormField::Photo)
    );
    assert_eq!(
        SubmissionPayload::build("Sunset", Some(&photo), None),
        Err(FormField::Location)
    );

    let bogus = SelectedLocation {
        lat: 120.0,
        lon: 0.0,
    };
    assert_eq!(
        SubmissionPayload::build("Sunset", Some(&photo), Some(bogus)),
        Err(FormField::Location)
    );
}

#[test]
fn test_story_list_deserialization() {
    let body = json!({
        "error": false,
        "message": "Stories fetched successfully",
        "listStory": [
            {
                "id": "story-FvU4u0Vp2S3PMsFg",
                "name": "Dimas",
                "description": "Lorem Ipsum",
                "photoUrl": "https://story-api.dicoding.dev/images/stories/1641623658595.png",
                "createdAt": "2022-01-08T06:34:18.598Z",
                "lat": -10.212,
                "lon": -16.002
            },
            {
                "id": "story-2",
                "name": "Ayu",
                "description": "No location",
                "photoUrl": "https://example.com/2.png",
                "createdAt": "2022-01-09T10:00:00Z",
                "lat": null,
                "lon": null
            }
        ]
    });

    let list: StoryListResponse = interpret_response(StatusCode::OK, body).unwrap();
    assert_eq!(list.list_story.len(), 2);

    let first = &list.list_story[0];
    assert_eq!(first.name, "Dimas");
    assert_eq!(
        first.location(),
        Some(SelectedLocation::new(-10.212, -16.002).unwrap())
    );
    assert_eq!(first.created_at.timestamp(), 1641623658);
    assert!(list.list_story[1].location().is_none());
}

#[test]
fn test_login_deserialization() {
    let body = json!({
        "error": false,
        "message": "success",
        "loginResult": {
            "userId": "user-yj5pc_LARC_AgK61",
            "name": "Arif Faizin",
            "token": "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"
        }
    });

    let login: LoginResponse = interpret_response(StatusCode::OK, body).unwrap();
    assert_eq!(login.login_result.user_id, "user-yj5pc_LARC_AgK61");
    assert_eq!(
        login.login_result.token,
        "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9"
    );
}

#[test]
fn test_error_flag_becomes_submission_failure() {
    let body = json!({
        "error": true,
        "message": "Payload content length greater than maximum allowed: 1000000"
    });

    let result: Result<ApiMessage, _> = interpret_response(StatusCode::OK, body);
    match result {
        Err(SubmissionError::SubmissionFailed { message }) => {
            assert!(message.starts_with("Payload content length"));
        }
        other => panic!("Expected SubmissionFailed, got {:?}", other),
    }
}

#[test]
fn test_http_failure_without_message() {
    let result: Result<ApiMessage, _> =
        interpret_response(StatusCode::INTERNAL_SERVER_ERROR, json!({}));
    match result {
        Err(SubmissionError::SubmissionFailed { message }) => {
            assert_eq!(message, "Request failed with status 500");
        }
        other => panic!("Expected SubmissionFailed, got {:?}", other),
    }
}

#[test]
fn test_unexpected_body_is_decode_error() {
    let result: Result<LoginResponse, _> =
        interpret_response(StatusCode::OK, json!({ "error": false, "message": "ok" }));
    assert!(matches!(result, Err(SubmissionError::Decode(_))));
}

#[test]
fn test_html_error_page_reports_status() {
    let page = "<html><body><h1>502 Bad Gateway</h1></body></html>";

    let result: Result<ApiMessage, _> = decode_response(StatusCode::BAD_GATEWAY, page);
    match result {
        Err(SubmissionError::SubmissionFailed { message }) => {
            assert_eq!(message, "Request failed with status 502");
        }
        other => panic!("Expected SubmissionFailed, got {:?}", other),
    }
}

#[test]
fn test_non_json_success_is_decode_error() {
    let result: Result<ApiMessage, _> = decode_response(StatusCode::OK, "OK");
    assert!(matches!(result, Err(SubmissionError::Decode(_))));
}

#[test]
fn test_json_error_body_keeps_server_message() {
    let body = r#"{"error":true,"message":"Missing authentication"}"#;

    let result: Result<ApiMessage, _> = decode_response(StatusCode::UNAUTHORIZED, body);
    match result {
        Err(SubmissionError::SubmissionFailed { message }) => {
            assert_eq!(message, "Missing authentication");
        }
        other => panic!("Expected SubmissionFailed, got {:?}", other),
    }
}

fn api_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        base_url: base_url.to_string(),
        timeout_seconds: 2,
    }
}

#[test]
fn test_client_trims_base_url() {
    let api = HttpStoryApi::new(
        &api_config("https://story-api.dicoding.dev/v1/"),
        Arc::new(StaticCredentials::anonymous()),
    )
    .unwrap();
    assert_eq!(api.base_url(), DEFAULT_BASE_URL);
}

#[tokio::test]
async fn test_add_story_requires_token() {
    let api = HttpStoryApi::new(
        &api_config("http://127.0.0.1:9"),
        Arc::new(StaticCredentials::anonymous()),
    )
    .unwrap();
    let photo = jpeg_input(10);
    let payload = SubmissionPayload::build("Sunset", Some(&photo), Some(jakarta())).unwrap();

    assert!(matches!(
        api.add_story(&payload).await,
        Err(SubmissionError::Unauthenticated)
    ));
    assert!(matches!(
        api.stories(true).await,
        Err(SubmissionError::Unauthenticated)
    ));
}

#[tokio::test]
async fn test_unreachable_server_is_network_unavailable() {
    let api = HttpStoryApi::new(
        &api_config("http://127.0.0.1:9"),
        Arc::new(StaticCredentials::new("token")),
    )
    .unwrap();

    assert!(matches!(
        api.stories(true).await,
        Err(SubmissionError::NetworkUnavailable)
    ));
}

#[tokio::test]
async fn test_token_store_round_trip() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("auth").join("token.json");

    let store = TokenStore::open(&path).await.unwrap();
    assert!(!store.is_authenticated());
    assert!(store.bearer_token().is_none());

    store
        .save(LoginResult {
            user_id: "user-1".to_string(),
            name: "Dimas".to_string(),
            token: "secret".to_string(),
        })
        .await
        .unwrap();
    assert_eq!(store.bearer_token().as_deref(), Some("secret"));

    let reopened = TokenStore::open(&path).await.unwrap();
    assert_eq!(reopened.current_user().unwrap().name, "Dimas");

    reopened.clear().await.unwrap();
    reopened.clear().await.unwrap();
    assert!(!path.exists());
    assert!(reopened.bearer_token().is_none());
}

#[tokio::test]
async fn test_corrupt_token_file_means_logged_out() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("token.json");
    tokio::fs::write(&path, b"not json").await.unwrap();

    let store = TokenStore::open(&path).await.unwrap();
    assert!(!store.is_authenticated());
}
