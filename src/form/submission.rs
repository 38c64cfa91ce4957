use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use super::view::{FormLayout, FormView, Route, StatusKind, SubmitState, SubmitTrigger};
use crate::api::{ApiMessage, StorySubmitter, SubmissionPayload};
use crate::camera::{CameraSession, StreamInfo};
use crate::config::StorycamConfig;
use crate::error::{CameraError, FormError, MapError, PhotoError, Result, UserFacing};
use crate::geo::SelectedLocation;
use crate::map::LocationPicker;
use crate::photo::{PhotoFile, PhotoInput, PhotoMode, PhotoSource, MAX_PHOTO_BYTES};

pub const SUCCESS_MESSAGE: &str = "Story added successfully!";

#[derive(Debug, Clone, PartialEq)]
pub struct FormOptions {
    pub map_container: String,
    pub default_center: SelectedLocation,
    pub max_file_bytes: u64,
}

impl Default for FormOptions {
    fn default() -> Self {
        Self {
            map_container: "location-map".to_string(),
            default_center: SelectedLocation {
                lat: -6.2088,
                lon: 106.8456,
            },
            max_file_bytes: MAX_PHOTO_BYTES,
        }
    }
}

impl FormOptions {
    pub fn from_config(config: &StorycamConfig) -> std::result::Result<Self, MapError> {
        let (lat, lon) = config.map.default_center;
        Ok(Self {
            default_center: SelectedLocation::new(lat, lon)?,
            max_file_bytes: config.photo.max_file_bytes,
            ..Self::default()
        })
    }
}

/// The add-story workflow: photo, location and description in, one upload out.
///
/// Every UI event is a method. Failures are written to the matching status
/// line of the view and returned, but never leave the form unusable.
pub struct StorySubmissionForm {
    view: Arc<dyn FormView>,
    camera: CameraSession,
    picker: LocationPicker,
    submitter: Arc<dyn StorySubmitter>,
    options: FormOptions,
    photos: PhotoSource,
    description: String,
    submit_requests: Option<mpsc::UnboundedReceiver<()>>,
    destroyed: bool,
}

impl StorySubmissionForm {
    pub fn new(
        view: Arc<dyn FormView>,
        camera: CameraSession,
        picker: LocationPicker,
        submitter: Arc<dyn StorySubmitter>,
        options: FormOptions,
    ) -> Self {
        let photos = PhotoSource::with_limit(options.max_file_bytes);
        Self {
            view,
            camera,
            picker,
            submitter,
            options,
            photos,
            description: String::new(),
            submit_requests: None,
            destroyed: false,
        }
    }

    pub fn camera(&self) -> &CameraSession {
        &self.camera
    }

    pub fn picker(&self) -> &LocationPicker {
        &self.picker
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn photo(&self) -> Option<&PhotoInput> {
        self.photos.current()
    }

    pub fn photo_mode(&self) -> PhotoMode {
        self.photos.mode()
    }

    pub fn location(&self) -> Option<SelectedLocation> {
        self.picker.selected()
    }

    /// Lay out the fields, bind the submit control and mount the map
    pub fn render(&mut self) -> Result<()> {
        self.view.render_fields(&FormLayout {
            map_container: self.options.map_container.clone(),
            photo_mode: self.photos.mode(),
            max_file_bytes: self.photos.limit(),
        });

        let (trigger, requests) = SubmitTrigger::channel();
        self.submit_requests = Some(requests);
        self.view.bind_submit(trigger);
        self.view.set_submit_state(SubmitState::Ready);

        let view = Arc::clone(&self.view);
        self.picker.on_location_selected(move |location| {
            let SelectedLocation { lat, lon } = location;
            let text = format!("Selected location: {:.4}, {:.4}", lat, lon);
            view.show_status(StatusKind::LocationInfo, &text);
        });

        if let Err(e) = self
            .picker
            .initialize(&self.options.map_container, self.options.default_center)
        {
            warn!("Failed to initialize location map: {}", e);
            self.show(StatusKind::LocationInfo, &format!("Error: {}", e));
            return Err(e.into());
        }

        info!("Story form rendered");
        Ok(())
    }

    fn show(&self, kind: StatusKind, message: &str) {
        self.view.show_status(kind, message);
    }

    pub fn set_description(&mut self, text: impl Into<String>) {
        self.description = text.into();
    }

    /// Show the file or camera control. Leaving camera mode stops the camera.
    pub async fn select_photo_mode(&mut self, mode: PhotoMode) {
        if mode == PhotoMode::File {
            self.camera.stop().await;
            self.show(StatusKind::CameraStatus, "");
        }
        self.photos.set_mode(mode);
    }

    pub fn choose_file(&mut self, file: PhotoFile) -> std::result::Result<(), PhotoError> {
        match self.photos.from_file(file) {
            Ok(_) => {
                self.show(StatusKind::FileStatus, "File selected successfully");
                Ok(())
            }
            Err(e) => {
                self.show(StatusKind::FileStatus, &e.user_message());
                Err(e)
            }
        }
    }

    pub fn remove_file(&mut self) {
        if self.photos.remove_file() {
            debug!("Removed selected photo file");
        }
        self.show(StatusKind::FileStatus, "");
    }

    /// Start the camera. On failure the form falls back to file upload.
    pub async fn start_camera(&mut self) -> std::result::Result<StreamInfo, CameraError> {
        self.photos.set_mode(PhotoMode::Camera);
        self.show(StatusKind::CameraStatus, "Starting camera...");

        let facing = self.camera.facing().await;
        match self.camera.start(facing).await {
            Ok(stream) => {
                self.show(StatusKind::CameraStatus, "Camera ready");
                Ok(stream)
            }
            Err(e) => {
                warn!("Camera failed to start: {}", e);
                let reason = e.user_message();
                let message = if e.is_recoverable() {
                    format!("Error: {}. Please use file upload instead.", reason)
                } else {
                    format!("Error: {}", reason)
                };
                self.show(StatusKind::CameraStatus, &message);
                self.photos.set_mode(PhotoMode::File);
                Err(e)
            }
        }
    }

    /// Freeze the live frame and make it the photo to upload
    pub async fn capture_photo(&mut self) -> Result<()> {
        self.show(StatusKind::CameraStatus, "Capturing photo...");

        let image = match self.camera.capture().await {
            Ok(image) => image,
            Err(e) => {
                let message = match e {
                    CameraError::NotActive => {
                        "Camera is not initialized. Please start the camera first.".to_string()
                    }
                    CameraError::FrameNotReady => {
                        "Camera is not ready. Please wait a moment and try again.".to_string()
                    }
                    ref other => format!("Error capturing photo: {}", other.user_message()),
                };
                self.show(StatusKind::CameraStatus, &message);
                return Err(e.into());
            }
        };

        if let Err(e) = self.photos.from_captured_image(image) {
            self.show(
                StatusKind::CameraStatus,
                &format!("Error capturing photo: {}", e.user_message()),
            );
            return Err(e.into());
        }

        self.show(StatusKind::CameraStatus, "Photo captured");
        Ok(())
    }

    /// Drop the captured photo and go back to the live preview
    pub async fn retake_photo(&mut self) -> std::result::Result<StreamInfo, CameraError> {
        self.show(StatusKind::CameraStatus, "Restarting camera...");
        self.photos.discard_capture();

        match self.camera.retake().await {
            Ok(stream) => {
                self.show(StatusKind::CameraStatus, "Camera ready");
                Ok(stream)
            }
            Err(e) => {
                self.show(
                    StatusKind::CameraStatus,
                    &format!("Error restarting camera: {}", e.user_message()),
                );
                Err(e)
            }
        }
    }

    pub async fn switch_camera(&mut self) -> std::result::Result<StreamInfo, CameraError> {
        self.show(StatusKind::CameraStatus, "Switching camera...");

        match self.camera.switch_facing().await {
            Ok(stream) => {
                self.show(StatusKind::CameraStatus, "Camera switched");
                Ok(stream)
            }
            Err(e) => {
                self.show(
                    StatusKind::CameraStatus,
                    &format!("Error switching camera: {}", e.user_message()),
                );
                Err(e)
            }
        }
    }

    /// Mark the device position on the map.
    ///
    /// When no position is available the map simply stays where it is.
    pub async fn use_current_location(&mut self) -> Option<SelectedLocation> {
        match self.picker.resolve_current_position().await {
            Ok(location) => Some(location),
            Err(e) if e.is_recoverable() => {
                debug!("{}", e.user_message());
                None
            }
            Err(e) => {
                debug!("Current location not available on this device: {}", e);
                None
            }
        }
    }

    /// A click on the location map
    pub fn select_location(
        &mut self,
        lat: f64,
        lon: f64,
    ) -> std::result::Result<Option<SelectedLocation>, MapError> {
        self.picker.handle_click(lat, lon)
    }

    /// Validate, upload and report the outcome.
    ///
    /// Nothing is sent unless description, photo and location are all set.
    /// On failure every input is kept so the user can try again.
    pub async fn submit(&mut self) -> std::result::Result<ApiMessage, FormError> {
        self.show(StatusKind::FormError, "");
        self.show(StatusKind::FormSuccess, "");

        let payload = match SubmissionPayload::build(
            &self.description,
            self.photos.current(),
            self.picker.selected(),
        ) {
            Ok(payload) => payload,
            Err(field) => {
                debug!("Story form incomplete: missing {}", field);
                self.show(StatusKind::FormError, field.prompt());
                return Err(FormError::Validation { field });
            }
        };

        self.view.set_submit_state(SubmitState::Submitting);
        let outcome = self.submitter.submit_story(&payload).await;
        self.view.set_submit_state(SubmitState::Ready);

        match outcome {
            Ok(message) => {
                info!("Story submitted at {}", payload.location());
                self.show(StatusKind::FormSuccess, SUCCESS_MESSAGE);
                self.view.navigate(Route::Stories);
                Ok(message)
            }
            Err(e) => {
                warn!("Story submission failed: {}", e);
                self.show(StatusKind::FormError, &e.user_message());
                if !e.is_recoverable() {
                    self.view.navigate(Route::Login);
                }
                Err(e.into())
            }
        }
    }

    /// Handle submit requests from the bound control until one succeeds.
    ///
    /// Returns `None` once every trigger handle has been dropped, or when a
    /// submission fails in a way that resubmitting cannot fix.
    pub async fn serve(&mut self) -> Option<ApiMessage> {
        let mut requests = self.submit_requests.take()?;
        while requests.recv().await.is_some() {
            match self.submit().await {
                Ok(message) => return Some(message),
                Err(FormError::Submission(e)) if !e.is_recoverable() => {
                    debug!("Stopped serving submit requests: {}", e);
                    return None;
                }
                Err(_) => {}
            }
        }
        debug!("Submit trigger dropped");
        None
    }

    /// Release the camera and the map. Idempotent.
    pub async fn destroy(&mut self) {
        self.camera.destroy().await;
        self.picker.destroy();
        self.submit_requests = None;
        if !self.destroyed {
            self.destroyed = true;
            info!("Story form destroyed");
        }
    }
}

