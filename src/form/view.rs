use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::photo::PhotoMode;

/// Status lines the form writes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusKind {
    CameraStatus,
    FileStatus,
    LocationInfo,
    FormError,
    FormSuccess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitState {
    Ready,
    Submitting,
}

impl SubmitState {
    pub fn label(&self) -> &'static str {
        match self {
            SubmitState::Ready => "Submit Story",
            SubmitState::Submitting => "Submitting...",
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, SubmitState::Ready)
    }
}

/// Where the form asks to go next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Stories,
    AddStory,
    Login,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Stories => "/",
            Route::AddStory => "/add",
            Route::Login => "/login",
        }
    }
}

/// What the view needs to lay out the form's fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormLayout {
    pub map_container: String,
    pub photo_mode: PhotoMode,
    pub max_file_bytes: u64,
}

/// Handle the view fires when the user asks to submit
#[derive(Debug, Clone)]
pub struct SubmitTrigger {
    tx: mpsc::UnboundedSender<()>,
}

impl SubmitTrigger {
    pub(crate) fn channel() -> (Self, mpsc::UnboundedReceiver<()>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Request a submission. False once the form has gone away.
    pub fn submit(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}

/// Presentation layer the submission form drives
pub trait FormView: Send + Sync {
    fn render_fields(&self, layout: &FormLayout);

    fn show_status(&self, kind: StatusKind, message: &str);

    fn bind_submit(&self, trigger: SubmitTrigger);

    fn set_submit_state(&self, state: SubmitState);

    fn navigate(&self, route: Route);
}

/// Terminal view used by the command line front end
#[derive(Debug, Default)]
pub struct ConsoleView;

impl FormView for ConsoleView {
    fn render_fields(&self, layout: &FormLayout) {
        debug!(
            "Rendering story form (map '{}', {:?} mode, {} byte limit)",
            layout.map_container, layout.photo_mode, layout.max_file_bytes
        );
    }

    fn show_status(&self, kind: StatusKind, message: &str) {
        if message.is_empty() {
            return;
        }
        match kind {
            StatusKind::FormError => {
                warn!("{}", message);
                eprintln!("{}", message);
            }
            StatusKind::FormSuccess => println!("{}", message),
            _ => info!("{:?}: {}", kind, message),
        }
    }

    fn bind_submit(&self, _trigger: SubmitTrigger) {}

    fn set_submit_state(&self, state: SubmitState) {
        debug!("Submit control: {}", state.label());
    }

    fn navigate(&self, route: Route) {
        debug!("Navigating to {}", route.path());
    }
}
