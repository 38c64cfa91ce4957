mod submission;
mod view;

pub use submission::{FormOptions, StorySubmissionForm, SUCCESS_MESSAGE};
pub use view::{ConsoleView, FormLayout, FormView, Route, StatusKind, SubmitState, SubmitTrigger};
