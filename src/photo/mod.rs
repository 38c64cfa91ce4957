pub mod data_url;
mod source;

pub use source::{PhotoFile, PhotoInput, PhotoMode, PhotoSource, MAX_PHOTO_BYTES};
