//! Client side of the uploader: the upload form, the gallery and the channel
//! that tells the gallery to refresh after an upload.

pub mod api;
pub mod events;
pub mod form;
pub mod gallery;
pub mod platform;

pub use api::HttpUploadApi;
pub use events::UploadNotifier;
pub use form::{FormState, SelectedFile, UploadForm};
pub use gallery::{Gallery, GalleryView};
pub use platform::TerminalPlatform;
