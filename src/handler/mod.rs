//! Request handler module
//!
//! Responsible for request dispatch and the three image-hosting operations:
//! the upload form and save endpoint, the view page, and the raw image
//! pass-through.

pub mod router;
pub mod static_files;
pub mod upload;
pub mod view;

// Re-export main entry point
pub use router::{handle_request, RequestContext};
pub use upload::{UploadError, UPLOAD_FIELD};
