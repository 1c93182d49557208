//! Image storage module
//!
//! Filesystem-backed persistence of uploaded images keyed by a generated
//! identifier. Records carry no metadata beyond what the filesystem reports.

mod error;
mod id;
mod store;

pub use error::StoreError;
pub use id::{IdScheme, ImageId};
pub use store::{ImageRecord, ImageStore, PendingImage, StoredImage};
