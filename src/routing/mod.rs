//! Routing module
//!
//! Maps request paths onto the service's operations:
//! - Upload form and save endpoints matched by prefix
//! - View pages matched against the action pattern
//! - Raw image pass-through matched by file name

mod matcher;

pub use matcher::{match_action_path, match_asset_name, resolve, Action, Route};
pub use matcher::{ASSET_PREFIX, SAVE_PREFIX, UPLOAD_PREFIX, VIEW_PREFIX};
