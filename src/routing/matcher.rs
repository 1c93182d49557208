//! Route matching module
//!
//! Prefix dispatch first, then pattern checks for routes that carry an
//! identifier. Identifiers are only extracted when they are alphanumeric,
//! which keeps traversal sequences out of storage paths.

use regex::Regex;
use std::sync::LazyLock;

use crate::storage::ImageId;

pub const UPLOAD_PREFIX: &str = "/upload/";
pub const SAVE_PREFIX: &str = "/save/";
pub const VIEW_PREFIX: &str = "/img/";
pub const ASSET_PREFIX: &str = "/images/";

static ACTION_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/(edit|save|img)/([a-zA-Z0-9]+)$").expect("action path pattern is valid")
});

static ASSET_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([a-zA-Z0-9]+)\.png$").expect("asset name pattern is valid"));

/// Action segment accepted by the action path pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Edit,
    Save,
    Img,
}

/// Operation selected for a request path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    UploadForm,
    Save,
    View(ImageId),
    Asset(ImageId),
    NotFound,
}

/// Match `/(edit|save|img)/<id>` and return the action and raw id
pub fn match_action_path(path: &str) -> Option<(Action, &str)> {
    let caps = ACTION_PATH.captures(path)?;
    let action = match caps.get(1)?.as_str() {
        "edit" => Action::Edit,
        "save" => Action::Save,
        "img" => Action::Img,
        _ => return None,
    };
    Some((action, caps.get(2)?.as_str()))
}

/// Match `<id>.png` and return the id
pub fn match_asset_name(name: &str) -> Option<ImageId> {
    let caps = ASSET_NAME.captures(name)?;
    ImageId::parse(caps.get(1)?.as_str())
}

/// Select the operation for a request path
pub fn resolve(path: &str) -> Route {
    if path.starts_with(UPLOAD_PREFIX) {
        return Route::UploadForm;
    }

    if path.starts_with(SAVE_PREFIX) {
        return Route::Save;
    }

    if path.starts_with(VIEW_PREFIX) {
        return match match_action_path(path) {
            Some((Action::Img, raw)) => ImageId::parse(raw).map_or(Route::NotFound, Route::View),
            _ => Route::NotFound,
        };
    }

    if let Some(name) = path.strip_prefix(ASSET_PREFIX) {
        return match_asset_name(name).map_or(Route::NotFound, Route::Asset);
    }

    if let Some((Action::Edit, raw)) = match_action_path(path) {
        // The pattern accepts edit paths but nothing serves them
        tracing::debug!(id = raw, "edit path has no handler");
    }

    Route::NotFound
}
