//! Page rendering module
//!
//! Wraps a Tera engine holding the two pages the service renders. Templates
//! are parsed once at startup and never reloaded.

use chrono::{DateTime, Local};
use serde::Serialize;
use std::path::Path;
use tera::{Context, Tera};

use crate::storage::ImageRecord;

pub const VIEW_TEMPLATE: &str = "img.html";
pub const UPLOAD_TEMPLATE: &str = "upload.html";

const BUILTIN_VIEW: &str = include_str!("../../templates/img.html");
const BUILTIN_UPLOAD: &str = include_str!("../../templates/upload.html");

/// Format used for the `date` field of the view page
pub const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f %z";

/// Data handed to the view template
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ViewModel {
    pub id: String,
    pub date: String,
}

impl ViewModel {
    pub fn new(id: &str, stored_at: &DateTime<Local>) -> Self {
        Self {
            id: id.to_string(),
            date: stored_at.format(DATE_FORMAT).to_string(),
        }
    }
}

impl From<&ImageRecord> for ViewModel {
    fn from(record: &ImageRecord) -> Self {
        Self::new(record.id.as_str(), &record.stored_at)
    }
}

/// Parsed page templates
#[derive(Debug)]
pub struct Templates {
    tera: Tera,
}

impl Templates {
    /// Templates compiled into the binary
    pub fn builtin() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_templates(vec![
            (VIEW_TEMPLATE, BUILTIN_VIEW),
            (UPLOAD_TEMPLATE, BUILTIN_UPLOAD),
        ])?;
        Ok(Self { tera })
    }

    /// Load `img.html` and `upload.html` from a directory. Both must exist.
    pub fn from_dir(dir: &Path) -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_template_files(vec![
            (dir.join(VIEW_TEMPLATE), Some(VIEW_TEMPLATE)),
            (dir.join(UPLOAD_TEMPLATE), Some(UPLOAD_TEMPLATE)),
        ])?;
        Ok(Self { tera })
    }

    /// Use `dir` when configured, the built-in pages otherwise
    pub fn load(dir: Option<&Path>) -> Result<Self, tera::Error> {
        match dir {
            Some(d) => Self::from_dir(d),
            None => Self::builtin(),
        }
    }

    pub fn render_view(&self, view: &ViewModel) -> Result<String, tera::Error> {
        let ctx = Context::from_serialize(view)?;
        self.tera.render(VIEW_TEMPLATE, &ctx)
    }

    pub fn render_upload_form(&self) -> Result<String, tera::Error> {
        self.tera.render(UPLOAD_TEMPLATE, &Context::new())
    }
}

/// Renderer error with its full cause chain, as sent to the client
pub fn error_message(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = std::error::Error::source(cause);
    }
    message
}
