// Application state module
// Holds everything a request handler needs, shared read-only across tasks

use std::sync::Arc;

use super::types::Config;
use crate::logger::LogFormat;
use crate::render::Templates;
use crate::storage::ImageStore;

/// Application state
pub struct AppState {
    pub config: Config,
    pub store: ImageStore,
    pub templates: Templates,

    // Parsed once so the access log path stays allocation-light
    pub access_log_format: LogFormat,
}

impl AppState {
    pub fn new(config: Config, templates: Templates) -> Self {
        let store = ImageStore::new(config.storage.root.clone());
        let access_log_format = LogFormat::parse(&config.logging.access_log_format);
        Self {
            config,
            store,
            templates,
            access_log_format,
        }
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }
}
