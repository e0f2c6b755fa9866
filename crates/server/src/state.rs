use std::path::Path;

use assetor_core::{Config, DownloadService, SanitizedConfig};

/// Shared application state
pub struct AppState {
    config: Config,
    service: DownloadService,
}

impl AppState {
    pub fn new(config: Config, service: DownloadService) -> Self {
        Self { config, service }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn service(&self) -> &DownloadService {
        &self.service
    }

    /// Directory artifacts are written to and served from.
    pub fn output_dir(&self) -> &Path {
        &self.config.downloader.output_dir
    }
}
