use std::sync::Arc;

use masker_common::config::ServiceConfig;
use masker_transcode_engine::MaskPipeline;

/// Shared, read-only state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServiceConfig>,
    pub pipeline: Arc<MaskPipeline>,
}

impl AppState {
    pub fn new(config: ServiceConfig, pipeline: MaskPipeline) -> Self {
        Self {
            config: Arc::new(config),
            pipeline: Arc::new(pipeline),
        }
    }
}
