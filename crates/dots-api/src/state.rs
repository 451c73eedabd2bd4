//! Application state shared by every handler.

use dots_core::Config;
use dots_services::{
    CatalogClient, DemoSubmissionPipeline, LabelStore, PreviewFallbackClient, VideoFeedClient,
};
use std::sync::Arc;

/// Immutable after startup; the only mutable pieces are the token caches
/// inside the service clients.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub label_store: Arc<LabelStore>,
    pub submissions: Arc<DemoSubmissionPipeline>,
    pub catalog: Arc<dyn CatalogClient>,
    pub previews: Arc<dyn PreviewFallbackClient>,
    pub videos: Arc<dyn VideoFeedClient>,
}
