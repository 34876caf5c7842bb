//! Application state.

use std::sync::Arc;

use reel_db::VideoRepository;
use reel_queue::JobQueue;
use reel_storage::BlobStore;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub repo: VideoRepository,
    pub store: Arc<dyn BlobStore>,
    pub queue: JobQueue,
}

impl AppState {
    pub fn new(
        config: &ApiConfig,
        repo: VideoRepository,
        store: Arc<dyn BlobStore>,
        queue: JobQueue,
    ) -> Self {
        Self {
            config: Arc::new(config.clone()),
            repo,
            store,
            queue,
        }
    }
}
