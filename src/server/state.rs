//! Application state management

use crate::bundle::ModelBundle;
use std::sync::Arc;

use super::ServerConfig;

/// State shared across handlers. The model bundle is loaded once at startup
/// and never mutated afterwards, so concurrent batch calls need no locking.
pub struct AppState {
    pub config: ServerConfig,
    pub bundle: Arc<ModelBundle>,
}

impl AppState {
    pub fn new(config: ServerConfig, bundle: ModelBundle) -> Self {
        Self {
            config,
            bundle: Arc::new(bundle),
        }
    }
}
