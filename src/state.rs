use std::sync::Arc;

use crate::chat::registry::SessionRegistry;

/// Shared application state passed to all handlers via axum State extractor.
#[derive(Clone)]
pub struct AppState {
    /// Single-room session registry: connection id -> outbound sender + name.
    /// The registry is the only writer of that table.
    pub registry: Arc<SessionRegistry>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            registry: Arc::new(SessionRegistry::new()),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
