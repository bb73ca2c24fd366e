use axum::{routing::get, Router};

use crate::page;
use crate::state::AppState;
use crate::ws::handler as ws_handler;

/// Build the axum Router: the embedded chat page and the WebSocket endpoint.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(page::chat_page))
        .route("/ws", get(ws_handler::ws_upgrade))
        .with_state(state)
}
