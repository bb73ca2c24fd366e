//! JSON wire protocol for the chat WebSocket.
//!
//! One JSON object per text frame, tagged by `type`. Malformed or unknown
//! frames are logged and ignored, never answered with an error.

use serde::{Deserialize, Serialize};

use crate::chat::registry::SessionRegistry;
use crate::ws::ConnectionId;

/// Inbound application events sent by the chat client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Claim (or overwrite) a display name.
    SetUsername(String),
    /// Relay a chat message to the room.
    SendMessage(String),
}

/// Outbound broadcast events pushed to every connected client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    Message(ChatMessage),
}

/// A single chat notification. `user` is either a claimed display name or
/// the literal `"System"` for join/leave announcements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub user: String,
    pub text: String,
}

/// Handle an incoming text frame: decode the client event and dispatch
/// it to the session registry.
pub fn handle_text_message(text: &str, registry: &SessionRegistry, conn_id: ConnectionId) {
    let event = match serde_json::from_str::<ClientEvent>(text) {
        Ok(event) => event,
        Err(e) => {
            tracing::warn!(
                conn_id = %conn_id,
                error = %e,
                "Ignoring malformed client event"
            );
            return;
        }
    };

    match event {
        ClientEvent::SetUsername(name) => registry.set_username(conn_id, &name),
        ClientEvent::SendMessage(text) => registry.send_message(conn_id, &text),
    }
}
