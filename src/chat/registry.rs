//! Single-room session registry: the one authority for join/leave/broadcast
//! semantics.
//!
//! In-memory table (DashMap) mapping connection id to outbound sender plus
//! the display name the connection has claimed, if any. Handlers receive the
//! registry through `AppState`; nothing else writes the table.

use axum::extract::ws::Message;
use dashmap::DashMap;
use rand::Rng;

use crate::ws::protocol::{ChatMessage, ServerEvent};
use crate::ws::{ConnectionId, ConnectionSender};

/// Sender label used for join/leave announcements.
const SYSTEM_USER: &str = "System";

/// One live connection tracked by the registry.
struct Session {
    tx: ConnectionSender,
    /// `None` until the client claims a display name.
    name: Option<String>,
}

/// Connection id -> session table for the single chat room.
///
/// Display names are not unique: two connections may claim the same name.
/// Every broadcast goes to the snapshot of connections open at the moment
/// it is issued, as a fire-and-forget push into each connection's channel.
pub struct SessionRegistry {
    sessions: DashMap<ConnectionId, Session>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Register a freshly opened connection. The client has no name yet,
    /// so nothing is broadcast.
    pub fn register(&self, conn_id: ConnectionId, tx: ConnectionSender) {
        self.sessions.insert(conn_id, Session { tx, name: None });
        tracing::debug!(
            conn_id = %conn_id,
            connections = self.sessions.len(),
            "Connection registered"
        );
    }

    /// Claim a display name for a connection and announce the join to the
    /// whole room, the caller included.
    ///
    /// A name that trims to empty falls back to `Guest<n>` with a fresh
    /// random `n` in 0..1000 per call; collisions are accepted. Calling this
    /// again overwrites the previous name and announces "joined" again
    /// (silent rename, matching the original relay's behavior). Never fails.
    pub fn set_username(&self, conn_id: ConnectionId, raw_name: &str) {
        let name = match raw_name.trim() {
            "" => format!("Guest{}", rand::rng().random_range(0..1000)),
            trimmed => trimmed.to_string(),
        };

        {
            // Guard must drop before broadcast iterates the same map.
            let Some(mut session) = self.sessions.get_mut(&conn_id) else {
                // setUsername raced with disconnect; nothing to announce.
                tracing::debug!(conn_id = %conn_id, "setUsername for unknown connection");
                return;
            };
            session.name = Some(name.clone());
        }

        tracing::debug!(conn_id = %conn_id, name = %name, "Display name claimed");
        self.broadcast(ChatMessage {
            user: SYSTEM_USER.to_string(),
            text: format!("{name} joined the chat"),
        });
    }

    /// Relay a chat message to the whole room.
    ///
    /// A message from a connection that never claimed a name, or one that
    /// trims to empty, is dropped silently: no broadcast, no error back to
    /// the sender.
    pub fn send_message(&self, conn_id: ConnectionId, raw_text: &str) {
        let text = raw_text.trim();
        if text.is_empty() {
            tracing::debug!(conn_id = %conn_id, "Dropping empty message");
            return;
        }

        let Some(user) = self.sessions.get(&conn_id).and_then(|s| s.name.clone()) else {
            tracing::debug!(conn_id = %conn_id, "Dropping message from unnamed connection");
            return;
        };

        self.broadcast(ChatMessage {
            user,
            text: text.to_string(),
        });
    }

    /// Remove a closed connection and, if it had joined, announce the leave
    /// to everyone still connected. The entry is removed before the
    /// broadcast, so the departing connection never receives its own
    /// leave notice. Runs exactly once per connection, driven by the actor
    /// teardown.
    pub fn disconnect(&self, conn_id: ConnectionId) {
        let Some((_, session)) = self.sessions.remove(&conn_id) else {
            return;
        };

        tracing::debug!(
            conn_id = %conn_id,
            connections = self.sessions.len(),
            "Connection unregistered"
        );

        if let Some(name) = session.name {
            self.broadcast(ChatMessage {
                user: SYSTEM_USER.to_string(),
                text: format!("{name} left the chat"),
            });
        }
    }

    /// Number of currently open connections.
    pub fn connection_count(&self) -> usize {
        self.sessions.len()
    }

    /// Fan a notification out to every open connection. Fire and forget:
    /// a send to a connection whose writer already died is ignored.
    fn broadcast(&self, message: ChatMessage) {
        let event = ServerEvent::Message(message);
        let json = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(_) => return,
        };
        let frame = Message::Text(json.into());

        for entry in self.sessions.iter() {
            let _ = entry.value().tx.send(frame.clone());
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
