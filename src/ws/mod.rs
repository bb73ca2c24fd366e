pub mod actor;
pub mod handler;
pub mod protocol;

use tokio::sync::mpsc;
use uuid::Uuid;

/// Transport-assigned identifier for one live WebSocket connection.
/// Generated at upgrade time, stable until disconnect, never reused.
pub type ConnectionId = Uuid;

/// Type alias for the sender half of a WebSocket connection's channel.
/// Other parts of the system can clone this to push messages to a specific client.
pub type ConnectionSender = mpsc::UnboundedSender<axum::extract::ws::Message>;
