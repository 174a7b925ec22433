pub mod actor;
pub mod handler;
pub mod protocol;

use tokio::sync::mpsc;

/// Transport-assigned opaque id for one live WebSocket connection.
pub type ConnectionId = u64;

/// Sender half of a connection's outbound channel. The room clones this to
/// push frames to a specific client; the actor's writer task owns the sink.
pub type ConnectionSender = mpsc::UnboundedSender<axum::extract::ws::Message>;
