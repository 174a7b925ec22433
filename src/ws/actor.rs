use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, timeout};

use crate::state::AppState;
use crate::ws::protocol;

/// Server sends a WebSocket ping on this interval to detect abrupt
/// disconnects, which would otherwise leak presence counts.
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// If no pong arrives within this window after a ping, the connection is
/// considered dead and closed.
const PONG_TIMEOUT: Duration = Duration::from_secs(10);

/// Run the actor-per-connection pattern for one WebSocket.
///
/// Splits the socket into reader and writer halves:
/// - Writer task: owns the sink, forwards frames from an mpsc channel
/// - Reader loop: parses incoming frames and dispatches them to the room
///
/// The room holds a clone of the mpsc sender, which is how broadcasts reach
/// this client. The connection starts unauthenticated; role is established
/// by an in-band `join` event.
pub async fn run_connection(socket: WebSocket, state: AppState) {
    let connection_id = state.next_connection_id();
    let (ws_sender, mut ws_receiver) = socket.split();
    let (tx, rx) = mpsc::unbounded_channel::<Message>();

    state.room().add_connection(connection_id, tx.clone());
    tracing::info!(connection_id, "websocket connected");

    // Writer task: forwards mpsc frames to the WebSocket sink.
    let writer_handle = tokio::spawn(writer_task(ws_sender, rx));

    // Ping task: periodic pings, close if the pong goes missing.
    let (pong_tx, mut pong_rx) = mpsc::unbounded_channel::<()>();
    let ping_tx = tx.clone();
    let ping_handle = tokio::spawn(async move {
        let mut ping_timer = interval(PING_INTERVAL);
        // skip the immediate first tick
        ping_timer.tick().await;

        loop {
            ping_timer.tick().await;

            if ping_tx.send(Message::Ping(vec![1, 2, 3, 4].into())).is_err() {
                // writer task has died, connection is gone
                break;
            }

            match timeout(PONG_TIMEOUT, pong_rx.recv()).await {
                Ok(Some(())) => {}
                _ => {
                    tracing::warn!("pong timeout, closing connection");
                    let _ = ping_tx.send(Message::Close(Some(CloseFrame {
                        code: 1001,
                        reason: "Pong timeout".into(),
                    })));
                    break;
                }
            }
        }
    });

    // Reader loop.
    loop {
        match ws_receiver.next().await {
            Some(Ok(frame)) => match frame {
                Message::Text(text) => {
                    protocol::handle_frame(&state, connection_id, &text);
                }
                Message::Binary(_) => {
                    tracing::debug!(connection_id, "ignoring binary frame on text protocol");
                }
                Message::Pong(_) => {
                    let _ = pong_tx.send(());
                }
                Message::Ping(data) => {
                    let _ = tx.send(Message::Pong(data));
                }
                Message::Close(frame) => {
                    tracing::info!(connection_id, reason = ?frame, "client initiated close");
                    break;
                }
            },
            Some(Err(err)) => {
                tracing::warn!(connection_id, %err, "websocket receive error");
                break;
            }
            None => {
                tracing::info!(connection_id, "websocket stream ended");
                break;
            }
        }
    }

    writer_handle.abort();
    ping_handle.abort();

    // A vote or post applied just before this point stays applied; only the
    // session record and its presence count are rolled up.
    state.room().remove_connection(connection_id);
    tracing::info!(connection_id, "websocket actor stopped");
}

/// Writer task: receives frames from the mpsc channel and forwards them to
/// the WebSocket sink.
async fn writer_task(
    mut ws_sender: futures_util::stream::SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(frame) = rx.recv().await {
        if ws_sender.send(frame).await.is_err() {
            break;
        }
    }
}
