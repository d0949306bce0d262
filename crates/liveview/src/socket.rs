use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::SplitSink;
use futures_util::SinkExt;
use tokio::sync::Mutex;

/// The write half of one websocket, shared by every producer that pushes to
/// the connection.
///
/// The lock is held for the duration of a single message write, so pushes
/// from unrelated tasks interleave only at message boundaries, never inside
/// one.
pub(crate) struct SharedSocket {
    sink: Mutex<SplitSink<WebSocket, Message>>,
}

impl SharedSocket {
    pub(crate) fn new(sink: SplitSink<WebSocket, Message>) -> Self {
        SharedSocket {
            sink: Mutex::new(sink),
        }
    }

    /// Send one text message as an indivisible unit.
    pub(crate) async fn send_text(&self, payload: String) -> Result<(), axum::Error> {
        let mut sink = self.sink.lock().await;
        sink.send(Message::Text(payload)).await
    }
}
