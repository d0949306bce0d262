use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::Response;
use futures_util::StreamExt;
use tracing::{debug, warn};

use crate::channel::Channel;
use crate::controller::Controller;
use crate::protocol::{decode_client_frame, ClientFrame};
use crate::socket::SharedSocket;
use crate::view::Event;

/// GET /live-view/socket, upgrading to the live-view websocket.
pub(crate) async fn websocket_handler(
    State(controller): State<Arc<Controller>>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, controller))
}

/// Per-connection session loop.
///
/// Frames are decoded and dispatched one at a time, in arrival order, so a
/// slow view handler stalls only this connection. `subscriptions` is the
/// local authorization boundary: interaction events are only routed to
/// channels this connection subscribed to itself, never straight from the
/// registry.
async fn handle_socket(socket: WebSocket, controller: Arc<Controller>) {
    let (sink, mut stream) = socket.split();
    let shared = Arc::new(SharedSocket::new(sink));
    let mut subscriptions: HashMap<String, Arc<Channel>> = HashMap::new();

    debug!("live-view connection open");

    while let Some(frame) = stream.next().await {
        let message = match frame {
            Ok(message) => message,
            Err(error) => {
                warn!(%error, "websocket read failed");
                break;
            }
        };

        match message {
            Message::Text(text) => {
                handle_frame(&controller, &shared, &mut subscriptions, &text).await;
            }
            // The browser script sends text frames, but JSON arriving in a
            // binary frame is accepted the same way.
            Message::Binary(data) => {
                if let Ok(text) = String::from_utf8(data) {
                    handle_frame(&controller, &shared, &mut subscriptions, &text).await;
                }
            }
            Message::Close(_) => break,
            Message::Ping(_) | Message::Pong(_) => {}
        }
    }

    // The connection is gone. Notify views and drop their channels.
    for (_, channel) in subscriptions.drain() {
        controller.registry().remove(&channel);
        channel
            .view()
            .handle_event(Event::lifecycle("disconnect"))
            .await;
        debug!(channel_id = %channel.id(), "channel disconnected");
    }

    debug!("live-view connection closed");
}

async fn handle_frame(
    controller: &Controller,
    shared: &Arc<SharedSocket>,
    subscriptions: &mut HashMap<String, Arc<Channel>>,
    raw: &str,
) {
    match decode_client_frame(raw) {
        Some(ClientFrame::Subscribe(id)) => {
            let Some(channel) = controller.registry().channel_by_id(&id) else {
                // Unknown id: the channel may have been collected, or the
                // client is guessing. Either way, drop it.
                debug!(channel_id = %id, "subscribe for unknown channel ignored");
                return;
            };
            if !channel.bind(Arc::clone(shared)) {
                debug!(channel_id = %id, "subscribe for already-bound channel ignored");
                return;
            }
            subscriptions.insert(channel.id().to_string(), Arc::clone(&channel));
            debug!(channel_id = %channel.id(), "channel subscribed");
            channel
                .view()
                .handle_event(Event::lifecycle("connect"))
                .await;
        }
        Some(ClientFrame::Event(event)) => match subscriptions.get(&event.channel) {
            Some(channel) => {
                channel.view().handle_event(event).await;
            }
            None => {
                debug!(
                    channel_id = %event.channel,
                    event = %event.event,
                    "event for unsubscribed channel ignored"
                );
            }
        },
        None => {
            // Not a frame we understand. Tolerate and move on.
        }
    }
}
