use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::socket::SharedSocket;
use crate::view::View;

/// Generate a new channel id.
pub(crate) fn generate_channel_id() -> String {
    Uuid::new_v4().to_string()
}

/// The binding between one view instance, its id, and (once a browser has
/// subscribed) its websocket.
pub(crate) struct Channel {
    id: String,
    view: Arc<dyn View>,
    socket: OnceLock<Arc<SharedSocket>>,
    created: Instant,
}

impl Channel {
    pub(crate) fn new(view: Arc<dyn View>) -> Self {
        Channel {
            id: generate_channel_id(),
            view,
            socket: OnceLock::new(),
            created: Instant::now(),
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    pub(crate) fn view(&self) -> &Arc<dyn View> {
        &self.view
    }

    /// Bind a connection's socket to this channel. Returns false if another
    /// connection got here first; a channel keeps its first transport for
    /// life, so the socket can be read without a lock once set.
    pub(crate) fn bind(&self, socket: Arc<SharedSocket>) -> bool {
        self.socket.set(socket).is_ok()
    }

    pub(crate) fn socket(&self) -> Option<&Arc<SharedSocket>> {
        self.socket.get()
    }

    pub(crate) fn is_bound(&self) -> bool {
        self.socket.get().is_some()
    }

    pub(crate) fn age(&self) -> Duration {
        self.created.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_ids_are_unique() {
        let id1 = generate_channel_id();
        let id2 = generate_channel_id();
        assert_ne!(id1, id2);
        assert_eq!(id1.len(), 36); // UUID v4 format
    }
}
