use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A named user interaction, such as clicking a button or editing a form
/// control.
///
/// Two synthetic events mark the channel lifecycle: `"connect"` fires when a
/// browser binds its websocket to the view's channel, and `"disconnect"`
/// fires when that connection goes away.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Event {
    /// The name assigned to the interaction in the markup (e.g. the value of
    /// a `live-click` attribute).
    #[serde(default)]
    pub event: String,
    /// Current value of the form control that fired the event, if any.
    #[serde(default)]
    pub value: String,
    /// Channel id the browser addressed the event to.
    #[serde(default)]
    pub channel: String,
}

impl Event {
    pub(crate) fn lifecycle(name: &str) -> Self {
        Event {
            event: name.to_string(),
            ..Event::default()
        }
    }
}

/// A component that can render itself to markup and respond to [`Event`]s.
///
/// Implementations own their state and are shared as `Arc<dyn View>`; the
/// controller holds a reference but never copies or inspects that state.
/// `handle_event` runs inline on the task of the connection that received
/// the event, so a handler that blocks stalls further input from that one
/// connection (and nothing else).
#[async_trait]
pub trait View: Send + Sync {
    /// Write the view's current markup to `out`.
    fn render(&self, out: &mut dyn fmt::Write) -> fmt::Result;

    /// React to a user interaction or lifecycle event.
    async fn handle_event(&self, event: Event);
}

/// Identifies a view by the address of its state, the same identity its
/// `Arc` handles share.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ViewKey(usize);

impl ViewKey {
    pub(crate) fn of(view: &dyn View) -> Self {
        ViewKey(view as *const dyn View as *const () as usize)
    }
}
