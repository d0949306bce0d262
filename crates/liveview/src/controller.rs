use std::fmt;
use std::sync::Arc;

use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::Router;
use thiserror::Error;

use crate::element::ElementRef;
use crate::protocol::{RenderUpdate, ScriptAction};
use crate::registry::{Registry, RegistryConfig};
use crate::view::View;
use crate::websocket::websocket_handler;

/// Script tags that pages embedding live views must include.
pub const JS_TAG: &str = concat!(
    r#"<script src="https://cdn.jsdelivr.net/gh/patrick-steele-idem/morphdom/dist/morphdom-umd.js"></script>"#,
    "\n",
    r#"<script src="/live-view/live-view.js"></script>"#,
);

const LIVE_VIEW_JS: &str = include_str!("../assets/live-view.js");

/// Failure pushing an update or script to a view's browser.
///
/// No push is retried; the caller decides whether a failure means retry,
/// log, or drop.
#[derive(Debug, Error)]
pub enum PushError {
    /// The view has no channel: it was never registered, or its channel went
    /// away with its connection.
    #[error("view is not registered")]
    NotRegistered,
    /// The channel exists but no browser has subscribed to it yet.
    #[error("channel {id} is not connected yet")]
    NotConnected { id: String },
    /// The view's own render failed.
    #[error("render failed: {0}")]
    Render(#[from] fmt::Error),
    /// The outbound message could not be serialized.
    #[error("encode failed: {0}")]
    Encode(#[from] serde_json::Error),
    /// The write to the websocket failed.
    #[error("websocket send failed: {0}")]
    Transport(#[source] axum::Error),
}

/// Manages a collection of live views and the websocket connections backing
/// them.
///
/// Create one per server, share it as `Arc<Controller>`, and merge
/// [`Controller::router`] into the application router.
pub struct Controller {
    registry: Registry,
}

impl Controller {
    /// A controller with the default garbage-collection thresholds.
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Controller {
            registry: Registry::new(config),
        }
    }

    pub(crate) fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register views and prepare to accept websocket subscriptions for
    /// them. Views that already have a channel are left untouched.
    pub fn register(&self, views: Vec<Arc<dyn View>>) {
        self.registry.register(views);
    }

    /// Render `view` to `out`, wrapped in the marker element the browser
    /// script uses to find and patch it. The view is registered
    /// automatically if it was not registered already.
    pub fn render(&self, out: &mut dyn fmt::Write, view: Arc<dyn View>) -> fmt::Result {
        let channel = self.registry.ensure(view);
        write!(out, r#"<div data-live-view="{}"><div>"#, channel.id())?;
        channel.view().render(out)?;
        out.write_str("</div></div>")
    }

    /// Re-render `view` and push the fresh markup to its subscribed browser.
    pub async fn update(&self, view: &dyn View) -> Result<(), PushError> {
        let channel = self
            .registry
            .channel_for_view(view)
            .ok_or(PushError::NotRegistered)?;
        let socket = Arc::clone(channel.socket().ok_or_else(|| PushError::NotConnected {
            id: channel.id().to_string(),
        })?);

        let mut markup = String::new();
        channel.view().render(&mut markup)?;
        let payload = serde_json::to_string(&RenderUpdate {
            render: &markup,
            id: channel.id(),
        })?;
        socket.send_text(payload).await.map_err(PushError::Transport)
    }

    /// Push a script for the browser to run with `this` bound to the first
    /// element matching `selector` inside the view's root.
    pub async fn run_script(
        &self,
        view: &dyn View,
        selector: &str,
        script: &str,
    ) -> Result<(), PushError> {
        let channel = self
            .registry
            .channel_for_view(view)
            .ok_or(PushError::NotRegistered)?;
        let socket = Arc::clone(channel.socket().ok_or_else(|| PushError::NotConnected {
            id: channel.id().to_string(),
        })?);

        let payload = serde_json::to_string(&ScriptAction {
            id: channel.id(),
            selector,
            action: script,
        })?;
        socket.send_text(payload).await.map_err(PushError::Transport)
    }

    /// A reference to the first element matching `selector` within the
    /// view's root, for running remote actions against it.
    pub fn query_selector<'a>(&'a self, view: &'a dyn View, selector: &str) -> ElementRef<'a> {
        ElementRef::new(self, view, selector.to_string())
    }

    /// Routes for the websocket endpoint and the browser script asset.
    /// Merge into the application router; unmatched paths fall through to
    /// its 404.
    pub fn router(self: Arc<Self>) -> Router {
        Router::new()
            .route("/live-view/socket", get(websocket_handler))
            .route("/live-view/live-view.js", get(serve_script))
            .with_state(self)
    }
}

impl Default for Controller {
    fn default() -> Self {
        Self::new()
    }
}

async fn serve_script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/javascript")],
        LIVE_VIEW_JS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::Event;
    use async_trait::async_trait;

    struct Probe;

    #[async_trait]
    impl View for Probe {
        fn render(&self, out: &mut dyn fmt::Write) -> fmt::Result {
            out.write_str("<p>probe</p>")
        }

        async fn handle_event(&self, _event: Event) {}
    }

    #[tokio::test]
    async fn update_requires_registration_then_connection() {
        let controller = Controller::new();
        let view = Arc::new(Probe);

        let err = controller
            .update(view.as_ref())
            .await
            .expect_err("never registered");
        assert!(matches!(err, PushError::NotRegistered));

        controller.register(vec![view.clone()]);
        let err = controller
            .update(view.as_ref())
            .await
            .expect_err("not yet subscribed");
        assert!(matches!(err, PushError::NotConnected { .. }));
    }

    #[tokio::test]
    async fn run_script_requires_registration() {
        let controller = Controller::new();
        let view = Arc::new(Probe);

        let err = controller
            .run_script(view.as_ref(), "p", "this.remove();")
            .await
            .expect_err("never registered");
        assert!(matches!(err, PushError::NotRegistered));
    }

    #[test]
    fn render_wraps_markup_and_registers() {
        let controller = Controller::new();
        let view = Arc::new(Probe);

        let mut first = String::new();
        controller
            .render(&mut first, view.clone())
            .expect("render to string");
        assert!(first.starts_with(r#"<div data-live-view=""#));
        assert!(first.ends_with("<div><p>probe</p></div></div>"));

        // A second render reuses the same channel.
        let mut second = String::new();
        controller
            .render(&mut second, view.clone())
            .expect("render to string");
        assert_eq!(first, second);
    }
}
