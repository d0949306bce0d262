mod config;
mod views;

use std::sync::Arc;

use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::Router;
use liveview::{Controller, View, JS_TAG};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::views::{Checkbox, ClickCounter, Clock, Textbox};

#[tokio::main]
async fn main() {
    // Default to WARN level if RUST_LOG is not set
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "warn");
    }
    tracing_subscriber::fmt::init();

    let config = Config::from_env();

    let controller = Arc::new(Controller::new());
    let views: Vec<Arc<dyn View>> = vec![
        ClickCounter::new(Arc::clone(&controller)),
        Clock::new(Arc::clone(&controller)),
        Checkbox::new(Arc::clone(&controller)),
        Textbox::new(Arc::clone(&controller)),
    ];

    let page = PageState {
        controller: Arc::clone(&controller),
        views,
    };

    let app = Router::new()
        .route("/", get(index))
        .with_state(page)
        .merge(Arc::clone(&controller).router())
        .layer(TraceLayer::new_for_http());

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    info!("liveview demo listening on {addr}");

    axum::serve(listener, app)
        .await
        .expect("Failed to start server");
}

#[derive(Clone)]
struct PageState {
    controller: Arc<Controller>,
    views: Vec<Arc<dyn View>>,
}

async fn index(State(state): State<PageState>) -> Html<String> {
    let mut page = String::new();
    page.push_str(
        "<!doctype html>\n<html>\n  <head>\n    <title>Live View Example</title>\n  </head>\n\n  <body>\n    <h1><a href=\"/\">Home</a></h1>\n",
    );
    for view in &state.views {
        let _ = state.controller.render(&mut page, Arc::clone(view));
        page.push('\n');
    }
    page.push_str(JS_TAG);
    page.push_str("\n  </body>\n</html>\n");
    Html(page)
}
