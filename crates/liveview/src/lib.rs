//! Server-side live views over websockets.
//!
//! A view renders itself to HTML on the server; the browser displays it and
//! keeps a websocket open. When the view's state changes, the server pushes
//! re-rendered markup down to be patched into the page, and user interactions
//! travel back up as named [`Event`]s. The [`Controller`] owns everything in
//! between: one channel per registered view, at most one live connection per
//! channel, event routing, and outbound dispatch.
//!
//! Pages that embed live views must include [`JS_TAG`] and merge
//! [`Controller::router`] into their application router.

mod channel;
mod controller;
mod element;
mod protocol;
mod registry;
mod socket;
mod view;
mod websocket;

pub use async_trait::async_trait;
pub use controller::{Controller, PushError, JS_TAG};
pub use element::ElementRef;
pub use registry::RegistryConfig;
pub use view::{Event, View};
