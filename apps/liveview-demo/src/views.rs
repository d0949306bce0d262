use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use async_trait::async_trait;
use liveview::{Controller, Event, View};
use tracing::debug;

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// A counter with increment/decrement buttons.
pub struct ClickCounter {
    controller: Arc<Controller>,
    count: AtomicI64,
}

impl ClickCounter {
    pub fn new(controller: Arc<Controller>) -> Arc<Self> {
        Arc::new(ClickCounter {
            controller,
            count: AtomicI64::new(0),
        })
    }
}

#[async_trait]
impl View for ClickCounter {
    fn render(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(
            out,
            r#"<button live-click="decrement">-</button>{}<button live-click="increment">+</button>"#,
            self.count.load(Ordering::SeqCst)
        )
    }

    async fn handle_event(&self, event: Event) {
        match event.event.as_str() {
            "increment" => {
                self.count.fetch_add(1, Ordering::SeqCst);
            }
            "decrement" => {
                self.count.fetch_sub(1, Ordering::SeqCst);
            }
            _ => return,
        }
        if let Err(error) = self.controller.update(self).await {
            debug!(%error, "counter update not delivered");
        }
    }
}

/// Shows the current time, pushed down once a second while a browser is
/// connected.
pub struct Clock {
    controller: Arc<Controller>,
    this: Weak<Clock>,
}

impl Clock {
    pub fn new(controller: Arc<Controller>) -> Arc<Self> {
        Arc::new_cyclic(|this| Clock {
            controller,
            this: this.clone(),
        })
    }
}

#[async_trait]
impl View for Clock {
    fn render(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        write!(
            out,
            "<time>{}</time>",
            chrono::Local::now().format("%b %-d, %Y %-I:%M:%S %p")
        )
    }

    async fn handle_event(&self, event: Event) {
        if event.event != "connect" {
            return;
        }
        // Tick until the push fails, which means the channel is gone.
        let this = self.this.clone();
        tokio::spawn(async move {
            loop {
                let Some(clock) = this.upgrade() else { break };
                if clock.controller.update(clock.as_ref()).await.is_err() {
                    break;
                }
                drop(clock);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        });
    }
}

/// A checkbox that reports its state.
pub struct Checkbox {
    controller: Arc<Controller>,
    checked: AtomicBool,
}

impl Checkbox {
    pub fn new(controller: Arc<Controller>) -> Arc<Self> {
        Arc::new(Checkbox {
            controller,
            checked: AtomicBool::new(false),
        })
    }
}

#[async_trait]
impl View for Checkbox {
    fn render(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        let checked = self.checked.load(Ordering::SeqCst);
        write!(
            out,
            r#"<label><input type="checkbox" live-change="toggle" {}>{}</label>"#,
            if checked { "checked" } else { "" },
            checked
        )
    }

    async fn handle_event(&self, event: Event) {
        if event.event != "toggle" {
            return;
        }
        self.checked.store(event.value == "true", Ordering::SeqCst);
        if let Err(error) = self.controller.update(self).await {
            debug!(%error, "checkbox update not delivered");
        }
    }
}

/// Echoes whatever is typed into its input.
pub struct Textbox {
    controller: Arc<Controller>,
    value: Mutex<String>,
}

impl Textbox {
    pub fn new(controller: Arc<Controller>) -> Arc<Self> {
        Arc::new(Textbox {
            controller,
            value: Mutex::new(String::new()),
        })
    }
}

#[async_trait]
impl View for Textbox {
    fn render(&self, out: &mut dyn fmt::Write) -> fmt::Result {
        let value = html_escape(&self.value.lock().expect("value lock"));
        write!(
            out,
            r#"<label>Echo your input: <input live-input="input" value="{value}"></label><div>{value}</div>"#
        )
    }

    async fn handle_event(&self, event: Event) {
        if event.event != "input" {
            return;
        }
        *self.value.lock().expect("value lock") = event.value;
        if let Err(error) = self.controller.update(self).await {
            debug!(%error, "textbox update not delivered");
        }
    }
}
