use crate::controller::{Controller, PushError};
use crate::view::View;

/// A handle to one element inside a view's rendered root, addressed by CSS
/// selector.
///
/// Actions run in the browser with `this` bound to the first element
/// matching the selector; nothing checks that such an element actually
/// exists there.
pub struct ElementRef<'a> {
    controller: &'a Controller,
    view: &'a dyn View,
    selector: String,
}

impl<'a> ElementRef<'a> {
    pub(crate) fn new(controller: &'a Controller, view: &'a dyn View, selector: String) -> Self {
        ElementRef {
            controller,
            view,
            selector,
        }
    }

    /// Run a snippet of JavaScript against the element.
    pub async fn run(&self, script: &str) -> Result<(), PushError> {
        self.controller
            .run_script(self.view, &self.selector, script)
            .await
    }

    /// Set the element's `textContent`.
    pub async fn set_text_content(&self, text: &str) -> Result<(), PushError> {
        self.run(&assignment("this.textContent", text)?).await
    }

    /// Set the element's `innerHTML`. The caller is responsible for having
    /// escaped `html`.
    pub async fn set_inner_html(&self, html: &str) -> Result<(), PushError> {
        self.run(&assignment("this.innerHTML", html)?).await
    }
}

/// Build `target = "<value>";` with the value embedded as a JSON string
/// literal, which is also a valid JavaScript string literal. This keeps the
/// value from breaking out of the script text or the message around it.
fn assignment(target: &str, value: &str) -> Result<String, serde_json::Error> {
    let literal = serde_json::to_string(value)?;
    Ok(format!("{target} = {literal};"))
}
