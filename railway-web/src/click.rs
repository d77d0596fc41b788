//! Scripted clicks for tours that need to open a drawer or menu before the
//! next station exists.

use wasm_bindgen::JsCast;
use web_sys::{
    Element, HtmlElement, MouseEvent, MouseEventInit, ScrollBehavior, ScrollIntoViewOptions,
    ScrollLogicalPosition,
};

use crate::dom;

const POLL_INTERVAL_MS: i32 = 50;

/// What to click.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    Selector(String),
    Element(Element),
}

impl From<&str> for ClickTarget {
    fn from(selector: &str) -> Self {
        Self::Selector(selector.to_string())
    }
}

impl From<Element> for ClickTarget {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

/// Options for [`click_element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickOptions {
    /// Center the element in view before clicking.
    pub scroll_into_view: bool,
    pub scroll_behavior: ScrollBehavior,
    pub focus_after_click: bool,
    /// Fixed pause after the click, e.g. for a drawer animation.
    pub wait_ms_after_click: u32,
    /// Poll until this selector matches (or the timeout passes).
    pub wait_for: Option<String>,
    pub wait_timeout_ms: u32,
}

impl Default for ClickOptions {
    fn default() -> Self {
        Self {
            scroll_into_view: false,
            scroll_behavior: ScrollBehavior::Auto,
            focus_after_click: false,
            wait_ms_after_click: 0,
            wait_for: None,
            wait_timeout_ms: 1500,
        }
    }
}

impl ClickOptions {
    #[must_use]
    pub fn wait_ms(mut self, ms: u32) -> Self {
        self.wait_ms_after_click = ms;
        self
    }

    #[must_use]
    pub fn wait_for(mut self, selector: impl Into<String>) -> Self {
        self.wait_for = Some(selector.into());
        self
    }
}

fn resolve(target: ClickTarget) -> Option<Element> {
    match target {
        ClickTarget::Element(el) => Some(el),
        ClickTarget::Selector(selector) if selector.is_empty() => None,
        ClickTarget::Selector(selector) => {
            dom::document()?.query_selector(&selector).ok().flatten()
        }
    }
}

fn dispatch_mouse(el: &Element, kind: &str) {
    let init = MouseEventInit::new();
    init.set_bubbles(true);
    init.set_cancelable(true);
    init.set_view(dom::window().as_ref());
    match MouseEvent::new_with_mouse_event_init_dict(kind, &init) {
        Ok(event) => {
            let _ = el.dispatch_event(&event);
        }
        Err(err) => log::debug!("could not create {kind}: {}", dom::js_error_message(&err)),
    }
}

fn ms_to_i32(ms: u32) -> i32 {
    i32::try_from(ms).unwrap_or(i32::MAX)
}

/// Click an element the way a user would, then optionally wait.
///
/// Returns `false` when there is no browser or the target cannot be resolved.
#[allow(clippy::future_not_send)] // Wasm futures rely on `JsFuture`, which is not `Send`.
pub async fn click_element(target: impl Into<ClickTarget>, options: ClickOptions) -> bool {
    if dom::document().is_none() {
        return false;
    }
    let Some(el) = resolve(target.into()) else {
        return false;
    };

    if options.scroll_into_view {
        let scroll = ScrollIntoViewOptions::new();
        scroll.set_behavior(options.scroll_behavior);
        scroll.set_block(ScrollLogicalPosition::Center);
        scroll.set_inline(ScrollLogicalPosition::Nearest);
        el.scroll_into_view_with_scroll_into_view_options(&scroll);
    }

    for kind in ["pointerdown", "mousedown", "mouseup", "click"] {
        dispatch_mouse(&el, kind);
    }

    if options.focus_after_click
        && let Some(html) = el.dyn_ref::<HtmlElement>()
    {
        let _ = html.focus();
    }

    if options.wait_ms_after_click > 0 {
        let _ = dom::sleep_ms(ms_to_i32(options.wait_ms_after_click)).await;
    }

    if let Some(selector) = options.wait_for.as_deref() {
        let started = dom::now_ms();
        while dom::now_ms() - started < f64::from(options.wait_timeout_ms) {
            let found = dom::document()
                .and_then(|doc| doc.query_selector(selector).ok().flatten())
                .is_some();
            if found {
                break;
            }
            if dom::sleep_ms(POLL_INTERVAL_MS).await.is_err() {
                break;
            }
        }
    }

    true
}
