//! Browser implementation of the engine's host traits.

use futures::FutureExt;
use futures::future::LocalBoxFuture;
use railway_core::{
    ElementLocator, Rect, Scheduler, StationId, Subscription, Viewport, ViewportEvents,
};
use std::rc::Rc;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use web_sys::{ScrollBehavior, ScrollIntoViewOptions, ScrollLogicalPosition};

use crate::dom;

/// Live DOM: `querySelector`, `requestAnimationFrame`, `setTimeout` and
/// window resize/scroll listeners.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DomHost;

impl DomHost {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl ElementLocator for DomHost {
    fn locate(&self, id: &StationId) -> Option<Rect> {
        dom::query_station(id).map(|el| dom::rect_from_dom(&el.get_bounding_client_rect()))
    }

    fn scroll_into_view(&self, id: &StationId) -> bool {
        let Some(el) = dom::query_station(id) else {
            return false;
        };
        let options = ScrollIntoViewOptions::new();
        options.set_behavior(ScrollBehavior::Smooth);
        options.set_block(ScrollLogicalPosition::Nearest);
        options.set_inline(ScrollLogicalPosition::Nearest);
        el.scroll_into_view_with_scroll_into_view_options(&options);
        true
    }

    fn viewport(&self) -> Viewport {
        dom::viewport()
    }
}

impl Scheduler for DomHost {
    fn next_frame(&self) -> LocalBoxFuture<'static, ()> {
        async {
            if let Err(err) = dom::next_frame().await {
                log::debug!("animation frame unavailable: {}", dom::js_error_message(&err));
            }
        }
        .boxed_local()
    }

    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        let ms = i32::try_from(ms).unwrap_or(i32::MAX);
        async move {
            if let Err(err) = dom::sleep_ms(ms).await {
                log::debug!("timer unavailable: {}", dom::js_error_message(&err));
            }
        }
        .boxed_local()
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }
}

impl ViewportEvents for DomHost {
    fn on_viewport_change(&self, listener: Rc<dyn Fn()>) -> Subscription {
        let Some(win) = dom::window() else {
            return Subscription::noop();
        };
        let closure = Closure::<dyn Fn()>::new(move || listener());
        let callback = closure.as_ref().unchecked_ref::<js_sys::Function>().clone();

        let resize = win.add_event_listener_with_callback("resize", &callback);
        // Capturing so scrolls inside nested containers are seen too.
        let scroll = win.add_event_listener_with_callback_and_bool("scroll", &callback, true);
        if let Err(err) = resize.and(scroll) {
            log::debug!("viewport listener not attached: {}", dom::js_error_message(&err));
        }

        Subscription::new(move || {
            let _ = win.remove_event_listener_with_callback("resize", &callback);
            let _ = win.remove_event_listener_with_callback_and_bool("scroll", &callback, true);
            drop(closure);
        })
    }
}
