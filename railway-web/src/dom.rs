use js_sys::{Function, Promise};
use railway_core::{Rect, StationId, Viewport, station_selector};
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Document, DomRect, Element, Storage, Window};

/// The global `window`, if running in a browser.
#[must_use]
pub fn window() -> Option<Window> {
    web_sys::window()
}

/// The page document, if running in a browser.
#[must_use]
pub fn document() -> Option<Document> {
    window().and_then(|win| win.document())
}

/// Convert a JavaScript value into a readable string for error reporting.
#[must_use]
pub fn js_error_message(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|err| err.message().into())
        })
        .unwrap_or_else(|| format!("{value:?}"))
}

fn deferred() -> Result<(Promise, Function), JsValue> {
    let mut resolve_slot: Option<Function> = None;
    let promise = Promise::new(&mut |resolve, _reject| {
        resolve_slot = Some(resolve);
    });
    let resolve =
        resolve_slot.ok_or_else(|| JsValue::from_str("resolve function should be set"))?;
    Ok((promise, resolve))
}

/// Yield execution for the requested number of milliseconds.
///
/// # Errors
/// Returns an error if there is no window, the timer cannot be scheduled or
/// the underlying JavaScript promise rejects.
#[allow(clippy::future_not_send)] // Wasm futures rely on `JsFuture`, which is not `Send`.
pub async fn sleep_ms(duration_ms: i32) -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("window unavailable"))?;
    let (promise, resolve) = deferred()?;
    let closure = Closure::once(move || {
        let _ = resolve.call0(&JsValue::UNDEFINED);
    });

    let _ = win.set_timeout_with_callback_and_timeout_and_arguments_0(
        closure.as_ref().unchecked_ref(),
        duration_ms,
    )?;
    closure.forget();

    JsFuture::from(promise).await?;
    Ok(())
}

/// Resolve on the next animation frame.
///
/// # Errors
/// Returns an error if there is no window or the frame cannot be requested.
#[allow(clippy::future_not_send)] // Wasm futures rely on `JsFuture`, which is not `Send`.
pub async fn next_frame() -> Result<(), JsValue> {
    let win = window().ok_or_else(|| JsValue::from_str("window unavailable"))?;
    let (promise, resolve) = deferred()?;
    let closure = Closure::once(move |_timestamp: f64| {
        let _ = resolve.call0(&JsValue::UNDEFINED);
    });

    win.request_animation_frame(closure.as_ref().unchecked_ref())?;
    closure.forget();

    JsFuture::from(promise).await?;
    Ok(())
}

/// Access the browser `localStorage` handle.
///
/// # Errors
/// Returns an error if the browser window cannot be accessed or `localStorage` is unavailable.
pub fn local_storage() -> Result<Storage, JsValue> {
    window()
        .ok_or_else(|| JsValue::from_str("window unavailable"))?
        .local_storage()?
        .ok_or_else(|| JsValue::from_str("localStorage unavailable"))
}

/// First element tagged with `data-railway-station="<id>"`.
#[must_use]
pub fn query_station(id: &StationId) -> Option<Element> {
    document()?
        .query_selector(&station_selector(id))
        .ok()
        .flatten()
}

#[must_use]
pub fn rect_from_dom(rect: &DomRect) -> Rect {
    Rect::new(rect.top(), rect.left(), rect.width(), rect.height())
}

/// Current client area; zero-sized outside a browser.
#[must_use]
pub fn viewport() -> Viewport {
    let Some(win) = window() else {
        return Viewport::default();
    };
    let dimension = |value: Result<JsValue, JsValue>| {
        value.ok().and_then(|v| v.as_f64()).unwrap_or_default()
    };
    Viewport::new(dimension(win.inner_width()), dimension(win.inner_height()))
}

/// Milliseconds since page load.
#[must_use]
pub fn now_ms() -> f64 {
    window()
        .and_then(|win| win.performance())
        .map(|perf| perf.now())
        .unwrap_or_default()
}
