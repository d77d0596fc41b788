//! Railway for yew
//!
//! Browser front end of the Railway tour engine: a context provider that owns
//! the coordinator state, the `<Railway>` component, the DOM host used to
//! measure stations and a `localStorage` flag store.
#![forbid(unsafe_code)]

pub mod click;
pub mod components;
pub mod context;
pub mod dom;
pub mod host;
pub mod storage;

pub use click::{ClickOptions, ClickTarget, click_element};
pub use components::Railway;
pub use context::{
    RailwayContext, RailwayControl, RailwayProvider, RailwayState, try_use_railway, use_railway,
    use_register_railway,
};
pub use host::DomHost;
pub use railway_core::{
    EngineSettings, Hook, HookError, Labels, Station, StationId, StationTarget, TourConfig,
    TourId, Trigger,
};
pub use storage::LocalStorageFlags;

/// Route panics to the browser console. Safe to call more than once.
pub fn install_panic_hook() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}
