//! Railway Tour Engine
//!
//! Platform-agnostic core of the Railway guided-tour overlay.
//! This crate coordinates tours, sequences stations and computes highlight and
//! popover geometry without UI or platform-specific dependencies. Browsers plug
//! in through the [`ElementLocator`], [`Scheduler`], [`ViewportEvents`] and
//! [`FlagStore`] traits.

pub mod coordinator;
pub mod engine;
pub mod error;
pub mod geometry;
pub mod headless;
pub mod host;
pub mod locator;
pub mod position;
pub mod session;
pub mod station;
pub mod store;
pub mod tour;

// Re-export commonly used types
pub use coordinator::{Action, Coordination, Coordinator, CoordinatorState};
pub use engine::{
    EngineState, StationHost, StepDriver, StepEngine, StepGeometry, StepView, Transition,
    resolve_geometry,
};
pub use error::{HookError, RailwayError, StorageError};
pub use geometry::{Offset, Placement, Rect, Size, Viewport, center_offset};
pub use headless::{SimHost, SimulatedPage, VirtualScheduler};
pub use host::{CancelFlag, Scheduler, Subscription, ViewportEvents};
pub use locator::{ElementLocator, STATION_ATTRIBUTE, measure_once, station_selector};
pub use position::{FlipPositioner, OffsetRule, PopoverPosition, PositionRequest, Positioner};
pub use session::{MountedTour, Session, SessionDriver};
pub use station::{Hook, HookFuture, Station, StationId, StationTarget, run_best_effort};
pub use store::{
    FlagKind, FlagStore, MemoryFlagStore, PersistedFlags, decode_flag, encode_flag, storage_key,
};
pub use tour::{CloseHandler, EngineSettings, Labels, Tour, TourConfig, TourId, Trigger};
