//! Element locator: station id → live rectangle.
use crate::geometry::{Rect, Viewport};
use crate::host::Scheduler;
use crate::station::StationId;

/// Attribute hosts put on elements that can be highlighted.
pub const STATION_ATTRIBUTE: &str = "data-railway-station";

/// CSS selector for a station target.
#[must_use]
pub fn station_selector(id: &StationId) -> String {
    let escaped = id.as_str().replace('\\', "\\\\").replace('"', "\\\"");
    format!("[{STATION_ATTRIBUTE}=\"{escaped}\"]")
}

/// Read access to the host page geometry.
pub trait ElementLocator {
    /// Bounding rectangle of the first element tagged with `id`, right now.
    fn locate(&self, id: &StationId) -> Option<Rect>;

    /// Smooth-scroll the target into the nearest view. Returns `false` when
    /// there is nothing to scroll to.
    fn scroll_into_view(&self, id: &StationId) -> bool;

    /// Current client area.
    fn viewport(&self) -> Viewport;
}

/// Measure a station after layout settles.
///
/// A missing target is not an error: it yields `None` ("nothing to highlight
/// yet") without waiting for a frame.
pub async fn measure_once<H>(host: &H, id: &StationId) -> Option<Rect>
where
    H: ElementLocator + Scheduler + ?Sized,
{
    host.locate(id)?;
    host.next_frame().await;
    host.locate(id)
}
