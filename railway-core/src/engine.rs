//! Single-tour step engine.
//!
//! [`StepEngine`] is the synchronous state machine (index, previous index,
//! resolved geometry). [`StepDriver`] wraps it with the asynchronous parts:
//! lifecycle hooks, measuring, scroll recovery and viewport listeners.
use futures::FutureExt;
use std::cell::{Cell, Ref, RefCell};
use std::rc::{Rc, Weak};

use crate::coordinator::{Coordination, CoordinatorState};
use crate::geometry::{Placement, Rect, Viewport};
use crate::host::{CancelFlag, Scheduler, Subscription, ViewportEvents};
use crate::locator::{ElementLocator, measure_once};
use crate::station::{Hook, Station, StationId, StationTarget, run_best_effort};
use crate::tour::{EngineSettings, Tour, TourConfig, TourId};

/// Everything the driver needs from its environment.
pub trait StationHost: ElementLocator + Scheduler + ViewportEvents {}

impl<T: ElementLocator + Scheduler + ViewportEvents + ?Sized> StationHost for T {}

/// Whether a tour renders anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Active(usize),
}

/// Outcome of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Stay,
    Moved { from: usize, to: usize },
    /// `next` on the last station: mark completed, then close.
    Finish,
}

/// Where the highlight and popover go for the current station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepGeometry {
    pub highlight: Option<Rect>,
    pub anchor: Rect,
    pub placement: Placement,
    /// Popover is centered on a synthetic anchor; no flipping.
    pub centered: bool,
}

impl StepGeometry {
    /// Untargeted (or unresolvable) station: viewport center, positioner picks the side.
    #[must_use]
    pub fn centered(viewport: Viewport) -> Self {
        Self {
            highlight: None,
            anchor: viewport.center_anchor(),
            placement: Placement::Auto,
            centered: true,
        }
    }

    /// Highlight `rect`; prefer `bottom` when it is still off-screen, else `top`.
    #[must_use]
    pub fn targeted(rect: Rect, viewport: Viewport) -> Self {
        let placement = if viewport.is_offscreen_vertically(&rect) {
            Placement::Bottom
        } else {
            Placement::Top
        };
        Self {
            highlight: Some(rect),
            anchor: rect,
            placement,
            centered: false,
        }
    }
}

/// Index bookkeeping for one tour.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepEngine {
    total: usize,
    current: usize,
    prev_step: Option<usize>,
    geometry: Option<StepGeometry>,
}

impl StepEngine {
    #[must_use]
    pub const fn new(total: usize) -> Self {
        Self {
            total,
            current: 0,
            prev_step: None,
            geometry: None,
        }
    }

    #[must_use]
    pub const fn current(&self) -> usize {
        self.current
    }

    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub const fn prev_step(&self) -> Option<usize> {
        self.prev_step
    }

    #[must_use]
    pub const fn geometry(&self) -> Option<&StepGeometry> {
        self.geometry.as_ref()
    }

    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.current == 0
    }

    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.total > 0 && self.current + 1 == self.total
    }

    const fn last_index(&self) -> usize {
        self.total.saturating_sub(1)
    }

    /// Station list changed underneath us; keep the index in range.
    pub fn set_total(&mut self, total: usize) {
        self.total = total;
        self.current = self.current.min(self.last_index());
    }

    #[must_use]
    pub const fn state(&self, is_running: bool) -> EngineState {
        if is_running && self.total > 0 {
            EngineState::Active(self.current)
        } else {
            EngineState::Idle
        }
    }

    pub fn next(&mut self) -> Transition {
        if self.total == 0 {
            return Transition::Stay;
        }
        if self.is_last() {
            return Transition::Finish;
        }
        let from = self.current;
        self.current = (self.current + 1).min(self.last_index());
        Transition::Moved {
            from,
            to: self.current,
        }
    }

    pub fn prev(&mut self) -> Transition {
        if self.current == 0 {
            return Transition::Stay;
        }
        let from = self.current;
        self.current -= 1;
        Transition::Moved {
            from,
            to: self.current,
        }
    }

    /// Reset to the first station. Returns whether the close happened on the last one.
    pub fn close(&mut self) -> bool {
        let at_last = self.is_last();
        self.prev_step = None;
        self.geometry = None;
        self.current = 0;
        at_last
    }

    /// Record arrival at the current index; yields the station being departed,
    /// if any. Each transition reports a departure at most once.
    pub fn begin_transition(&mut self) -> Option<usize> {
        let departing = self.prev_step.filter(|prev| *prev != self.current);
        self.prev_step = Some(self.current);
        departing
    }

    pub fn apply_geometry(&mut self, geometry: StepGeometry) {
        self.geometry = Some(geometry);
    }
}

/// Measure the station, recovering once from an off-screen target.
pub async fn resolve_geometry<H>(
    host: &H,
    target: &StationTarget,
    settle_ms: u32,
) -> StepGeometry
where
    H: ElementLocator + Scheduler + ?Sized,
{
    let Some(id) = target.id() else {
        return StepGeometry::centered(host.viewport());
    };

    let mut rect = measure_once(host, id).await;
    if let Some(found) = rect
        && host.viewport().is_offscreen_vertically(&found)
        && host.scroll_into_view(id)
    {
        log::debug!("station {id} off-screen, scrolling and waiting {settle_ms}ms");
        host.sleep(settle_ms).await;
        rect = measure_once(host, id).await;
    }

    let viewport = host.viewport();
    rect.map_or_else(
        || {
            log::debug!("station {id} not found, centering popover");
            StepGeometry::centered(viewport)
        },
        |rect| StepGeometry::targeted(rect, viewport),
    )
}

/// Read-only view for the presentation shell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepView {
    pub index: usize,
    pub total: usize,
    pub geometry: Option<StepGeometry>,
}

impl StepView {
    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.index == 0
    }

    #[must_use]
    pub const fn is_last(&self) -> bool {
        self.index + 1 >= self.total
    }
}

/// Drives one tour's [`StepEngine`] against a host and a coordinator.
pub struct StepDriver<C, H, K> {
    id: TourId,
    tour: RefCell<Tour<C>>,
    host: Rc<H>,
    control: K,
    settings: EngineSettings,
    engine: RefCell<StepEngine>,
    active: Cell<bool>,
    inflight: RefCell<CancelFlag>,
    listeners: RefCell<Option<Subscription>>,
    notify: RefCell<Option<Rc<dyn Fn()>>>,
    this: Weak<Self>,
}

impl<C, H, K> StepDriver<C, H, K>
where
    C: 'static,
    H: StationHost + 'static,
    K: Coordination + 'static,
{
    pub fn new(tour: Tour<C>, host: Rc<H>, control: K, settings: EngineSettings) -> Rc<Self> {
        let total = tour.len();
        Rc::new_cyclic(|this| Self {
            id: tour.id.clone(),
            tour: RefCell::new(tour),
            host,
            control,
            settings,
            engine: RefCell::new(StepEngine::new(total)),
            active: Cell::new(false),
            inflight: RefCell::new(CancelFlag::new()),
            listeners: RefCell::new(None),
            notify: RefCell::new(None),
            this: this.clone(),
        })
    }

    /// Called whenever rendered state changes (step, geometry, close).
    pub fn set_notify(&self, notify: impl Fn() + 'static) {
        *self.notify.borrow_mut() = Some(Rc::new(notify));
    }

    #[must_use]
    pub const fn id(&self) -> &TourId {
        &self.id
    }

    /// Swap in new stations and config while keeping the current step.
    /// Hooks only run again if the step index has to move.
    pub fn replace_tour(&self, stations: Vec<Station<C>>, config: TourConfig)
    where
        C: PartialEq,
    {
        {
            let tour = self.tour.borrow();
            if tour.stations == stations && tour.config == config {
                return;
            }
        }
        let total = stations.len();
        let previous_target = self.current_station().map(|station| station.target.clone());
        {
            let mut tour = self.tour.borrow_mut();
            tour.stations = stations;
            tour.config = config;
        }
        let (before, after) = {
            let mut engine = self.engine.borrow_mut();
            let before = engine.current();
            engine.set_total(total);
            (before, engine.current())
        };
        if total == 0 {
            self.deactivate();
        } else if before != after {
            self.start_transition();
        } else if self.current_station().map(|station| station.target.clone())
            != previous_target
        {
            self.retarget();
        }
        self.notify();
    }

    #[must_use]
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.get()
    }

    #[must_use]
    pub fn has_listeners(&self) -> bool {
        self.listeners.borrow().is_some()
    }

    #[must_use]
    pub fn view(&self) -> StepView {
        let engine = self.engine.borrow();
        StepView {
            index: engine.current(),
            total: engine.total(),
            geometry: engine.geometry().copied(),
        }
    }

    #[must_use]
    pub fn current_station(&self) -> Option<Ref<'_, Station<C>>> {
        let index = self.engine.borrow().current();
        Ref::filter_map(self.tour.borrow(), |tour| tour.stations.get(index)).ok()
    }

    #[must_use]
    pub fn state(&self) -> EngineState {
        self.engine.borrow().state(self.active.get())
    }

    fn notify(&self) {
        let notify = self.notify.borrow().clone();
        if let Some(notify) = notify {
            notify();
        }
    }

    /// The tour obtained the run slot.
    pub fn activate(&self) {
        if self.active.get() || self.tour.borrow().is_empty() {
            return;
        }
        log::debug!("tour {} active", self.id);
        self.active.set(true);
        self.start_transition();
    }

    /// The tour lost the run slot or is being torn down.
    pub fn deactivate(&self) {
        self.active.set(false);
        self.inflight.borrow().cancel();
        let listeners = self.listeners.borrow_mut().take();
        drop(listeners);
    }

    /// Pull-style auto-start evaluation for this tour.
    pub fn evaluate_auto_start(&self, state: &CoordinatorState) {
        let auto_start = {
            let tour = self.tour.borrow();
            !tour.is_empty() && tour.config.auto_start
        };
        if state.should_auto_start(&self.id, auto_start) {
            self.control.request_auto_start(&self.id);
        }
    }

    /// Honor an externally controlled running flag.
    pub fn sync_trigger(&self, is_running: bool) {
        let wants_run = {
            let tour = self.tour.borrow();
            !tour.is_empty()
                && tour
                    .config
                    .trigger
                    .as_ref()
                    .is_some_and(|trigger| trigger.running)
        };
        if wants_run && !is_running {
            self.control.start(&self.id);
        }
    }

    pub fn next(&self) {
        if !self.active.get() {
            return;
        }
        let transition = self.engine.borrow_mut().next();
        match transition {
            Transition::Finish => {
                self.control.set_completed(&self.id, true);
                self.close();
            }
            Transition::Moved { .. } => {
                self.start_transition();
                self.notify();
            }
            Transition::Stay => {}
        }
    }

    pub fn prev(&self) {
        if !self.active.get() {
            return;
        }
        let transition = self.engine.borrow_mut().prev();
        if matches!(transition, Transition::Moved { .. }) {
            self.start_transition();
            self.notify();
        }
    }

    /// Close the tour: release the slot and persist completed/viewed.
    pub fn close(&self) {
        if !self.active.get() {
            return;
        }
        let departing = self
            .current_station()
            .and_then(|station| station.after_departure.clone());
        self.host.spawn(
            run_best_effort(departing, "after_departure")
                .map(drop)
                .boxed_local(),
        );

        let at_last = self.engine.borrow_mut().close();

        // Flags land before the slot is released so the stop notification
        // never sees this tour as still eligible for auto-start.
        let id = &self.id;
        if at_last {
            self.control.set_completed(id, true);
        }
        self.control.set_viewed(id, true);
        self.deactivate();
        self.control.stop(id);

        let on_close = self
            .tour
            .borrow()
            .config
            .trigger
            .as_ref()
            .and_then(|trigger| trigger.on_close.clone());
        if let Some(on_close) = on_close {
            on_close.emit();
        }
        self.notify();
    }

    fn remeasure(&self, id: &StationId) {
        if !self.active.get() {
            return;
        }
        let Some(rect) = self.host.locate(id) else {
            return;
        };
        let geometry = StepGeometry::targeted(rect, self.host.viewport());
        self.engine.borrow_mut().apply_geometry(geometry);
        self.notify();
    }

    fn start_transition(&self) {
        if !self.active.get() {
            return;
        }
        let (departing, current) = {
            let mut engine = self.engine.borrow_mut();
            (engine.begin_transition(), engine.current())
        };
        let (departure_hook, arrival_hook, target) = {
            let tour = self.tour.borrow();
            let Some(station) = tour.stations.get(current) else {
                return;
            };
            let departure_hook = departing
                .and_then(|index| tour.stations.get(index))
                .and_then(|station| station.after_departure.clone());
            (
                departure_hook,
                station.before_arrival.clone(),
                station.target.clone(),
            )
        };
        log::debug!("tour {} moving to station {current} ({target:?})", self.id);
        self.follow(target, departure_hook, arrival_hook);
    }

    /// Same station, new target: measure again without replaying hooks.
    fn retarget(&self) {
        if !self.active.get() {
            return;
        }
        let Some(target) = self.current_station().map(|station| station.target.clone()) else {
            return;
        };
        log::debug!("tour {} retargeting to {target:?}", self.id);
        self.follow(target, None, None);
    }

    fn follow(
        &self,
        target: StationTarget,
        departure_hook: Option<Hook>,
        arrival_hook: Option<Hook>,
    ) {
        let cancel = CancelFlag::new();
        self.inflight.replace(cancel.clone()).cancel();
        let previous_listeners = self.listeners.borrow_mut().take();
        drop(previous_listeners);

        if let StationTarget::Targeted(id) = &target {
            let driver = self.this.clone();
            let id = id.clone();
            let subscription = self.host.on_viewport_change(Rc::new(move || {
                if let Some(driver) = driver.upgrade() {
                    driver.remeasure(&id);
                }
            }));
            *self.listeners.borrow_mut() = Some(subscription);
        }

        let host = Rc::clone(&self.host);
        let driver = self.this.clone();
        let settle_ms = self.settings.settle_ms;
        self.host.spawn(
            async move {
                run_best_effort(departure_hook, "after_departure").await;
                run_best_effort(arrival_hook, "before_arrival").await;
                if cancel.is_cancelled() {
                    return;
                }
                let geometry = resolve_geometry(host.as_ref(), &target, settle_ms).await;
                if cancel.is_cancelled() {
                    return;
                }
                if let Some(driver) = driver.upgrade() {
                    driver.engine.borrow_mut().apply_geometry(geometry);
                    driver.notify();
                }
            }
            .boxed_local(),
        );
    }
}

impl<C, H, K> Drop for StepDriver<C, H, K> {
    fn drop(&mut self) {
        self.inflight.get_mut().cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn next_clamps_and_finishes_on_last() {
        let mut engine = StepEngine::new(3);
        assert_eq!(engine.next(), Transition::Moved { from: 0, to: 1 });
        assert_eq!(engine.next(), Transition::Moved { from: 1, to: 2 });
        assert_eq!(engine.next(), Transition::Finish);
        assert_eq!(engine.current(), 2);
    }

    #[test]
    fn prev_is_noop_at_first_station() {
        let mut engine = StepEngine::new(3);
        assert_eq!(engine.prev(), Transition::Stay);
        assert_eq!(engine.current(), 0);
    }

    #[test]
    fn empty_tour_is_idle() {
        let mut engine = StepEngine::new(0);
        assert_eq!(engine.state(true), EngineState::Idle);
        assert_eq!(engine.next(), Transition::Stay);
    }

    #[test]
    fn idle_unless_running() {
        let engine = StepEngine::new(2);
        assert_eq!(engine.state(false), EngineState::Idle);
        assert_eq!(engine.state(true), EngineState::Active(0));
    }

    #[test]
    fn departure_reported_once_per_transition() {
        let mut engine = StepEngine::new(3);
        assert_eq!(engine.begin_transition(), None);
        engine.next();
        assert_eq!(engine.begin_transition(), Some(0));
        assert_eq!(engine.begin_transition(), None);
    }

    #[test]
    fn close_resets_and_reports_last() {
        let mut engine = StepEngine::new(2);
        engine.begin_transition();
        engine.next();
        engine.apply_geometry(StepGeometry::centered(Viewport::new(800.0, 600.0)));
        assert!(engine.close());
        assert_eq!(engine.current(), 0);
        assert_eq!(engine.prev_step(), None);
        assert!(engine.geometry().is_none());
        assert!(!engine.close());
    }

    #[test]
    fn set_total_clamps_index() {
        let mut engine = StepEngine::new(4);
        engine.next();
        engine.next();
        engine.set_total(2);
        assert_eq!(engine.current(), 1);
    }

    #[test]
    fn targeted_geometry_prefers_top_when_visible() {
        let viewport = Viewport::new(800.0, 600.0);
        let visible = StepGeometry::targeted(Rect::new(100.0, 10.0, 50.0, 50.0), viewport);
        assert_eq!(visible.placement, Placement::Top);
        let above = StepGeometry::targeted(Rect::new(-80.0, 10.0, 50.0, 50.0), viewport);
        assert_eq!(above.placement, Placement::Bottom);
        let centered = StepGeometry::centered(viewport);
        assert_eq!(centered.placement, Placement::Auto);
        assert_eq!(centered.anchor, viewport.center_anchor());
    }
}
