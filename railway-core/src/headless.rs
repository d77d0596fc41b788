//! Headless host: an in-memory page model and a virtual-time scheduler.
//!
//! Lets the engine run outside a browser (integration tests, the scenario
//! runner). The page scrolls like a document: scrolling shifts every element
//! and fires the viewport listeners.
use futures::executor::{LocalPool, LocalSpawner};
use futures::future::LocalBoxFuture;
use futures::task::LocalSpawnExt;
use futures::FutureExt;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::geometry::{Rect, Viewport};
use crate::host::{Scheduler, Subscription, ViewportEvents};
use crate::locator::ElementLocator;
use crate::station::StationId;

type Listener = Rc<dyn Fn()>;
type ListenerList = RefCell<Vec<(u64, Listener)>>;

/// In-memory page with tagged elements.
#[derive(Default)]
pub struct SimulatedPage {
    viewport: Cell<Viewport>,
    elements: RefCell<Vec<(StationId, Rect)>>,
    scroll_requests: RefCell<Vec<StationId>>,
    scroll_blocked: Cell<bool>,
    listeners: Rc<ListenerList>,
    next_listener: Cell<u64>,
}

impl SimulatedPage {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport: Cell::new(viewport),
            ..Self::default()
        }
    }

    /// Tag an element. Duplicates are kept; lookups return the first match.
    pub fn place(&self, id: impl Into<StationId>, rect: Rect) {
        self.elements.borrow_mut().push((id.into(), rect));
    }

    /// Move an existing element (first match).
    pub fn relocate(&self, id: &StationId, rect: Rect) {
        if let Some(entry) = self
            .elements
            .borrow_mut()
            .iter_mut()
            .find(|(candidate, _)| candidate == id)
        {
            entry.1 = rect;
        }
    }

    pub fn remove(&self, id: &StationId) {
        self.elements
            .borrow_mut()
            .retain(|(candidate, _)| candidate != id);
    }

    /// Resize the window and fire listeners.
    pub fn resize(&self, viewport: Viewport) {
        self.viewport.set(viewport);
        self.fire();
    }

    /// Scroll the document by `dy` pixels and fire listeners.
    pub fn scroll_by(&self, dy: f64) {
        for (_, rect) in self.elements.borrow_mut().iter_mut() {
            *rect = rect.translate(0.0, -dy);
        }
        self.fire();
    }

    /// Make `scroll_into_view` a no-op that still reports success
    /// (e.g. the element lives in a non-scrollable container).
    pub fn block_scrolling(&self, blocked: bool) {
        self.scroll_blocked.set(blocked);
    }

    #[must_use]
    pub fn scroll_requests(&self) -> Vec<StationId> {
        self.scroll_requests.borrow().clone()
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn fire(&self) {
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();
        for listener in listeners {
            listener();
        }
    }

    fn nearest_scroll_delta(&self, rect: &Rect) -> f64 {
        let height = self.viewport.get().height;
        if rect.top < 0.0 || rect.height > height {
            rect.top
        } else if rect.bottom() > height {
            rect.bottom() - height
        } else {
            0.0
        }
    }
}

impl ElementLocator for SimulatedPage {
    fn locate(&self, id: &StationId) -> Option<Rect> {
        self.elements
            .borrow()
            .iter()
            .find(|(candidate, _)| candidate == id)
            .map(|(_, rect)| *rect)
    }

    fn scroll_into_view(&self, id: &StationId) -> bool {
        let Some(rect) = self.locate(id) else {
            return false;
        };
        self.scroll_requests.borrow_mut().push(id.clone());
        if !self.scroll_blocked.get() {
            let dy = self.nearest_scroll_delta(&rect);
            if dy != 0.0 {
                self.scroll_by(dy);
            }
        }
        true
    }

    fn viewport(&self) -> Viewport {
        self.viewport.get()
    }
}

impl ViewportEvents for SimulatedPage {
    fn on_viewport_change(&self, listener: Rc<dyn Fn()>) -> Subscription {
        let key = self.next_listener.get();
        self.next_listener.set(key + 1);
        self.listeners.borrow_mut().push((key, listener));
        let listeners: Weak<ListenerList> = Rc::downgrade(&self.listeners);
        Subscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.borrow_mut().retain(|(k, _)| *k != key);
            }
        })
    }
}

/// Deterministic scheduler: frames and sleeps complete immediately but are
/// recorded, spawned tasks run when the pool is driven.
pub struct VirtualScheduler {
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
    frames: Cell<u32>,
    sleeps: RefCell<Vec<u32>>,
}

impl Default for VirtualScheduler {
    fn default() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            pool: RefCell::new(pool),
            spawner,
            frames: Cell::new(0),
            sleeps: RefCell::new(Vec::new()),
        }
    }
}

impl VirtualScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run every spawned task until none can make progress.
    pub fn run_until_stalled(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }

    #[must_use]
    pub fn frames(&self) -> u32 {
        self.frames.get()
    }

    #[must_use]
    pub fn sleeps(&self) -> Vec<u32> {
        self.sleeps.borrow().clone()
    }
}

impl Scheduler for VirtualScheduler {
    fn next_frame(&self) -> LocalBoxFuture<'static, ()> {
        self.frames.set(self.frames.get() + 1);
        futures::future::ready(()).boxed_local()
    }

    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        self.sleeps.borrow_mut().push(ms);
        futures::future::ready(()).boxed_local()
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        if let Err(err) = self.spawner.spawn_local(task) {
            log::warn!("dropping task, pool is gone: {err}");
        }
    }
}

/// A page paired with a scheduler.
pub struct SimHost<S = VirtualScheduler> {
    pub page: SimulatedPage,
    pub scheduler: S,
}

impl SimHost<VirtualScheduler> {
    #[must_use]
    pub fn new(viewport: Viewport) -> Self {
        Self::with_scheduler(viewport, VirtualScheduler::new())
    }

    pub fn run_until_stalled(&self) {
        self.scheduler.run_until_stalled();
    }
}

impl<S> SimHost<S> {
    pub fn with_scheduler(viewport: Viewport, scheduler: S) -> Self {
        Self {
            page: SimulatedPage::new(viewport),
            scheduler,
        }
    }
}

impl<S> ElementLocator for SimHost<S> {
    fn locate(&self, id: &StationId) -> Option<Rect> {
        self.page.locate(id)
    }

    fn scroll_into_view(&self, id: &StationId) -> bool {
        self.page.scroll_into_view(id)
    }

    fn viewport(&self) -> Viewport {
        self.page.viewport()
    }
}

impl<S> ViewportEvents for SimHost<S> {
    fn on_viewport_change(&self, listener: Rc<dyn Fn()>) -> Subscription {
        self.page.on_viewport_change(listener)
    }
}

impl<S: Scheduler> Scheduler for SimHost<S> {
    fn next_frame(&self) -> LocalBoxFuture<'static, ()> {
        self.scheduler.next_frame()
    }

    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        self.scheduler.sleep(ms)
    }

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        self.scheduler.spawn(task);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scroll_into_view_brings_element_to_nearest_edge() {
        let page = SimulatedPage::new(Viewport::new(800.0, 600.0));
        page.place("footer", Rect::new(900.0, 0.0, 800.0, 100.0));
        assert!(page.scroll_into_view(&StationId::from("footer")));
        let rect = page.locate(&StationId::from("footer")).unwrap();
        assert!((rect.bottom() - 600.0).abs() < f64::EPSILON);

        page.place("header", Rect::new(-300.0, 0.0, 800.0, 50.0));
        page.scroll_into_view(&StationId::from("header"));
        let rect = page.locate(&StationId::from("header")).unwrap();
        assert!(rect.top.abs() < f64::EPSILON);
    }

    #[test]
    fn missing_element_cannot_scroll() {
        let page = SimulatedPage::new(Viewport::new(800.0, 600.0));
        assert!(!page.scroll_into_view(&StationId::from("ghost")));
        assert!(page.scroll_requests().is_empty());
    }

    #[test]
    fn listeners_detach_when_subscription_drops() {
        let page = SimulatedPage::new(Viewport::new(800.0, 600.0));
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let sub = page.on_viewport_change(Rc::new(move || counter.set(counter.get() + 1)));
        page.resize(Viewport::new(1024.0, 768.0));
        drop(sub);
        page.scroll_by(10.0);
        assert_eq!(hits.get(), 1);
        assert_eq!(page.listener_count(), 0);
    }

    #[test]
    fn virtual_scheduler_records_waits() {
        let scheduler = VirtualScheduler::new();
        let done = Rc::new(Cell::new(false));
        let flag = Rc::clone(&done);
        let frame = scheduler.next_frame();
        let sleep = scheduler.sleep(350);
        scheduler.spawn(
            async move {
                frame.await;
                sleep.await;
                flag.set(true);
            }
            .boxed_local(),
        );
        assert!(!done.get());
        scheduler.run_until_stalled();
        assert!(done.get());
        assert_eq!(scheduler.frames(), 1);
        assert_eq!(scheduler.sleeps(), vec![350]);
    }
}
