//! Mounting tours against a shared coordinator without a UI framework.
use std::rc::Rc;

use crate::coordinator::Coordinator;
use crate::engine::{StationHost, StepDriver};
use crate::host::Subscription;
use crate::store::FlagStore;
use crate::tour::{EngineSettings, Tour, TourId};

/// Driver type produced by [`Session::mount`].
pub type SessionDriver<C, S, H> = StepDriver<C, H, Rc<Coordinator<S>>>;

/// One coordinator plus the host every mounted tour renders into.
pub struct Session<S, H> {
    coordinator: Rc<Coordinator<S>>,
    host: Rc<H>,
    settings: EngineSettings,
}

impl<S, H> Session<S, H>
where
    S: FlagStore + 'static,
    H: StationHost + 'static,
{
    pub fn new(store: S, host: Rc<H>, settings: EngineSettings) -> Self {
        Self {
            coordinator: Rc::new(Coordinator::new(store)),
            host,
            settings,
        }
    }

    #[must_use]
    pub const fn coordinator(&self) -> &Rc<Coordinator<S>> {
        &self.coordinator
    }

    #[must_use]
    pub const fn host(&self) -> &Rc<H> {
        &self.host
    }

    #[must_use]
    pub const fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Register `tour` and keep its driver in step with the run slot until
    /// the returned handle is dropped.
    pub fn mount<C: 'static>(&self, tour: Tour<C>) -> MountedTour<C, S, H> {
        let id = tour.id.clone();
        self.coordinator.register(&id);
        let driver = StepDriver::new(
            tour,
            Rc::clone(&self.host),
            Rc::clone(&self.coordinator),
            self.settings,
        );

        let weak_driver = Rc::downgrade(&driver);
        let weak_coordinator = Rc::downgrade(&self.coordinator);
        let observer = self.coordinator.subscribe(move |_| {
            // Nested dispatches may have moved on since this snapshot was taken.
            let (Some(driver), Some(coordinator)) =
                (weak_driver.upgrade(), weak_coordinator.upgrade())
            else {
                return;
            };
            sync_driver(&driver, &coordinator);
        });

        let is_running = self.coordinator.snapshot().is_running_tour(&id);
        driver.sync_trigger(is_running);
        sync_driver(&driver, &self.coordinator);

        MountedTour {
            id,
            driver,
            coordinator: Rc::clone(&self.coordinator),
            _observer: observer,
        }
    }
}

fn sync_driver<C, S, H>(driver: &SessionDriver<C, S, H>, coordinator: &Coordinator<S>)
where
    C: 'static,
    S: FlagStore + 'static,
    H: StationHost + 'static,
{
    let state = coordinator.snapshot();
    if state.is_running_tour(driver.id()) {
        driver.activate();
    } else {
        driver.deactivate();
        driver.evaluate_auto_start(&state);
    }
}

/// A tour taking part in a [`Session`]. Dropping it unmounts the tour.
pub struct MountedTour<C, S, H>
where
    C: 'static,
    S: FlagStore + 'static,
    H: StationHost + 'static,
{
    id: TourId,
    driver: Rc<SessionDriver<C, S, H>>,
    coordinator: Rc<Coordinator<S>>,
    _observer: Subscription,
}

impl<C, S, H> MountedTour<C, S, H>
where
    C: 'static,
    S: FlagStore + 'static,
    H: StationHost + 'static,
{
    #[must_use]
    pub const fn id(&self) -> &TourId {
        &self.id
    }

    #[must_use]
    pub const fn driver(&self) -> &Rc<SessionDriver<C, S, H>> {
        &self.driver
    }
}

impl<C, S, H> Drop for MountedTour<C, S, H>
where
    C: 'static,
    S: FlagStore + 'static,
    H: StationHost + 'static,
{
    fn drop(&mut self) {
        self.driver.deactivate();
        self.coordinator.unregister(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coordinator::Coordination;
    use crate::engine::EngineState;
    use crate::geometry::Viewport;
    use crate::headless::SimHost;
    use crate::station::Station;
    use crate::store::MemoryFlagStore;
    use crate::tour::TourConfig;

    fn tour(id: &str, auto_start: bool) -> Tour {
        Tour::new(id, vec![Station::centered("hello".to_string())]).with_config(TourConfig {
            auto_start,
            ..TourConfig::default()
        })
    }

    #[test]
    fn mounting_an_autostart_tour_takes_the_slot() {
        let host = Rc::new(SimHost::new(Viewport::new(800.0, 600.0)));
        let session = Session::new(MemoryFlagStore::new(), host, EngineSettings::default());
        let mounted = session.mount(tour("welcome", true));
        assert_eq!(mounted.driver().state(), EngineState::Active(0));
        assert!(session.coordinator().is_running());
    }

    #[test]
    fn starting_another_tour_deactivates_the_first() {
        let host = Rc::new(SimHost::new(Viewport::new(800.0, 600.0)));
        let session = Session::new(MemoryFlagStore::new(), host, EngineSettings::default());
        let first = session.mount(tour("first", false));
        let second = session.mount(tour("second", false));
        session.coordinator().start(first.id());
        session.coordinator().start(second.id());
        assert_eq!(first.driver().state(), EngineState::Idle);
        assert_eq!(second.driver().state(), EngineState::Active(0));
    }

    #[test]
    fn dropping_the_handle_unregisters() {
        let host = Rc::new(SimHost::new(Viewport::new(800.0, 600.0)));
        let session = Session::new(MemoryFlagStore::new(), host, EngineSettings::default());
        let mounted = session.mount(tour("welcome", true));
        drop(mounted);
        let coordinator = session.coordinator();
        assert!(!coordinator.is_running());
        assert!(!coordinator.is_registered(&TourId::from("welcome")));
    }
}
