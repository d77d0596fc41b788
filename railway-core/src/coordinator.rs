//! Cross-tour coordination: registry, the single run slot, ordering and flags.
//!
//! All mutation goes through [`Action`] so that each logical change is applied
//! in one step. [`CoordinatorState`] is the pure reducer state (shared with the
//! yew provider); [`Coordinator`] is the session object that also writes the
//! flags through to a [`FlagStore`].
use serde::Serialize;
use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::rc::{Rc, Weak};

use crate::host::Subscription;
use crate::store::{FlagKind, FlagStore, PersistedFlags};
use crate::tour::TourId;

/// A single, unsplittable coordinator update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// First sighting of a tour. Carries the persisted flags read by the caller.
    Register {
        id: TourId,
        completed: bool,
        viewed: bool,
    },
    Unregister(TourId),
    /// Take the run slot unconditionally; last caller wins.
    Start(TourId),
    /// Release the run slot only if `id` holds it.
    Stop(TourId),
    /// Take the run slot only when it is free and `id` is first eligible in order.
    StartIfEligible(TourId),
    SetCompleted {
        id: TourId,
        value: bool,
    },
    SetViewed {
        id: TourId,
        value: bool,
    },
    SetOrder(Vec<TourId>),
}

/// Session-wide tour bookkeeping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoordinatorState {
    registered: BTreeSet<TourId>,
    running: Option<TourId>,
    completed: BTreeSet<TourId>,
    viewed: BTreeSet<TourId>,
    order: Vec<TourId>,
}

fn dedup_first_seen(ids: Vec<TourId>) -> Vec<TourId> {
    let mut seen = BTreeSet::new();
    ids.into_iter()
        .filter(|id| seen.insert(id.clone()))
        .collect()
}

fn toggle(set: &mut BTreeSet<TourId>, id: TourId, value: bool) -> bool {
    if value {
        set.insert(id)
    } else {
        set.remove(&id)
    }
}

impl CoordinatorState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply `action` in place. Returns whether anything changed.
    pub fn apply(&mut self, action: Action) -> bool {
        match action {
            Action::Register {
                id,
                completed,
                viewed,
            } => {
                if self.registered.contains(&id) {
                    return false;
                }
                if completed {
                    self.completed.insert(id.clone());
                }
                if viewed {
                    self.viewed.insert(id.clone());
                }
                if !self.order.contains(&id) {
                    self.order.push(id.clone());
                }
                self.registered.insert(id);
                true
            }
            Action::Unregister(id) => {
                let was_registered = self.registered.remove(&id);
                let before = self.order.len();
                self.order.retain(|x| x != &id);
                let released = self.running.as_ref() == Some(&id);
                if released {
                    self.running = None;
                }
                was_registered || released || before != self.order.len()
            }
            Action::Start(id) => {
                let changed = self.running.as_ref() != Some(&id);
                self.running = Some(id);
                changed
            }
            Action::Stop(id) => {
                if self.running.as_ref() == Some(&id) {
                    self.running = None;
                    true
                } else {
                    false
                }
            }
            Action::StartIfEligible(id) => {
                if self.running.is_none() && self.first_eligible() == Some(&id) {
                    self.running = Some(id);
                    true
                } else {
                    false
                }
            }
            Action::SetCompleted { id, value } => toggle(&mut self.completed, id, value),
            Action::SetViewed { id, value } => toggle(&mut self.viewed, id, value),
            Action::SetOrder(ids) => {
                let next = dedup_first_seen(ids);
                let changed = next != self.order;
                self.order = next;
                changed
            }
        }
    }

    /// Immutable variant of [`apply`](Self::apply).
    #[must_use]
    pub fn reduce(&self, action: Action) -> Self {
        let mut next = self.clone();
        next.apply(action);
        next
    }

    #[must_use]
    pub const fn running_id(&self) -> Option<&TourId> {
        self.running.as_ref()
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Whether `id` currently owns the run slot.
    #[must_use]
    pub fn is_running_tour(&self, id: &TourId) -> bool {
        self.running.as_ref() == Some(id)
    }

    #[must_use]
    pub fn completed(&self) -> Vec<TourId> {
        self.completed.iter().cloned().collect()
    }

    #[must_use]
    pub fn viewed(&self) -> Vec<TourId> {
        self.viewed.iter().cloned().collect()
    }

    #[must_use]
    pub fn order(&self) -> &[TourId] {
        &self.order
    }

    #[must_use]
    pub fn registered(&self) -> Vec<TourId> {
        self.registered.iter().cloned().collect()
    }

    #[must_use]
    pub fn is_registered(&self, id: &TourId) -> bool {
        self.registered.contains(id)
    }

    #[must_use]
    pub fn is_completed(&self, id: &TourId) -> bool {
        self.completed.contains(id)
    }

    #[must_use]
    pub fn is_viewed(&self, id: &TourId) -> bool {
        self.viewed.contains(id)
    }

    /// Completed or viewed tours never auto-start.
    #[must_use]
    pub fn is_blocked(&self, id: &TourId) -> bool {
        self.is_completed(id) || self.is_viewed(id)
    }

    /// First id in order that is neither completed nor viewed.
    #[must_use]
    pub fn first_eligible(&self) -> Option<&TourId> {
        self.order.iter().find(|id| !self.is_blocked(id))
    }

    /// Pull-style auto-start check evaluated by each autostart tour.
    #[must_use]
    pub fn should_auto_start(&self, id: &TourId, auto_start: bool) -> bool {
        auto_start
            && !self.is_running()
            && !self.is_blocked(id)
            && self.first_eligible() == Some(id)
    }
}

/// Write-side capabilities a running tour needs from its coordinator.
pub trait Coordination {
    fn start(&self, id: &TourId);
    fn stop(&self, id: &TourId);
    /// Take the slot only if it is free and `id` is first eligible.
    fn request_auto_start(&self, id: &TourId);
    fn set_completed(&self, id: &TourId, value: bool);
    fn set_viewed(&self, id: &TourId, value: bool);
}

impl<T: Coordination + ?Sized> Coordination for Rc<T> {
    fn start(&self, id: &TourId) {
        (**self).start(id);
    }

    fn stop(&self, id: &TourId) {
        (**self).stop(id);
    }

    fn request_auto_start(&self, id: &TourId) {
        (**self).request_auto_start(id);
    }

    fn set_completed(&self, id: &TourId, value: bool) {
        (**self).set_completed(id, value);
    }

    fn set_viewed(&self, id: &TourId, value: bool) {
        (**self).set_viewed(id, value);
    }
}

type Observer = Rc<dyn Fn(&CoordinatorState)>;
type ObserverList = RefCell<Vec<(u64, Observer)>>;

/// Session-scoped coordinator with write-through flag persistence.
pub struct Coordinator<S> {
    state: RefCell<CoordinatorState>,
    flags: PersistedFlags<S>,
    observers: Rc<ObserverList>,
    next_observer: Cell<u64>,
}

impl<S: FlagStore> Coordinator<S> {
    pub fn new(store: S) -> Self {
        Self {
            state: RefCell::new(CoordinatorState::new()),
            flags: PersistedFlags::new(store),
            observers: Rc::new(RefCell::new(Vec::new())),
            next_observer: Cell::new(0),
        }
    }

    #[must_use]
    pub const fn flags(&self) -> &PersistedFlags<S> {
        &self.flags
    }

    /// Apply an action and notify observers if the state changed.
    pub fn dispatch(&self, action: Action) -> bool {
        log::debug!("coordinator action: {action:?}");
        let changed = self.state.borrow_mut().apply(action);
        if changed {
            let snapshot = self.snapshot();
            let observers: Vec<Observer> = self
                .observers
                .borrow()
                .iter()
                .map(|(_, observer)| Rc::clone(observer))
                .collect();
            for observer in observers {
                observer(&snapshot);
            }
        }
        changed
    }

    /// Observe every state change until the subscription is dropped.
    pub fn subscribe(&self, observer: impl Fn(&CoordinatorState) + 'static) -> Subscription {
        let key = self.next_observer.get();
        self.next_observer.set(key + 1);
        self.observers.borrow_mut().push((key, Rc::new(observer)));
        let observers: Weak<ObserverList> = Rc::downgrade(&self.observers);
        Subscription::new(move || {
            if let Some(observers) = observers.upgrade() {
                observers.borrow_mut().retain(|(k, _)| *k != key);
            }
        })
    }

    #[must_use]
    pub fn snapshot(&self) -> CoordinatorState {
        self.state.borrow().clone()
    }

    /// Register a tour, seeding its flags from storage the first time only.
    pub fn register(&self, id: &TourId) {
        if self.state.borrow().is_registered(id) {
            return;
        }
        let completed = self.flags.read(id, FlagKind::Completed);
        let viewed = self.flags.read(id, FlagKind::Viewed);
        self.dispatch(Action::Register {
            id: id.clone(),
            completed,
            viewed,
        });
    }

    pub fn unregister(&self, id: &TourId) {
        self.dispatch(Action::Unregister(id.clone()));
    }

    pub fn mark_completed(&self, id: &TourId) {
        Coordination::set_completed(self, id, true);
    }

    pub fn mark_viewed(&self, id: &TourId) {
        Coordination::set_viewed(self, id, true);
    }

    pub fn set_order<I, T>(&self, ids: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<TourId>,
    {
        self.dispatch(Action::SetOrder(ids.into_iter().map(Into::into).collect()));
    }

    /// Start `id` if it is the first eligible autostart tour and the slot is free.
    pub fn try_auto_start(&self, id: &TourId, auto_start: bool) -> bool {
        if !self.state.borrow().should_auto_start(id, auto_start) {
            return false;
        }
        Coordination::request_auto_start(self, id);
        self.state.borrow().is_running_tour(id)
    }

    /// Let every autostart candidate evaluate itself; returns the tour that won.
    pub fn auto_start_pass<'a>(
        &self,
        candidates: impl IntoIterator<Item = &'a TourId>,
    ) -> Option<TourId> {
        for id in candidates {
            if self.try_auto_start(id, true) {
                return Some(id.clone());
            }
        }
        None
    }

    #[must_use]
    pub fn running_id(&self) -> Option<TourId> {
        self.state.borrow().running_id().cloned()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state.borrow().is_running()
    }

    #[must_use]
    pub fn completed(&self) -> Vec<TourId> {
        self.state.borrow().completed()
    }

    #[must_use]
    pub fn viewed(&self) -> Vec<TourId> {
        self.state.borrow().viewed()
    }

    #[must_use]
    pub fn order(&self) -> Vec<TourId> {
        self.state.borrow().order().to_vec()
    }

    #[must_use]
    pub fn is_registered(&self, id: &TourId) -> bool {
        self.state.borrow().is_registered(id)
    }

    #[must_use]
    pub fn is_blocked(&self, id: &TourId) -> bool {
        self.state.borrow().is_blocked(id)
    }

    #[must_use]
    pub fn first_eligible(&self) -> Option<TourId> {
        self.state.borrow().first_eligible().cloned()
    }
}

impl<S: FlagStore> Coordination for Coordinator<S> {
    fn start(&self, id: &TourId) {
        log::info!("starting tour {id}");
        self.dispatch(Action::Start(id.clone()));
    }

    fn stop(&self, id: &TourId) {
        if self.dispatch(Action::Stop(id.clone())) {
            log::info!("stopped tour {id}");
        }
    }

    fn request_auto_start(&self, id: &TourId) {
        if self.dispatch(Action::StartIfEligible(id.clone())) {
            log::info!("auto-started tour {id}");
        }
    }

    fn set_completed(&self, id: &TourId, value: bool) {
        self.flags.write(id, FlagKind::Completed, value);
        self.dispatch(Action::SetCompleted {
            id: id.clone(),
            value,
        });
    }

    fn set_viewed(&self, id: &TourId, value: bool) {
        self.flags.write(id, FlagKind::Viewed, value);
        self.dispatch(Action::SetViewed {
            id: id.clone(),
            value,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryFlagStore;

    fn ids(raw: &[&str]) -> Vec<TourId> {
        raw.iter().copied().map(TourId::from).collect()
    }

    #[test]
    fn last_start_wins_and_stale_stop_is_ignored() {
        let coordinator = Coordinator::new(MemoryFlagStore::new());
        let (a, b) = (TourId::from("a"), TourId::from("b"));
        coordinator.start(&a);
        coordinator.start(&b);
        assert_eq!(coordinator.running_id(), Some(b.clone()));
        coordinator.stop(&a);
        assert_eq!(coordinator.running_id(), Some(b.clone()));
        coordinator.stop(&b);
        assert_eq!(coordinator.running_id(), None);
    }

    #[test]
    fn register_is_idempotent() {
        let store = Rc::new(MemoryFlagStore::new());
        let coordinator = Coordinator::new(Rc::clone(&store));
        let id = TourId::from("intro");
        coordinator.register(&id);
        store
            .write("railway:intro:completed", "true")
            .expect("memory store accepts writes");
        coordinator.register(&id);
        assert!(coordinator.completed().is_empty());
        assert_eq!(coordinator.order(), ids(&["intro"]));
    }

    #[test]
    fn unregister_releases_run_slot() {
        let coordinator = Coordinator::new(MemoryFlagStore::new());
        let id = TourId::from("intro");
        coordinator.register(&id);
        coordinator.start(&id);
        coordinator.unregister(&id);
        assert!(!coordinator.is_running());
        assert!(!coordinator.is_registered(&id));
        assert!(coordinator.order().is_empty());
    }

    #[test]
    fn set_order_dedups_keeping_first_occurrence() {
        let mut state = CoordinatorState::new();
        state.apply(Action::SetOrder(ids(&["a", "b", "a", "c"])));
        assert_eq!(state.order(), ids(&["a", "b", "c"]).as_slice());
    }

    #[test]
    fn flags_write_through_and_can_be_reset() {
        let store = Rc::new(MemoryFlagStore::new());
        let coordinator = Coordinator::new(Rc::clone(&store));
        let id = TourId::from("intro");
        coordinator.mark_completed(&id);
        assert_eq!(store.get("railway:intro:completed").as_deref(), Some("true"));
        coordinator.set_completed(&id, false);
        assert_eq!(store.get("railway:intro:completed").as_deref(), Some("false"));
        assert!(coordinator.completed().is_empty());
    }

    #[test]
    fn start_if_eligible_arbitrates_same_tick_autostarts() {
        let mut state = CoordinatorState::new();
        for id in ["first", "second"] {
            state.apply(Action::Register {
                id: TourId::from(id),
                completed: false,
                viewed: false,
            });
        }
        assert!(!state.apply(Action::StartIfEligible(TourId::from("second"))));
        assert!(state.apply(Action::StartIfEligible(TourId::from("first"))));
        assert!(!state.apply(Action::StartIfEligible(TourId::from("first"))));
        assert_eq!(state.running_id(), Some(&TourId::from("first")));
    }

    #[test]
    fn auto_start_skips_blocked_tours() {
        let coordinator = Coordinator::new(MemoryFlagStore::new());
        let tours = ids(&["welcome", "billing"]);
        for id in &tours {
            coordinator.register(id);
        }
        coordinator.mark_viewed(&tours[0]);
        assert_eq!(coordinator.first_eligible(), Some(tours[1].clone()));
        assert_eq!(coordinator.auto_start_pass(&tours), Some(tours[1].clone()));
        assert_eq!(coordinator.running_id(), Some(tours[1].clone()));
    }

    #[test]
    fn observers_see_changes_until_dropped() {
        let coordinator = Coordinator::new(MemoryFlagStore::new());
        let seen = Rc::new(Cell::new(0));
        let counter = Rc::clone(&seen);
        let sub = coordinator.subscribe(move |_| counter.set(counter.get() + 1));
        coordinator.start(&TourId::from("a"));
        coordinator.start(&TourId::from("a"));
        assert_eq!(seen.get(), 1);
        drop(sub);
        coordinator.stop(&TourId::from("a"));
        assert_eq!(seen.get(), 1);
    }
}
