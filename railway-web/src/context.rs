//! Session-wide tour coordination shared through a yew context.
//!
//! [`RailwayProvider`] owns a [`CoordinatorState`] behind `use_reducer`; every
//! mutation is one [`Action`], so checks such as "start only if first eligible"
//! are evaluated against the latest state rather than a render-time copy.

use railway_core::{Action, Coordination, CoordinatorState, FlagKind, PersistedFlags, TourId};
use std::rc::Rc;
use yew::prelude::*;

use crate::storage::LocalStorageFlags;

/// Reducer state for the provider.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RailwayState(pub CoordinatorState);

impl Reducible for RailwayState {
    type Action = Action;

    fn reduce(self: Rc<Self>, action: Self::Action) -> Rc<Self> {
        let mut next = self.0.clone();
        if next.apply(action) {
            Rc::new(Self(next))
        } else {
            self
        }
    }
}

/// Write side of the context: dispatches actions and persists flags.
#[derive(Clone)]
pub struct RailwayControl {
    dispatcher: UseReducerDispatcher<RailwayState>,
    flags: PersistedFlags<LocalStorageFlags>,
}

impl PartialEq for RailwayControl {
    fn eq(&self, other: &Self) -> bool {
        self.dispatcher == other.dispatcher
    }
}

impl RailwayControl {
    fn dispatch(&self, action: Action) {
        log::debug!("railway action: {action:?}");
        self.dispatcher.dispatch(action);
    }

    /// Add `id` to the registry; persisted flags are seeded on first sight only.
    pub fn register(&self, id: &TourId) {
        self.dispatch(Action::Register {
            id: id.clone(),
            completed: self.flags.read(id, FlagKind::Completed),
            viewed: self.flags.read(id, FlagKind::Viewed),
        });
    }

    pub fn unregister(&self, id: &TourId) {
        self.dispatch(Action::Unregister(id.clone()));
    }

    pub fn set_order(&self, ids: Vec<TourId>) {
        self.dispatch(Action::SetOrder(ids));
    }
}

impl Coordination for RailwayControl {
    fn start(&self, id: &TourId) {
        log::info!("starting tour {id}");
        self.dispatch(Action::Start(id.clone()));
    }

    fn stop(&self, id: &TourId) {
        self.dispatch(Action::Stop(id.clone()));
    }

    fn request_auto_start(&self, id: &TourId) {
        self.dispatch(Action::StartIfEligible(id.clone()));
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

/// Value returned by [`use_railway`].
#[derive(Clone, PartialEq)]
pub struct RailwayContext {
    state: UseReducerHandle<RailwayState>,
    control: RailwayControl,
}

impl RailwayContext {
    fn new(state: UseReducerHandle<RailwayState>) -> Self {
        let control = RailwayControl {
            dispatcher: state.dispatcher(),
            flags: PersistedFlags::new(LocalStorageFlags),
        };
        Self { state, control }
    }

    #[must_use]
    pub fn state(&self) -> &CoordinatorState {
        &self.state.0
    }

    #[must_use]
    pub fn control(&self) -> RailwayControl {
        self.control.clone()
    }

    #[must_use]
    pub fn running_id(&self) -> Option<TourId> {
        self.state().running_id().cloned()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state().is_running()
    }

    #[must_use]
    pub fn completed(&self) -> Vec<TourId> {
        self.state().completed()
    }

    #[must_use]
    pub fn viewed(&self) -> Vec<TourId> {
        self.state().viewed()
    }

    #[must_use]
    pub fn order(&self) -> Vec<TourId> {
        self.state().order().to_vec()
    }

    pub fn register(&self, id: &TourId) {
        self.control.register(id);
    }

    pub fn unregister(&self, id: &TourId) {
        self.control.unregister(id);
    }

    pub fn start(&self, id: &TourId) {
        self.control.start(id);
    }

    pub fn stop(&self, id: &TourId) {
        self.control.stop(id);
    }

    pub fn set_completed(&self, id: &TourId, value: bool) {
        self.control.set_completed(id, value);
    }

    pub fn set_viewed(&self, id: &TourId, value: bool) {
        self.control.set_viewed(id, value);
    }

    pub fn mark_completed(&self, id: &TourId) {
        self.set_completed(id, true);
    }

    pub fn mark_viewed(&self, id: &TourId) {
        self.set_viewed(id, true);
    }

    pub fn set_order(&self, ids: Vec<TourId>) {
        self.control.set_order(ids);
    }
}

#[derive(Properties, PartialEq)]
pub struct RailwayProviderProps {
    /// Auto-start priority. Replaces the registration order when set.
    #[prop_or_default]
    pub order: Option<Vec<TourId>>,
    #[prop_or_default]
    pub children: Children,
}

#[function_component(RailwayProvider)]
pub fn railway_provider(props: &RailwayProviderProps) -> Html {
    let state = use_reducer(RailwayState::default);
    let context = RailwayContext::new(state);

    {
        let control = context.control();
        use_effect_with(props.order.clone(), move |order| {
            if let Some(order) = order {
                control.set_order(order.clone());
            }
        });
    }

    html! {
        <ContextProvider<RailwayContext> context={context}>
            { for props.children.iter() }
        </ContextProvider<RailwayContext>>
    }
}

/// Access the surrounding [`RailwayProvider`].
///
/// # Panics
/// Panics when called outside a `<RailwayProvider>`.
#[hook]
pub fn use_railway() -> RailwayContext {
    use_context::<RailwayContext>()
        .expect("use_railway() must be used within a <RailwayProvider>")
}

/// Like [`use_railway`] but returns `None` outside a provider.
#[hook]
pub fn try_use_railway() -> Option<RailwayContext> {
    use_context::<RailwayContext>()
}

/// Register `id` for the lifetime of the calling component.
#[hook]
pub fn use_register_railway(id: &TourId) {
    let context = use_railway();
    use_effect_with(id.clone(), move |id| {
        context.register(id);
        let id = id.clone();
        move || context.unregister(&id)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reduce(state: Rc<RailwayState>, action: Action) -> Rc<RailwayState> {
        state.reduce(action)
    }

    #[test]
    fn unchanged_state_keeps_the_same_allocation() {
        let state = Rc::new(RailwayState::default());
        let stopped = reduce(Rc::clone(&state), Action::Stop(TourId::from("idle")));
        assert!(Rc::ptr_eq(&state, &stopped));

        let started = reduce(stopped, Action::Start(TourId::from("intro")));
        assert_eq!(started.0.running_id(), Some(&TourId::from("intro")));
    }

    #[test]
    fn register_seeds_flags_once() {
        let id = TourId::from("intro");
        let state = reduce(
            Rc::new(RailwayState::default()),
            Action::Register {
                id: id.clone(),
                completed: true,
                viewed: false,
            },
        );
        let again = reduce(
            Rc::clone(&state),
            Action::Register {
                id: id.clone(),
                completed: false,
                viewed: true,
            },
        );
        assert!(Rc::ptr_eq(&state, &again));
        assert_eq!(again.0.completed(), vec![id]);
        assert!(again.0.viewed().is_empty());
    }

    #[test]
    fn stale_stop_leaves_the_new_runner() {
        let state = [
            Action::Start(TourId::from("a")),
            Action::Start(TourId::from("b")),
            Action::Stop(TourId::from("a")),
        ]
        .into_iter()
        .fold(Rc::new(RailwayState::default()), reduce);
        assert_eq!(state.0.running_id(), Some(&TourId::from("b")));
    }
}
