//! Event-loop capabilities the engine borrows from its host.
use futures::future::LocalBoxFuture;
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

/// Timers and task spawning on the single UI thread.
pub trait Scheduler {
    /// Resolve on the next paint frame.
    fn next_frame(&self) -> LocalBoxFuture<'static, ()>;

    /// Resolve after `ms` milliseconds.
    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()>;

    /// Run a future to completion in the background.
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);
}

/// Viewport resize/scroll notifications.
pub trait ViewportEvents {
    /// Call `listener` on every resize or (capturing) scroll until the returned
    /// subscription is dropped.
    fn on_viewport_change(&self, listener: Rc<dyn Fn()>) -> Subscription;
}

/// Disposal handle: dropping it detaches whatever it guards.
#[must_use = "dropping a subscription detaches it immediately"]
pub struct Subscription {
    dispose: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(dispose: impl FnOnce() + 'static) -> Self {
        Self {
            dispose: Some(Box::new(dispose)),
        }
    }

    /// Subscription with nothing to release.
    pub fn noop() -> Self {
        Self { dispose: None }
    }

    /// Dispose now instead of on drop.
    pub fn cancel(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.dispose.is_some())
            .finish()
    }
}

/// Advisory cancellation shared between a transition and its owner.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Rc<Cell<bool>>);

impl CancelFlag {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_disposes_once_on_drop() {
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let sub = Subscription::new(move || counter.set(counter.get() + 1));
        drop(sub);
        assert_eq!(hits.get(), 1);

        let counter = Rc::clone(&hits);
        Subscription::new(move || counter.set(counter.get() + 1)).cancel();
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn cancel_flag_is_shared_between_clones() {
        let flag = CancelFlag::new();
        let seen_by_task = flag.clone();
        assert!(!seen_by_task.is_cancelled());
        flag.cancel();
        assert!(seen_by_task.is_cancelled());
    }
}
