//! Tokio-backed host so scenarios run against real timers.
use futures::FutureExt;
use futures::future::LocalBoxFuture;
use railway_core::{Scheduler, SimHost, Viewport};
use std::time::Duration;

/// Nominal paint interval used for `next_frame`.
pub const FRAME_MS: u64 = 16;

/// Frames map to a fixed sleep, tasks go to the current `LocalSet`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokioScheduler;

impl Scheduler for TokioScheduler {
    fn next_frame(&self) -> LocalBoxFuture<'static, ()> {
        tokio::time::sleep(Duration::from_millis(FRAME_MS)).boxed_local()
    }

    fn sleep(&self, ms: u32) -> LocalBoxFuture<'static, ()> {
        tokio::time::sleep(Duration::from_millis(u64::from(ms))).boxed_local()
    }

    /// # Panics
    /// Panics when called outside a `tokio::task::LocalSet`.
    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        drop(tokio::task::spawn_local(task));
    }
}

pub type TesterHost = SimHost<TokioScheduler>;

#[must_use]
pub fn tester_host(viewport: Viewport) -> TesterHost {
    SimHost::with_scheduler(viewport, TokioScheduler)
}
