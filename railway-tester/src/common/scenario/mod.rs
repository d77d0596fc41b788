use anyhow::Result;
use async_trait::async_trait;
use railway_core::{EngineSettings, MemoryFlagStore, Session, Viewport};
use std::rc::Rc;
use std::time::Duration;

use crate::runtime::{FRAME_MS, TesterHost, tester_host};

pub mod catalog;

/// Window size every scenario starts with.
pub const VIEWPORT: Viewport = Viewport::new(800.0, 600.0);

pub type TesterSession = Session<Rc<MemoryFlagStore>, TesterHost>;

#[derive(Debug, Clone, Copy)]
pub struct ScenarioCtx {
    pub settings: EngineSettings,
    pub verbose: bool,
}

impl ScenarioCtx {
    /// Fresh page, fresh storage.
    pub fn session(&self) -> (Rc<TesterHost>, TesterSession) {
        self.session_with_store(Rc::new(MemoryFlagStore::new()))
    }

    /// Fresh page over `store`, e.g. to simulate a reload.
    pub fn session_with_store(&self, store: Rc<MemoryFlagStore>) -> (Rc<TesterHost>, TesterSession) {
        let host = Rc::new(tester_host(VIEWPORT));
        let session = Session::new(store, Rc::clone(&host), self.settings);
        (host, session)
    }

    /// Long enough for one transition, including a scroll and re-measure.
    pub async fn settle(&self) {
        let ms = u64::from(self.settings.settle_ms) + FRAME_MS * 4 + 10;
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }

    pub fn step(&self, message: &str) {
        log::debug!("{message}");
        if self.verbose {
            println!("   ↳ {message}");
        }
    }
}

#[async_trait(?Send)]
pub trait Scenario {
    fn name(&self) -> &'static str;

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()>;
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ScenarioError {
    #[error("unknown scenario: {0}")]
    Unknown(String),
}

/// Keys expanded from `all`, in run order.
pub const SCENARIO_KEYS: &[&str] = &[
    "autostart",
    "walkthrough",
    "preemption",
    "offscreen-target",
    "missing-target",
    "hooks",
    "persistence",
    "trigger",
    "viewport-tracking",
];

pub fn get_scenario(key: &str) -> Result<Box<dyn Scenario>, ScenarioError> {
    use catalog::{
        AutoStart, Hooks, MissingTarget, OffscreenTarget, Persistence, Preemption,
        TriggerControl, ViewportTracking, Walkthrough,
    };

    let scenario: Box<dyn Scenario> = match key.to_lowercase().as_str() {
        "autostart" | "auto-start" => Box::new(AutoStart),
        "walkthrough" | "walk" => Box::new(Walkthrough),
        "preemption" | "preempt" => Box::new(Preemption),
        "offscreen-target" | "offscreen" => Box::new(OffscreenTarget),
        "missing-target" | "missing" => Box::new(MissingTarget),
        "hooks" => Box::new(Hooks),
        "persistence" | "reload" => Box::new(Persistence),
        "trigger" => Box::new(TriggerControl),
        "viewport-tracking" | "viewport" => Box::new(ViewportTracking),
        _ => return Err(ScenarioError::Unknown(key.to_string())),
    };
    Ok(scenario)
}

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    SCENARIO_KEYS
        .iter()
        .filter_map(|key| get_scenario(key).ok().map(|s| (*key, s.name())))
        .collect()
}
