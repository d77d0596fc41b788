//! Scripted scenarios. Each one mounts tours on a simulated page, drives them
//! the way a user would and checks coordinator, engine and storage state.
use anyhow::{Context, Result, ensure};
use async_trait::async_trait;
use railway_core::{
    CloseHandler, Coordination, EngineState, Hook, HookError, MemoryFlagStore, Placement, Rect,
    Station, StationId, Tour, TourConfig, TourId, Trigger, Viewport,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::{Scenario, ScenarioCtx};

fn centered_stations(count: usize) -> Vec<Station> {
    (1..=count)
        .map(|n| Station::centered(format!("Station {n}")))
        .collect()
}

fn auto_tour(id: &str, stations: Vec<Station>) -> Tour {
    Tour::new(id, stations).with_config(TourConfig {
        auto_start: true,
        ..TourConfig::default()
    })
}

fn same_rect(a: Option<Rect>, b: Rect) -> bool {
    a.is_some_and(|a| {
        (a.top - b.top).abs() < 1e-6
            && (a.left - b.left).abs() < 1e-6
            && (a.width - b.width).abs() < 1e-6
            && (a.height - b.height).abs() < 1e-6
    })
}

pub struct AutoStart;

#[async_trait(?Send)]
impl Scenario for AutoStart {
    fn name(&self) -> &'static str {
        "Auto-start picks the first eligible tour"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let (_host, session) = ctx.session();
        let coordinator = session.coordinator();
        coordinator.set_order(["tips", "intro"]);

        ctx.step("mounting intro before tips");
        let intro = session.mount(auto_tour("intro", centered_stations(2)));
        ensure!(
            !coordinator.is_running(),
            "intro is not first in order and must wait"
        );
        let tips = session.mount(auto_tour("tips", centered_stations(3)));
        ctx.settle().await;

        ensure!(
            coordinator.running_id() == Some(TourId::from("tips")),
            "expected tips to run, got {:?}",
            coordinator.running_id()
        );
        ensure!(intro.driver().state() == EngineState::Idle);
        let geometry = tips
            .driver()
            .view()
            .geometry
            .context("tips never resolved its first station")?;
        ensure!(geometry.centered && geometry.placement == Placement::Auto);

        ctx.step("closing tips hands the slot to intro");
        tips.driver().close();
        ctx.settle().await;
        ensure!(coordinator.running_id() == Some(TourId::from("intro")));
        ensure!(intro.driver().state() == EngineState::Active(0));
        Ok(())
    }
}

pub struct Walkthrough;

#[async_trait(?Send)]
impl Scenario for Walkthrough {
    fn name(&self) -> &'static str {
        "Walk every station and finish"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let store = Rc::new(MemoryFlagStore::new());
        let (host, session) = ctx.session_with_store(Rc::clone(&store));
        let search = Rect::new(80.0, 40.0, 240.0, 36.0);
        let results = Rect::new(160.0, 40.0, 500.0, 300.0);
        host.page.place("search", search);
        host.page.place("results", results);

        let tour = session.mount(auto_tour(
            "walkthrough",
            vec![
                Station::targeted("search", "Search".to_string()),
                Station::targeted("results", "Results".to_string())
                    .with_description("Matches show up here".to_string()),
                Station::centered("Done".to_string()),
            ],
        ));
        let driver = tour.driver();
        ctx.settle().await;
        ensure!(same_rect(
            driver.view().geometry.and_then(|g| g.highlight),
            search
        ));

        driver.prev();
        ensure!(driver.state() == EngineState::Active(0), "prev at 0 must stay");

        ctx.step("advancing to results");
        driver.next();
        ctx.settle().await;
        ensure!(driver.state() == EngineState::Active(1));
        ensure!(same_rect(
            driver.view().geometry.and_then(|g| g.highlight),
            results
        ));

        driver.next();
        ctx.settle().await;
        let last = driver.view();
        ensure!(last.is_last());
        ensure!(last.geometry.is_some_and(|g| g.centered && g.highlight.is_none()));

        ctx.step("finishing");
        driver.next();
        ctx.settle().await;
        let coordinator = session.coordinator();
        let id = TourId::from("walkthrough");
        ensure!(!coordinator.is_running());
        ensure!(coordinator.completed() == vec![id.clone()]);
        ensure!(coordinator.viewed() == vec![id]);
        ensure!(store.get("railway:walkthrough:completed").as_deref() == Some("true"));
        ensure!(store.get("railway:walkthrough:viewed").as_deref() == Some("true"));
        Ok(())
    }
}

pub struct Preemption;

#[async_trait(?Send)]
impl Scenario for Preemption {
    fn name(&self) -> &'static str {
        "Starting a tour preempts the runner"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let (_host, session) = ctx.session();
        let coordinator = session.coordinator();
        let first = session.mount(Tour::new("first", centered_stations(2)));
        let second = session.mount(Tour::new("second", centered_stations(2)));
        ensure!(!coordinator.is_running(), "neither tour auto-starts");

        coordinator.start(first.id());
        ctx.settle().await;
        first.driver().next();
        ctx.settle().await;
        ensure!(first.driver().state() == EngineState::Active(1));

        ctx.step("starting second while first runs");
        coordinator.start(second.id());
        ctx.settle().await;
        ensure!(first.driver().state() == EngineState::Idle);
        ensure!(second.driver().state() == EngineState::Active(0));

        ctx.step("a stale stop for first is ignored");
        coordinator.stop(first.id());
        ensure!(coordinator.running_id() == Some(TourId::from("second")));
        ensure!(
            coordinator.viewed().is_empty(),
            "preemption must not mark anything viewed"
        );
        Ok(())
    }
}

pub struct OffscreenTarget;

#[async_trait(?Send)]
impl Scenario for OffscreenTarget {
    fn name(&self) -> &'static str {
        "Off-screen target is scrolled into view"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let (host, session) = ctx.session();
        host.page.place("footer", Rect::new(900.0, 0.0, 800.0, 100.0));
        host.page.place("banner", Rect::new(-400.0, 0.0, 800.0, 60.0));
        host.page.block_scrolling(true);

        let tour = session.mount(auto_tour(
            "offscreen",
            vec![
                Station::targeted("banner", "Banner".to_string()),
                Station::targeted("footer", "Footer".to_string()),
            ],
        ));
        ctx.settle().await;

        ctx.step("a target that cannot scroll stays off-screen");
        let stuck = tour.driver().view().geometry.context("no geometry")?;
        ensure!(stuck.placement == Placement::Bottom);
        ensure!(host.page.scroll_requests() == vec![StationId::from("banner")]);

        host.page.block_scrolling(false);
        tour.driver().next();
        ctx.settle().await;

        let geometry = tour.driver().view().geometry.context("no geometry")?;
        let highlight = geometry.highlight.context("footer was not highlighted")?;
        ensure!(
            (highlight.bottom() - 600.0).abs() < 1e-6,
            "footer should sit on the bottom edge, got {highlight:?}"
        );
        ensure!(geometry.placement == Placement::Top);
        ensure!(host.page.scroll_requests().last() == Some(&StationId::from("footer")));
        Ok(())
    }
}

pub struct MissingTarget;

#[async_trait(?Send)]
impl Scenario for MissingTarget {
    fn name(&self) -> &'static str {
        "Missing target falls back to the center"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let (host, session) = ctx.session();
        let tour = session.mount(auto_tour(
            "missing",
            vec![Station::targeted("not-rendered-yet", "Soon".to_string())],
        ));
        ctx.settle().await;

        let geometry = tour.driver().view().geometry.context("no geometry")?;
        ensure!(geometry.centered);
        ensure!(geometry.highlight.is_none());
        ensure!(geometry.placement == Placement::Auto);
        ensure!(same_rect(Some(geometry.anchor), Rect::point(400.0, 300.0)));
        ensure!(host.page.scroll_requests().is_empty());
        Ok(())
    }
}

pub struct Hooks;

#[async_trait(?Send)]
impl Scenario for Hooks {
    fn name(&self) -> &'static str {
        "Lifecycle hooks run in order and failures are ignored"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let (host, session) = ctx.session();
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::default();
        let record = |entry: &'static str, fail: bool| {
            let log = Rc::clone(&log);
            Hook::new(move || {
                let log = Rc::clone(&log);
                async move {
                    log.borrow_mut().push(entry);
                    if fail {
                        Err(HookError::msg("drawer animation failed"))
                    } else {
                        Ok(())
                    }
                }
            })
        };

        host.page.place("trash-list", Rect::new(200.0, 20.0, 300.0, 200.0));
        let tour = session.mount(auto_tour(
            "hooks",
            vec![
                Station::centered("Menu".to_string())
                    .before_arrival(record("arrive menu", false))
                    .after_departure(record("leave menu", true)),
                Station::targeted("trash-list", "Trash".to_string())
                    .before_arrival(record("arrive trash", false))
                    .after_departure(record("leave trash", false)),
            ],
        ));
        ctx.settle().await;

        tour.driver().next();
        ctx.settle().await;
        ensure!(tour.driver().state() == EngineState::Active(1));
        ensure!(
            tour.driver()
                .view()
                .geometry
                .is_some_and(|g| g.highlight.is_some()),
            "a failing departure hook must not block the next station"
        );

        tour.driver().close();
        ctx.settle().await;
        let seen = log.borrow().clone();
        ensure!(
            seen == ["arrive menu", "leave menu", "arrive trash", "leave trash"],
            "unexpected hook order {seen:?}"
        );
        Ok(())
    }
}

pub struct Persistence;

#[async_trait(?Send)]
impl Scenario for Persistence {
    fn name(&self) -> &'static str {
        "Viewed flag survives a reload"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let store = Rc::new(MemoryFlagStore::new());
        {
            let (_host, session) = ctx.session_with_store(Rc::clone(&store));
            let tour = session.mount(auto_tour("intro", centered_stations(3)));
            ctx.settle().await;
            ensure!(session.coordinator().is_running());
            ctx.step("dismissing on the first station");
            tour.driver().close();
            ctx.settle().await;
            ensure!(session.coordinator().completed().is_empty());
        }
        ensure!(store.get("railway:intro:viewed").as_deref() == Some("true"));

        ctx.step("reloading with the same storage");
        let (_host, session) = ctx.session_with_store(Rc::clone(&store));
        let _tour = session.mount(auto_tour("intro", centered_stations(3)));
        ctx.settle().await;
        let coordinator = session.coordinator();
        ensure!(coordinator.viewed() == vec![TourId::from("intro")]);
        ensure!(!coordinator.is_running(), "a viewed tour must not auto-start");
        Ok(())
    }
}

pub struct TriggerControl;

#[async_trait(?Send)]
impl Scenario for TriggerControl {
    fn name(&self) -> &'static str {
        "Trigger starts a tour and hears about the close"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let (_host, session) = ctx.session();
        let closed = Rc::new(Cell::new(0_u32));
        let counter = Rc::clone(&closed);
        let config = TourConfig {
            trigger: Some(Trigger {
                running: true,
                on_close: Some(CloseHandler::new(move || counter.set(counter.get() + 1))),
            }),
            ..TourConfig::default()
        };

        let tour = session.mount(Tour::new("help", centered_stations(2)).with_config(config));
        ctx.settle().await;
        ensure!(session.coordinator().running_id() == Some(TourId::from("help")));
        ensure!(tour.driver().state() == EngineState::Active(0));

        tour.driver().close();
        ctx.settle().await;
        ensure!(closed.get() == 1, "on_close fired {} times", closed.get());
        ensure!(!session.coordinator().is_running());
        Ok(())
    }
}

pub struct ViewportTracking;

#[async_trait(?Send)]
impl Scenario for ViewportTracking {
    fn name(&self) -> &'static str {
        "Highlight follows resize and scroll"
    }

    async fn run(&self, ctx: &ScenarioCtx) -> Result<()> {
        let (host, session) = ctx.session();
        let id = StationId::from("sidebar");
        host.page.place(id.clone(), Rect::new(120.0, 20.0, 200.0, 300.0));

        let tour = session.mount(auto_tour(
            "tracking",
            vec![Station::targeted("sidebar", "Sidebar".to_string())],
        ));
        ctx.settle().await;
        ensure!(tour.driver().has_listeners());

        ctx.step("layout shift after a resize");
        let moved = Rect::new(140.0, 420.0, 200.0, 300.0);
        host.page.relocate(&id, moved);
        host.page.resize(Viewport::new(1024.0, 768.0));
        ensure!(same_rect(
            tour.driver().view().geometry.and_then(|g| g.highlight),
            moved
        ));

        ctx.step("document scroll");
        host.page.scroll_by(40.0);
        ensure!(same_rect(
            tour.driver().view().geometry.and_then(|g| g.highlight),
            moved.translate(0.0, -40.0)
        ));

        tour.driver().close();
        ensure!(!tour.driver().has_listeners());
        ensure!(host.page.listener_count() == 0, "listeners leaked after close");
        Ok(())
    }
}
