use railway_core::{
    CloseHandler, Coordination, EngineSettings, EngineState, FlagStore, Hook, HookError,
    MemoryFlagStore, Session, SimHost, Station, Tour, TourConfig, TourId, Trigger, Viewport,
};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

type Log = Rc<RefCell<Vec<String>>>;

fn host() -> Rc<SimHost> {
    Rc::new(SimHost::new(Viewport::new(1280.0, 720.0)))
}

fn session(host: &Rc<SimHost>) -> Session<MemoryFlagStore, SimHost> {
    Session::new(MemoryFlagStore::new(), Rc::clone(host), EngineSettings::default())
}

fn centered_tour(id: &str, stations: usize, auto_start: bool) -> Tour {
    let stations = (0..stations)
        .map(|n| Station::centered(format!("Station {n}")))
        .collect();
    Tour::new(id, stations).with_config(TourConfig {
        auto_start,
        ..TourConfig::default()
    })
}

fn logging_hook(log: &Log, entry: &str, fail: bool) -> Hook {
    let log = Rc::clone(log);
    let entry = entry.to_string();
    Hook::new(move || {
        let log = Rc::clone(&log);
        let entry = entry.clone();
        async move {
            log.borrow_mut().push(entry);
            if fail {
                Err(HookError::msg("hook blew up"))
            } else {
                Ok(())
            }
        }
    })
}

#[test]
fn autostart_tour_runs_when_first_in_order() {
    let host = host();
    let session = session(&host);
    session.coordinator().set_order(["intro"]);
    let intro = session.mount(centered_tour("intro", 3, true));
    host.run_until_stalled();

    assert_eq!(session.coordinator().running_id(), Some(TourId::from("intro")));
    assert_eq!(intro.driver().state(), EngineState::Active(0));
    assert!(intro.driver().view().geometry.is_some());
}

#[test]
fn finishing_the_last_station_completes_and_releases() {
    let host = host();
    let store = Rc::new(MemoryFlagStore::new());
    let session = Session::new(Rc::clone(&store), Rc::clone(&host), EngineSettings::default());
    let intro = session.mount(centered_tour("intro", 3, true));
    let driver = intro.driver();

    driver.next();
    driver.next();
    assert_eq!(driver.state(), EngineState::Active(2));
    assert!(driver.view().is_last());
    driver.next();
    host.run_until_stalled();

    let coordinator = session.coordinator();
    let id = TourId::from("intro");
    assert!(!coordinator.is_running());
    assert_eq!(coordinator.completed(), vec![id.clone()]);
    assert_eq!(coordinator.viewed(), vec![id]);
    assert_eq!(store.get("railway:intro:completed").as_deref(), Some("true"));
    assert_eq!(store.get("railway:intro:viewed").as_deref(), Some("true"));
    assert_eq!(driver.state(), EngineState::Idle);
    assert_eq!(driver.view().index, 0);
}

#[test]
fn closing_midway_marks_viewed_but_not_completed() {
    let host = host();
    let session = session(&host);
    let intro = session.mount(centered_tour("intro", 3, true));
    intro.driver().next();
    intro.driver().close();

    let coordinator = session.coordinator();
    assert!(coordinator.completed().is_empty());
    assert_eq!(coordinator.viewed(), vec![TourId::from("intro")]);
    assert!(coordinator.is_blocked(intro.id()));
    assert!(!coordinator.is_running());
    assert_eq!(intro.driver().state(), EngineState::Idle);
}

#[test]
fn closed_autostart_tour_does_not_reclaim_the_slot() {
    let host = host();
    let session = session(&host);
    let intro = session.mount(centered_tour("intro", 3, true));
    assert_eq!(session.coordinator().running_id(), Some(TourId::from("intro")));

    intro.driver().next();
    intro.driver().close();
    assert_eq!(session.coordinator().running_id(), None);
    assert_eq!(intro.driver().state(), EngineState::Idle);

    let tips = session.mount(centered_tour("tips", 2, true));
    assert_eq!(session.coordinator().running_id(), Some(TourId::from("tips")));
    tips.driver().next();
    tips.driver().next();
    assert_eq!(session.coordinator().running_id(), None);
    assert_eq!(
        session.coordinator().completed(),
        vec![TourId::from("tips")]
    );
}

#[test]
fn prev_at_first_station_and_navigation_while_idle_do_nothing() {
    let host = host();
    let session = session(&host);
    let intro = session.mount(centered_tour("intro", 2, false));
    let driver = intro.driver();

    driver.next();
    assert_eq!(driver.state(), EngineState::Idle);
    assert_eq!(driver.view().index, 0);

    session.coordinator().start(intro.id());
    driver.prev();
    assert_eq!(driver.state(), EngineState::Active(0));
    driver.next();
    assert_eq!(driver.state(), EngineState::Active(1));
}

#[test]
fn empty_tour_never_renders() {
    let host = host();
    let session = session(&host);
    let empty = session.mount(centered_tour("empty", 0, true));
    assert!(!session.coordinator().is_running());
    session.coordinator().start(empty.id());
    assert_eq!(empty.driver().state(), EngineState::Idle);
}

#[test]
fn completion_survives_a_new_session() {
    let store = Rc::new(MemoryFlagStore::new());
    {
        let host = host();
        let session = Session::new(Rc::clone(&store), host, EngineSettings::default());
        session.coordinator().set_completed(&TourId::from("intro"), true);
    }

    let host = host();
    let session = Session::new(Rc::clone(&store), Rc::clone(&host), EngineSettings::default());
    let _intro = session.mount(centered_tour("intro", 3, true));
    let coordinator = session.coordinator();
    assert_eq!(coordinator.completed(), vec![TourId::from("intro")]);
    assert!(!coordinator.is_running());
}

#[test]
fn only_the_first_eligible_autostart_tour_starts() {
    let host = host();
    let session = session(&host);
    session.coordinator().set_order(["billing", "welcome"]);
    let welcome = session.mount(centered_tour("welcome", 1, true));
    assert!(!session.coordinator().is_running());
    let billing = session.mount(centered_tour("billing", 1, true));

    assert_eq!(session.coordinator().running_id(), Some(TourId::from("billing")));
    assert_eq!(welcome.driver().state(), EngineState::Idle);

    billing.driver().close();
    assert_eq!(session.coordinator().running_id(), Some(TourId::from("welcome")));
    assert_eq!(welcome.driver().state(), EngineState::Active(0));
}

#[test]
fn unmounting_the_runner_hands_the_slot_on() {
    let host = host();
    let session = session(&host);
    let first = session.mount(centered_tour("first", 1, true));
    let second = session.mount(centered_tour("second", 1, true));
    assert_eq!(session.coordinator().running_id(), Some(TourId::from("first")));

    drop(first);
    assert_eq!(session.coordinator().running_id(), Some(TourId::from("second")));
    assert_eq!(second.driver().state(), EngineState::Active(0));
}

#[test]
fn departure_runs_before_arrival_and_failures_are_ignored() {
    let host = host();
    let log: Log = Rc::default();
    let tour = Tour::new(
        "hooks",
        vec![
            Station::centered("one".to_string())
                .after_departure(logging_hook(&log, "leave one", false)),
            Station::centered("two".to_string())
                .before_arrival(logging_hook(&log, "reach two", true)),
        ],
    );
    let session = session(&host);
    let mounted = session.mount(tour);
    session.coordinator().start(mounted.id());
    host.run_until_stalled();
    assert!(log.borrow().is_empty());

    mounted.driver().next();
    host.run_until_stalled();
    assert_eq!(*log.borrow(), vec!["leave one", "reach two"]);
    let geometry = mounted.driver().view().geometry.expect("geometry resolved");
    assert!(geometry.centered);

    mounted.driver().next();
    host.run_until_stalled();
    assert!(!session.coordinator().is_running());
    assert_eq!(log.borrow().len(), 2);
}

#[test]
fn close_fires_the_current_departure_hook() {
    let host = host();
    let log: Log = Rc::default();
    let tour = Tour::new(
        "hooks",
        vec![
            Station::centered("one".to_string())
                .after_departure(logging_hook(&log, "leave one", true)),
        ],
    );
    let session = session(&host);
    let mounted = session.mount(tour);
    session.coordinator().start(mounted.id());
    mounted.driver().close();
    host.run_until_stalled();
    assert_eq!(*log.borrow(), vec!["leave one"]);

    let coordinator = session.coordinator();
    assert_eq!(coordinator.completed(), vec![TourId::from("hooks")]);
    assert_eq!(coordinator.viewed(), vec![TourId::from("hooks")]);
    assert!(!coordinator.is_running());
}

#[test]
fn rebuilt_stations_keep_the_current_step() {
    let host = host();
    let log: Log = Rc::default();
    let stations = |log: &Log| {
        (0..3)
            .map(|n| {
                Station::centered(format!("Station {n}"))
                    .before_arrival(logging_hook(log, &format!("arrive {n}"), false))
            })
            .collect::<Vec<_>>()
    };
    let session = session(&host);
    let mounted = session.mount(Tour::new("rebuilt", stations(&log)));
    session.coordinator().start(mounted.id());
    let driver = mounted.driver();
    driver.next();
    host.run_until_stalled();
    assert_eq!(driver.state(), EngineState::Active(1));
    assert_eq!(*log.borrow(), vec!["arrive 0", "arrive 1"]);

    driver.replace_tour(stations(&log), TourConfig::default());
    host.run_until_stalled();
    assert_eq!(driver.state(), EngineState::Active(1));
    assert_eq!(log.borrow().len(), 2);

    driver.replace_tour(
        vec![Station::centered("Only".to_string())],
        TourConfig::default(),
    );
    assert_eq!(driver.state(), EngineState::Active(0));
    assert_eq!(driver.view().total, 1);
}

#[test]
fn trigger_starts_the_tour_and_reports_close() {
    let host = host();
    let closed = Rc::new(Cell::new(0));
    let counter = Rc::clone(&closed);
    let tour = centered_tour("triggered", 2, false).with_config(TourConfig {
        trigger: Some(Trigger {
            running: true,
            on_close: Some(CloseHandler::new(move || counter.set(counter.get() + 1))),
        }),
        ..TourConfig::default()
    });
    let session = session(&host);
    let mounted = session.mount(tour);
    assert_eq!(mounted.driver().state(), EngineState::Active(0));

    mounted.driver().close();
    assert_eq!(closed.get(), 1);
    assert!(!session.coordinator().is_running());
}

#[test]
fn storage_outage_keeps_the_session_working() {
    let host = host();
    let store = Rc::new(MemoryFlagStore::new());
    store.set_unavailable(true);
    let session = Session::new(Rc::clone(&store), Rc::clone(&host), EngineSettings::default());
    let intro = session.mount(centered_tour("intro", 1, true));
    assert!(session.coordinator().is_running());

    intro.driver().next();
    assert_eq!(session.coordinator().completed(), vec![TourId::from("intro")]);
    assert!(store.is_empty());
    assert!(store.read("railway:intro:completed").is_err());
}

#[test]
fn configuration_fixture_parses() {
    let config = TourConfig::from_json(include_str!("fixtures/onboarding.json")).unwrap();
    assert!(config.auto_start);
    assert!(config.trigger.is_none());
    assert_eq!(config.labels.advance(false), "Continue");
    assert_eq!(config.labels.advance(true), "Done");
    assert_eq!(config.labels.station_delimiter, "of");
    assert_eq!(config.paper_style.as_deref(), Some("max-width: 320px;"));
}
