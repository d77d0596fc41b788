//! The `<Railway>` tour component.
//!
//! Registers its tour with the surrounding provider, evaluates auto-start on
//! every coordinator change and, while it holds the run slot, renders the
//! dimmed backdrop plus the popover for the current station.

use railway_core::{EngineSettings, Station, StepDriver, Tour, TourConfig, TourId};
use std::rc::Rc;
use yew::prelude::*;

use crate::components::backdrop::Backdrop;
use crate::components::footer::Footer;
use crate::components::header::Header;
use crate::components::popover::Popover;
use crate::context::{RailwayControl, use_railway, use_register_railway};
use crate::host::DomHost;

pub type WebDriver = StepDriver<Html, DomHost, RailwayControl>;

/// Identity wrapper so effects re-run only when a new driver is built.
#[derive(Clone)]
pub struct DriverHandle(pub Rc<WebDriver>);

impl PartialEq for DriverHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

#[derive(Properties, PartialEq, Clone)]
pub struct Props {
    pub id: AttrValue,
    pub stations: Vec<Station<Html>>,
    #[prop_or_default]
    pub config: TourConfig,
    #[prop_or_default]
    pub settings: EngineSettings,
}

#[function_component(Railway)]
pub fn railway(p: &Props) -> Html {
    let context = use_railway();
    let id = TourId::from(p.id.as_str());
    use_register_railway(&id);
    let force_update = use_force_update();

    // Stations usually carry fresh hook closures on every parent render, so the
    // driver lives as long as the tour id and settings do.
    let driver = {
        let control = context.control();
        let force_update = force_update.clone();
        let tour = Tour {
            id: id.clone(),
            stations: p.stations.clone(),
            config: p.config.clone(),
        };
        use_memo((p.id.clone(), p.settings), move |(_, settings)| {
            let driver = StepDriver::new(tour, Rc::new(DomHost::new()), control, *settings);
            driver.set_notify(move || force_update.force_update());
            DriverHandle(driver)
        })
    };

    {
        let driver = (*driver).clone();
        use_effect_with(
            (p.stations.clone(), p.config.clone()),
            move |(stations, config)| {
                driver.0.replace_tour(stations.clone(), config.clone());
            },
        );
    }

    let is_running = context.state().is_running_tour(&id);

    {
        let driver = (*driver).clone();
        use_effect_with((is_running, driver), |(running, driver)| {
            if *running {
                driver.0.activate();
            } else {
                driver.0.deactivate();
            }
            let driver = driver.clone();
            move || driver.0.deactivate()
        });
    }

    {
        let driver = (*driver).clone();
        use_effect_with((context.state().clone(), driver), |(state, driver)| {
            driver.0.evaluate_auto_start(state);
        });
    }

    {
        let driver = (*driver).clone();
        let trigger_running = p.config.trigger.as_ref().is_some_and(|t| t.running);
        use_effect_with((trigger_running, driver), move |(_, driver)| {
            driver.0.sync_trigger(is_running);
        });
    }

    if !is_running || p.stations.is_empty() {
        return Html::default();
    }

    let view = driver.0.view();
    let Some(station) = p.stations.get(view.index) else {
        return Html::default();
    };
    let labels = &p.config.labels;

    let on_close = {
        let driver = (*driver).clone();
        Callback::from(move |()| driver.0.close())
    };
    let on_prev = {
        let driver = (*driver).clone();
        Callback::from(move |()| driver.0.prev())
    };
    let on_next = {
        let driver = (*driver).clone();
        Callback::from(move |()| driver.0.next())
    };

    html! {
        <>
            <Backdrop
                highlight={view.geometry.and_then(|g| g.highlight)}
                padding={p.settings.highlight_padding}
            />
            <Popover
                geometry={view.geometry}
                settings={p.settings}
                paper_style={p.config.paper_style.clone()}
            >
                <Header
                    title={station.title.clone()}
                    close_tooltip={AttrValue::from(labels.close_tooltip.clone())}
                    on_close={on_close}
                />
                if let Some(description) = &station.description {
                    <div class="railway-description">{ description.clone() }</div>
                }
                <Footer
                    index={view.index}
                    total={view.total}
                    labels={labels.clone()}
                    on_prev={on_prev}
                    on_next={on_next}
                />
            </Popover>
        </>
    }
}
