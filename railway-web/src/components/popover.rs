use railway_core::{
    EngineSettings, FlipPositioner, Offset, OffsetRule, PopoverPosition, PositionRequest,
    Positioner, Size, StepGeometry, Viewport,
};
use yew::prelude::*;

use crate::dom;

const PAPER_STYLE: &str = "padding:16px;min-width:300px;border-radius:4px;display:flex;\
flex-direction:column;gap:16px;background:#fff;box-shadow:0 8px 24px rgba(0,0,0,0.25);";

#[derive(Properties, PartialEq, Clone)]
pub struct Props {
    /// Resolved anchor and side; `None` keeps the popover hidden.
    #[prop_or_default]
    pub geometry: Option<StepGeometry>,
    pub settings: EngineSettings,
    /// Appended to the paper's inline style.
    #[prop_or_default]
    pub paper_style: Option<String>,
    #[prop_or_default]
    pub children: Children,
}

/// Where the popover goes for `geometry`, given its measured size.
#[must_use]
pub fn place(
    geometry: &StepGeometry,
    popover: Size,
    viewport: Viewport,
    settings: &EngineSettings,
) -> PopoverPosition {
    let offset = if geometry.centered {
        OffsetRule::Centered
    } else {
        OffsetRule::Fixed(Offset::distance(settings.popover_offset))
    };
    let positioner = FlipPositioner {
        overflow_padding: settings.overflow_padding,
    };
    positioner.position(&PositionRequest {
        anchor: geometry.anchor,
        popover,
        placement: geometry.placement,
        offset,
        viewport,
        flip: !geometry.centered,
    })
}

fn wrapper_style(position: Option<PopoverPosition>) -> String {
    position.map_or_else(
        || "position:fixed;z-index:1301;top:0;left:0;visibility:hidden;".to_string(),
        |pos| {
            format!(
                "position:fixed;z-index:1301;top:{}px;left:{}px;",
                pos.top, pos.left
            )
        },
    )
}

#[function_component(Popover)]
pub fn popover(p: &Props) -> Html {
    let node = use_node_ref();
    let measured = use_state(|| None::<(Size, Viewport)>);

    {
        let node = node.clone();
        let measured = measured.clone();
        use_effect(move || {
            if let Some(el) = node.cast::<web_sys::Element>() {
                let rect = el.get_bounding_client_rect();
                let next = (Size::new(rect.width(), rect.height()), dom::viewport());
                if *measured != Some(next) {
                    measured.set(Some(next));
                }
            }
        });
    }

    let position = p
        .geometry
        .as_ref()
        .zip(*measured)
        .map(|(geometry, (size, viewport))| place(geometry, size, viewport, &p.settings));
    let placement = position.map_or("auto", |pos| pos.placement.as_str());
    let paper_style = match &p.paper_style {
        Some(extra) => format!("{PAPER_STYLE}{extra}"),
        None => PAPER_STYLE.to_string(),
    };

    html! {
        <div
            ref={node}
            class="railway-popover"
            role="dialog"
            data-placement={placement}
            style={wrapper_style(position)}
        >
            <div class="railway-paper" style={paper_style}>
                { for p.children.iter() }
            </div>
        </div>
    }
}
