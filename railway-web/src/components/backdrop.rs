use railway_core::Rect;
use yew::prelude::*;

const BASE_STYLE: &str = "position:fixed;z-index:1300;pointer-events:none;border-radius:4px;\
box-shadow:0 0 0 9999px rgba(0,0,0,0.5);";

#[derive(Properties, PartialEq, Clone)]
pub struct Props {
    /// Element to cut out of the dimmed overlay; `None` dims everything.
    #[prop_or_default]
    pub highlight: Option<Rect>,
    pub padding: f64,
}

/// Inline style for the overlay, with the cut-out grown by `padding` on each side.
#[must_use]
pub fn backdrop_style(highlight: Option<Rect>, padding: f64) -> String {
    highlight.map_or_else(
        || BASE_STYLE.to_string(),
        |rect| {
            let hole = rect.inflate(padding);
            format!(
                "{BASE_STYLE}top:{}px;left:{}px;width:{}px;height:{}px;",
                hole.top, hole.left, hole.width, hole.height
            )
        },
    )
}

#[function_component(Backdrop)]
pub fn backdrop(p: &Props) -> Html {
    html! {
        <div class="railway-backdrop" aria-hidden="true" style={backdrop_style(p.highlight, p.padding)} />
    }
}
