use railway_core::Labels;
use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct Props {
    /// Zero-based station index.
    pub index: usize,
    pub total: usize,
    pub labels: Labels,
    pub on_prev: Callback<()>,
    pub on_next: Callback<()>,
}

#[function_component(Footer)]
pub fn footer(p: &Props) -> Html {
    let is_first = p.index == 0;
    let is_last = p.index + 1 >= p.total;
    let on_prev = {
        let cb = p.on_prev.clone();
        Callback::from(move |_: MouseEvent| cb.emit(()))
    };
    let on_next = {
        let cb = p.on_next.clone();
        Callback::from(move |_: MouseEvent| cb.emit(()))
    };
    html! {
        <div class="railway-footer" style="display:flex;justify-content:space-between;align-items:center;padding-top:8px;">
            <span class="railway-counter">
                { p.index + 1 }
                <span class="railway-delimiter" style="display:inline-block;padding:0 4px;">
                    { p.labels.station_delimiter.clone() }
                </span>
                { p.total }
            </span>
            <div class="railway-actions" style="display:flex;gap:16px;">
                <button type="button" class="railway-prev" disabled={is_first} onclick={on_prev}>
                    { p.labels.previous.clone() }
                </button>
                <button type="button" class="railway-next" onclick={on_next}>
                    { p.labels.advance(is_last).to_string() }
                </button>
            </div>
        </div>
    }
}
