use yew::prelude::*;

#[derive(Properties, PartialEq, Clone)]
pub struct Props {
    pub title: Html,
    pub close_tooltip: AttrValue,
    pub on_close: Callback<()>,
}

#[function_component(Header)]
pub fn header(p: &Props) -> Html {
    let on_close = {
        let cb = p.on_close.clone();
        Callback::from(move |_: MouseEvent| cb.emit(()))
    };
    html! {
        <div class="railway-header" style="display:flex;justify-content:space-between;align-items:center;gap:8px;">
            <h2 class="railway-title" style="margin:0;font-size:1.25rem;">{ p.title.clone() }</h2>
            <button
                type="button"
                class="railway-close"
                title={p.close_tooltip.clone()}
                aria-label={p.close_tooltip.clone()}
                onclick={on_close}
            >
                { "\u{00d7}" }
            </button>
        </div>
    }
}
