//! Pure Yew view components for the landing page controls.

use mathback::trail::BlendMode;
use web_sys::{HtmlInputElement, HtmlSelectElement};
use yew::prelude::*;

/// Labelled range slider reporting its raw string value.
#[derive(Properties, PartialEq)]
pub struct RangeControlProps {
    pub id: AttrValue,
    pub label: AttrValue,
    pub min: AttrValue,
    pub max: AttrValue,
    #[prop_or(AttrValue::Static("1"))]
    pub step: AttrValue,
    pub value: AttrValue,
    /// Text next to the slider, e.g. "7s".
    pub display: AttrValue,
    pub onchange: Callback<String>,
}

#[function_component(RangeControl)]
pub fn range_control(props: &RangeControlProps) -> Html {
    let oninput = {
        let onchange = props.onchange.clone();
        Callback::from(move |e: InputEvent| {
            let input: HtmlInputElement = e.target_unchecked_into();
            onchange.emit(input.value());
        })
    };

    html! {
        <div class="control">
            <label for={props.id.clone()}>{ props.label.clone() }</label>
            <input type="range"
                id={props.id.clone()}
                min={props.min.clone()}
                max={props.max.clone()}
                step={props.step.clone()}
                value={props.value.clone()}
                {oninput}
            />
            <span class="control-value">{ props.display.clone() }</span>
        </div>
    }
}

#[derive(Properties, PartialEq)]
pub struct ToggleControlProps {
    pub id: AttrValue,
    pub label: AttrValue,
    pub checked: bool,
    pub onchange: Callback<bool>,
}

#[function_component(ToggleControl)]
pub fn toggle_control(props: &ToggleControlProps) -> Html {
    let onchange = {
        let onchange = props.onchange.clone();
        Callback::from(move |e: Event| {
            let input: HtmlInputElement = e.target_unchecked_into();
            onchange.emit(input.checked());
        })
    };

    html! {
        <div class="control">
            <label for={props.id.clone()}>{ props.label.clone() }</label>
            <input type="checkbox" id={props.id.clone()} checked={props.checked} {onchange} />
        </div>
    }
}

/// Blend mode picker.
#[derive(Properties, PartialEq)]
pub struct BlendSelectProps {
    pub label: AttrValue,
    pub additive_label: AttrValue,
    pub alpha_label: AttrValue,
    pub value: BlendMode,
    pub onchange: Callback<BlendMode>,
}

fn blend_from_option(value: &str) -> Option<BlendMode> {
    match value {
        "additive" => Some(BlendMode::Additive),
        "alpha" => Some(BlendMode::Alpha),
        _ => None,
    }
}

#[function_component(BlendSelect)]
pub fn blend_select(props: &BlendSelectProps) -> Html {
    let onchange = {
        let onchange = props.onchange.clone();
        Callback::from(move |e: Event| {
            let select: HtmlSelectElement = e.target_unchecked_into();
            if let Some(mode) = blend_from_option(&select.value()) {
                onchange.emit(mode);
            }
        })
    };

    html! {
        <div class="control">
            <label for="blend">{ props.label.clone() }</label>
            <select id="blend" {onchange}>
                <option value="additive" selected={props.value == BlendMode::Additive}>
                    { props.additive_label.clone() }
                </option>
                <option value="alpha" selected={props.value == BlendMode::Alpha}>
                    { props.alpha_label.clone() }
                </option>
            </select>
        </div>
    }
}
