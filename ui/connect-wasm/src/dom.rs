//! DOM element bindings.
//!
//! Host elements are resolved once at startup; widget markup is rebuilt by
//! `render` on every state change.

use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, HtmlButtonElement, HtmlElement, HtmlOptionElement, HtmlSelectElement};

// ── Helpers ──

fn doc() -> Result<Document, JsValue> {
    web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))
}

pub fn by_id(id: &str) -> Option<Element> {
    doc().ok()?.get_element_by_id(id)
}

pub fn set_text(el: &Element, text: &str) {
    el.set_text_content(Some(text));
}

pub fn clear(el: &Element) {
    el.set_inner_html("");
}

pub fn toggle_class(el: &Element, cls: &str, force: bool) {
    let _ = el.class_list().toggle_with_force(cls, force);
}

pub fn create_element(tag: &str) -> Result<Element, JsValue> {
    doc()?.create_element(tag)
}

pub fn create_typed<T: JsCast>(tag: &str) -> Result<T, JsValue> {
    create_element(tag)?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("<{tag}> has an unexpected type")))
}

pub fn create_option(value: &str, text: &str, selected: bool) -> Result<HtmlOptionElement, JsValue> {
    let opt: HtmlOptionElement = create_typed("option")?;
    opt.set_value(value);
    opt.set_text_content(Some(text));
    opt.set_selected(selected);
    Ok(opt)
}

pub fn create_select() -> Result<HtmlSelectElement, JsValue> {
    create_typed("select")
}

pub fn create_button(label: &str, disabled: bool) -> Result<HtmlButtonElement, JsValue> {
    let button: HtmlButtonElement = create_typed("button")?;
    button.set_text_content(Some(label));
    button.set_disabled(disabled);
    Ok(button)
}

pub fn set_style(el: &Element, property: &str, value: &str) {
    if let Some(html) = el.dyn_ref::<HtmlElement>() {
        let _ = html.style().set_property(property, value);
    }
}

// ── Elements struct ──

/// Host elements the widget renders into.
#[derive(Clone)]
pub struct Elements {
    pub widget_root: Element,
    pub status: Element,
    pub chain: Element,
    pub accounts: Element,
}

macro_rules! get_el {
    ($id:expr) => {
        by_id($id).ok_or_else(|| JsValue::from_str(&format!("missing element #{}", $id)))?
    };
}

impl Elements {
    /// Resolve all DOM references. Call once after DOMContentLoaded.
    pub fn bind() -> Result<Elements, JsValue> {
        Ok(Elements {
            widget_root: get_el!("connectWithSelect"),
            status: get_el!("walletStatus"),
            chain: get_el!("walletChain"),
            accounts: get_el!("walletAccounts"),
        })
    }
}
