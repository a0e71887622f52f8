//! Markup for the chain selector, the connect button and the status panel.
//!
//! The widget is rebuilt from a fresh `ConnectView` on every change; the
//! previous render's closures are released at the same time.

use cs_connect_core::{ChainSelectView, ConnectView};
use cs_connector::ConnectionStatus;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use web_sys::{HtmlButtonElement, HtmlSelectElement};

use crate::dom;
use crate::events;
use crate::state::{self, App};

/// Queue a render on the next tick, coalescing bursts of updates.
pub fn schedule(app: &Rc<App>) {
    if !state::claim_render() {
        return;
    }
    let app = app.clone();
    wasm_bindgen_futures::spawn_local(async move {
        state::finish_render();
        if let Err(err) = render_all(&app) {
            gloo_console::error!("render failed:", err);
        }
    });
}

pub fn render_all(app: &Rc<App>) -> Result<(), JsValue> {
    render_status(app);
    render_widget(app)
}

fn render_widget(app: &Rc<App>) -> Result<(), JsValue> {
    let view = app.widget.view(&app.props());
    let root = &app.els.widget_root;

    // Old closures go once their elements are detached.
    let stale = state::release_listeners();
    dom::clear(root);
    drop(stale);

    let column = dom::create_element("div")?;
    dom::set_style(&column, "display", "flex");
    dom::set_style(&column, "flex-direction", "column");
    column.set_attribute("data-branch", branch_name(&view))?;

    let select = chain_select(&view.select)?;
    column.append_child(&select)?;

    let spacer = dom::create_element("div")?;
    dom::set_style(&spacer, "margin-bottom", "1rem");
    column.append_child(&spacer)?;

    let button: HtmlButtonElement = dom::create_button(view.button.label(), view.button.disabled)?;
    column.append_child(&button)?;

    root.append_child(&column)?;

    if view.select.enabled {
        events::bind_chain_select(app, &select, view.select.clone())?;
    }
    if !view.button.disabled {
        events::bind_button(app, &button, view.button.action)?;
    }
    Ok(())
}

fn chain_select(view: &ChainSelectView) -> Result<HtmlSelectElement, JsValue> {
    let select = dom::create_select()?;
    for option in &view.options {
        let opt = dom::create_option(
            &option.value.to_string(),
            &option.label,
            option.value == view.value,
        )?;
        select.append_child(&opt)?;
    }
    select.set_value(&view.value.to_string());
    select.set_disabled(!view.enabled);
    Ok(select)
}

fn branch_name(view: &ConnectView) -> &'static str {
    match view.branch {
        cs_connect_core::RenderBranch::Error => "error",
        cs_connect_core::RenderBranch::Active => "active",
        cs_connect_core::RenderBranch::Disconnected => "disconnected",
    }
}

fn render_status(app: &App) {
    let els = &app.els;
    let status = app.status();

    let line = match &status {
        ConnectionStatus::Error(err) => format!("🛑 {}: {}", err.name(), err),
        ConnectionStatus::Activating => "🟡 Connecting".to_owned(),
        ConnectionStatus::Active { .. } => "🟢 Connected".to_owned(),
        ConnectionStatus::Disconnected => "⚪️ Disconnected".to_owned(),
    };
    dom::set_text(&els.status, &line);
    dom::toggle_class(&els.status, "error", matches!(status, ConnectionStatus::Error(_)));

    let snapshot = app.store.snapshot();
    match snapshot.chain_id {
        Some(chain_id) => dom::set_text(
            &els.chain,
            &format!("Chain: {}", app.widget.registry().label(chain_id)),
        ),
        None => dom::set_text(&els.chain, ""),
    }
    match snapshot.accounts {
        Some(accounts) if !accounts.is_empty() => {
            dom::set_text(&els.accounts, &format!("Accounts: {}", accounts.join(", ")))
        }
        Some(_) => dom::set_text(&els.accounts, "Accounts: None"),
        None => dom::set_text(&els.accounts, ""),
    }
}
