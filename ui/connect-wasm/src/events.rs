//! Event binding.
//!
//! Store and error-slot subscriptions schedule renders; widget handlers
//! forward user intent to `ConnectWithSelect`, spawned via
//! `wasm_bindgen_futures::spawn_local`.

use cs_connect_core::{ActionOutcome, ButtonAction, ChainSelectView};
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlButtonElement, HtmlSelectElement};

use crate::render;
use crate::state::{self, App};

/// Helper: attach a handler that lives until the next render.
macro_rules! on_widget_event {
    ($el:expr, $event:expr, $cb:expr) => {{
        let cb = Closure::wrap(Box::new($cb) as Box<dyn FnMut(web_sys::Event)>);
        $el.add_event_listener_with_callback($event, cb.as_ref().unchecked_ref())?;
        state::hold_listener(cb);
    }};
}

/// Re-render whenever connection state or the error slot changes.
pub fn bind_state(app: &Rc<App>) {
    let weak = Rc::downgrade(app);
    app.store.subscribe(move |_| {
        if let Some(app) = weak.upgrade() {
            render::schedule(&app);
        }
    });

    let weak = Rc::downgrade(app);
    app.errors.subscribe(move |_| {
        if let Some(app) = weak.upgrade() {
            render::schedule(&app);
        }
    });
}

pub fn bind_chain_select(app: &Rc<App>, select: &HtmlSelectElement, view: ChainSelectView) -> Result<(), JsValue> {
    let app = app.clone();
    let el = select.clone();
    on_widget_event!(select, "change", move |_: web_sys::Event| {
        let Some(desired) = view.handle_change(&el.value()) else {
            return;
        };
        let app = app.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let current = app.store.snapshot().chain_id;
            let outcome = app.widget.switch_chain(desired, current).await;
            log_outcome("switch chain", &outcome);
        });
    });
    Ok(())
}

pub fn bind_button(app: &Rc<App>, button: &HtmlButtonElement, action: ButtonAction) -> Result<(), JsValue> {
    let app = app.clone();
    on_widget_event!(button, "click", move |_: web_sys::Event| {
        let app = app.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let outcome = match action {
                ButtonAction::Retry => app.widget.retry().await,
                ButtonAction::Disconnect => app.widget.disconnect().await,
                ButtonAction::Connect => app.widget.connect().await,
            };
            log_outcome(action.label(), &outcome);
        });
    });
    Ok(())
}

fn log_outcome(what: &str, outcome: &ActionOutcome) {
    match outcome {
        ActionOutcome::Failed(err) => gloo_console::warn!(format!("{what} failed:"), err.to_string()),
        ActionOutcome::UnknownChain(id) => {
            gloo_console::warn!(format!("{what}: chain {id} is not in the registry"))
        }
        other => gloo_console::debug!(format!("{what}: {other:?}")),
    }
}
