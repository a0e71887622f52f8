//! ChainSwitch WASM frontend
//!
//! Chain selector and connect/disconnect button for an injected wallet,
//! rendered with plain `web-sys` DOM calls. Widget logic lives in
//! `cs-connect-core`; this crate wires it to the page and to `window.ethereum`.

pub mod api;
pub mod dom;
pub mod ethereum;
pub mod events;
pub mod metamask;
pub mod render;
pub mod state;

use cs_connect_core::{ConnectWithSelect, ErrorSlot};
use cs_connector::WalletStore;
use std::rc::Rc;
use wasm_bindgen::prelude::*;

use metamask::MetaMaskConnector;
use state::{App, WidgetConfig};

/// WASM entry point – called automatically when the module is instantiated.
#[wasm_bindgen(start)]
pub async fn start() -> Result<(), JsValue> {
    // Improve panic messages in the browser console
    console_error_panic_hook::set_once();

    init().await
}

async fn init() -> Result<(), JsValue> {
    let els = dom::Elements::bind()?;
    let config = WidgetConfig::load();
    let registry = Rc::new(api::load_registry(&config).await);

    let store = WalletStore::new();
    let errors = ErrorSlot::new();
    let connector = MetaMaskConnector::new(store.clone(), errors.clone(), config.revoke_on_disconnect);
    let widget = ConnectWithSelect::new(connector.clone(), registry, errors.clone());

    let app = Rc::new(App {
        els,
        store,
        errors,
        connector,
        widget,
    });
    state::set_app(app.clone());

    events::bind_state(&app);
    render::render_all(&app)?;

    if let Err(err) = app.connector.connect_eagerly().await {
        gloo_console::debug!("could not connect eagerly:", err.to_string());
    }

    Ok(())
}
