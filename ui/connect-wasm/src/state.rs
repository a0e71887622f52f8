//! Global application state.
//!
//! Uses `RefCell`-wrapped `thread_local!` storage (WASM is single-threaded).

use cs_chain_registry::{RegistryConfig, non_empty};
use cs_connect_core::{ConnectWithSelect, ConnectionProps, ErrorSlot};
use cs_connector::{ConnectionStatus, WalletStore};
use gloo_storage::{LocalStorage, Storage};
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use wasm_bindgen::prelude::*;

use crate::dom::Elements;
use crate::metamask::MetaMaskConnector;

pub const CONFIG_KEY: &str = "cs_config";
pub const DEFAULT_CHAINS_URL: &str = "config/chains.json";

// ── Configuration ──

/// User settings persisted in `localStorage` under [`CONFIG_KEY`].
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetConfig {
    #[serde(default)]
    pub infura_key: Option<String>,
    #[serde(default)]
    pub alchemy_key: Option<String>,
    #[serde(default)]
    pub revoke_on_disconnect: bool,
    #[serde(default)]
    pub chains_url: Option<String>,
}

impl WidgetConfig {
    pub fn load() -> Self {
        LocalStorage::get(CONFIG_KEY).unwrap_or_default()
    }

    pub fn registry_config(&self) -> RegistryConfig {
        RegistryConfig {
            infura_key: non_empty(self.infura_key.clone()),
            alchemy_key: non_empty(self.alchemy_key.clone()),
        }
    }

    pub fn chains_url(&self) -> String {
        non_empty(self.chains_url.clone()).unwrap_or_else(|| DEFAULT_CHAINS_URL.to_owned())
    }

    /// Whether `chainsUrl` was set rather than left to the default.
    pub fn has_custom_chains_url(&self) -> bool {
        non_empty(self.chains_url.clone()).is_some()
    }
}

// ── App ──

pub type Widget = ConnectWithSelect<MetaMaskConnector, ErrorSlot>;

/// Everything the event handlers need, shared behind one `Rc`.
pub struct App {
    pub els: Elements,
    pub store: Rc<WalletStore>,
    pub errors: Rc<ErrorSlot>,
    pub connector: Rc<MetaMaskConnector>,
    pub widget: Widget,
}

impl App {
    pub fn props(&self) -> ConnectionProps {
        ConnectionProps::from_state(&self.store.snapshot(), self.errors.get())
    }

    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus::derive(&self.store.snapshot(), self.errors.get().as_ref())
    }
}

// ── Thread-local singleton ──

thread_local! {
    static APP: RefCell<Option<Rc<App>>> = const { RefCell::new(None) };
    static RENDER_PENDING: Cell<bool> = const { Cell::new(false) };
    static WIDGET_LISTENERS: RefCell<Vec<Closure<dyn FnMut(web_sys::Event)>>> =
        const { RefCell::new(Vec::new()) };
}

/// Keep the app alive for the lifetime of the page.
pub fn set_app(app: Rc<App>) {
    APP.with(|a| *a.borrow_mut() = Some(app));
}

/// Returns `true` if the caller should schedule a render.
pub fn claim_render() -> bool {
    RENDER_PENDING.with(|p| !p.replace(true))
}

pub fn finish_render() {
    RENDER_PENDING.with(|p| p.set(false));
}

/// Keep a widget event closure alive until the next render.
pub fn hold_listener(cb: Closure<dyn FnMut(web_sys::Event)>) {
    WIDGET_LISTENERS.with(|l| l.borrow_mut().push(cb));
}

/// Drop the closures of the previous render.
pub fn release_listeners() -> Vec<Closure<dyn FnMut(web_sys::Event)>> {
    WIDGET_LISTENERS.with(|l| std::mem::take(&mut *l.borrow_mut()))
}
