//! MetaMask (injected EIP-1193) connector.
//!
//! Activation mirrors the wallet's own flow: request accounts, read the
//! chain, then `wallet_switchEthereumChain`, falling back to
//! `wallet_addEthereumChain` when the wallet does not know the chain (4902).

use async_trait::async_trait;
use cs_api_types::{ActivateParams, AddEthereumChainParameter, to_hex_chain_id};
use cs_connect_core::ErrorSink;
use cs_connector::{Connector, ConnectorError, StateUpdate, WalletStore};
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::ethereum::{self, Eip1193Provider};

/// MetaMask is reconnecting; not a real disconnect.
const RECONNECTING: i64 = 1013;

pub struct MetaMaskConnector {
    store: Rc<WalletStore>,
    errors: Rc<dyn ErrorSink>,
    provider: RefCell<Option<Eip1193Provider>>,
    revoke_on_disconnect: bool,
}

impl MetaMaskConnector {
    pub fn new(store: Rc<WalletStore>, errors: Rc<dyn ErrorSink>, revoke_on_disconnect: bool) -> Rc<Self> {
        Rc::new(Self {
            store,
            errors,
            provider: RefCell::new(None),
            revoke_on_disconnect,
        })
    }

    /// Detect the provider on first use and subscribe to its events.
    fn provider(&self) -> Result<Eip1193Provider, ConnectorError> {
        if let Some(provider) = self.provider.borrow().as_ref() {
            return Ok(provider.clone());
        }
        let provider = ethereum::detect().ok_or(ConnectorError::NoProvider)?;
        self.listen(&provider);
        *self.provider.borrow_mut() = Some(provider.clone());
        Ok(provider)
    }

    fn listen(&self, provider: &Eip1193Provider) {
        let store = self.store.clone();
        on_event(provider, "connect", move |info: JsValue| {
            let chain_id = js_sys::Reflect::get(&info, &JsValue::from_str("chainId"))
                .map_err(|e| ethereum::to_connector_error(&e))
                .and_then(|raw| ethereum::parse_chain_id(&raw));
            apply(&store, chain_id.map(|chain_id| StateUpdate {
                chain_id: Some(chain_id),
                accounts: None,
            }));
        });

        let store = self.store.clone();
        let errors = self.errors.clone();
        on_event(provider, "disconnect", move |err: JsValue| {
            if !on_disconnect(&store, &*errors, ethereum::to_connector_error(&err)) {
                gloo_console::debug!("wallet reported 1013, waiting for it to reconnect");
            }
        });

        let store = self.store.clone();
        on_event(provider, "chainChanged", move |raw: JsValue| {
            apply(&store, ethereum::parse_chain_id(&raw).map(|chain_id| StateUpdate {
                chain_id: Some(chain_id),
                accounts: None,
            }));
        });

        let store = self.store.clone();
        on_event(provider, "accountsChanged", move |raw: JsValue| {
            match ethereum::parse_accounts(raw) {
                Ok(accounts) => on_accounts_changed(&store, accounts),
                Err(err) => apply(&store, Err(err)),
            }
        });
    }

    /// Reconnect without prompting if the site is already authorised.
    pub async fn connect_eagerly(&self) -> Result<(), ConnectorError> {
        self.store.start_activation();
        let result = self.try_connect_eagerly().await;
        if result.is_err() {
            // A provider `connect` event may already have touched the store,
            // so a plain cancel is not enough.
            self.store.reset_state();
        }
        result
    }

    async fn try_connect_eagerly(&self) -> Result<(), ConnectorError> {
        let provider = self.provider()?;
        let accounts = provider.accounts("eth_accounts").await?;
        if accounts.is_empty() {
            return Err(ConnectorError::Js("No accounts returned".to_owned()));
        }
        let chain_id = provider.chain_id().await?;
        self.store.update(StateUpdate {
            chain_id: Some(chain_id),
            accounts: Some(accounts),
        })
    }

    async fn try_activate(
        &self,
        provider: &Eip1193Provider,
        params: Option<ActivateParams>,
    ) -> Result<(), ConnectorError> {
        let accounts = provider.accounts("eth_requestAccounts").await?;
        let mut chain_id = provider.chain_id().await?;

        if let Some(desired) = params.as_ref().map(ActivateParams::chain_id) {
            if desired != chain_id {
                self.switch_chain(provider, desired, params.as_ref()).await?;
                chain_id = provider.chain_id().await?;
            }
        }

        self.store.update(StateUpdate {
            chain_id: Some(chain_id),
            accounts: Some(accounts),
        })
    }

    async fn switch_chain(
        &self,
        provider: &Eip1193Provider,
        desired: u64,
        params: Option<&ActivateParams>,
    ) -> Result<(), ConnectorError> {
        let switch_params = json!([{ "chainId": to_hex_chain_id(desired) }]);
        match provider
            .request("wallet_switchEthereumChain", Some(switch_params.clone()))
            .await
        {
            Ok(_) => Ok(()),
            Err(err) => {
                let Some(add) = add_chain_fallback(&err, params) else {
                    return Err(err);
                };
                let add = serde_json::to_value(add).map_err(|e| ConnectorError::Js(e.to_string()))?;
                provider
                    .request("wallet_addEthereumChain", Some(json!([add])))
                    .await?;
                provider
                    .request("wallet_switchEthereumChain", Some(switch_params))
                    .await
                    .map(|_| ())
            }
        }
    }
}

#[async_trait(?Send)]
impl Connector for MetaMaskConnector {
    async fn activate(&self, params: Option<ActivateParams>) -> Result<(), ConnectorError> {
        let provider = self.provider();
        // Already-connected wallets switch chains without flipping to activating.
        let ticket = match &provider {
            Ok(p) if p.is_connected() && self.store.snapshot().is_active() => None,
            _ => Some(self.store.start_activation()),
        };

        let result = match provider {
            Ok(provider) => self.try_activate(&provider, params).await,
            Err(err) => Err(err),
        };

        if let (Err(_), Some(ticket)) = (&result, ticket) {
            self.store.cancel_activation(ticket);
        }
        result
    }

    fn can_deactivate(&self) -> bool {
        self.revoke_on_disconnect
    }

    async fn deactivate(&self) -> Result<(), ConnectorError> {
        let provider = self.provider()?;
        provider
            .request("wallet_revokePermissions", Some(json!([{ "eth_accounts": {} }])))
            .await?;
        self.store.reset_state();
        Ok(())
    }

    async fn reset_state(&self) -> Result<(), ConnectorError> {
        self.store.reset_state();
        Ok(())
    }
}

/// Chain to add when a switch failed because the wallet does not know it.
///
/// Only full add-chain parameters can be offered; a bare chain id cannot.
fn add_chain_fallback<'a>(
    err: &ConnectorError,
    params: Option<&'a ActivateParams>,
) -> Option<&'a AddEthereumChainParameter> {
    if err.code() != Some(ConnectorError::UNRECOGNIZED_CHAIN) {
        return None;
    }
    match params {
        Some(ActivateParams::AddChain(add)) => Some(add),
        _ => None,
    }
}

/// An empty account list means the user locked or disconnected the wallet.
fn on_accounts_changed(store: &WalletStore, accounts: Vec<String>) {
    if accounts.is_empty() {
        store.reset_state();
        return;
    }
    apply(store, Ok(StateUpdate {
        chain_id: None,
        accounts: Some(accounts),
    }));
}

/// Returns `false` when the wallet is only reconnecting and nothing changed.
fn on_disconnect(store: &WalletStore, errors: &dyn ErrorSink, err: ConnectorError) -> bool {
    if err.code() == Some(RECONNECTING) {
        return false;
    }
    store.reset_state();
    errors.set_error(Some(err));
    true
}

fn apply(store: &WalletStore, update: Result<StateUpdate, ConnectorError>) {
    if let Err(err) = update.and_then(|update| store.update(update)) {
        gloo_console::warn!("ignoring provider event:", err.to_string());
    }
}

fn on_event(provider: &Eip1193Provider, event: &str, handler: impl FnMut(JsValue) + 'static) {
    let cb = Closure::wrap(Box::new(handler) as Box<dyn FnMut(JsValue)>);
    provider.on(event, cb.as_ref().unchecked_ref());
    cb.forget();
}
