//! EIP-1193 injected provider bindings (`window.ethereum`).

use cs_api_types::parse_hex_chain_id;
use cs_connector::ConnectorError;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    #[derive(Debug, Clone)]
    pub type Eip1193Provider;

    #[wasm_bindgen(method, catch, js_name = request)]
    fn request_raw(this: &Eip1193Provider, args: &JsValue) -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(method)]
    pub fn on(this: &Eip1193Provider, event: &str, listener: &js_sys::Function);
}

#[derive(Serialize)]
struct RequestArguments<'a> {
    method: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    params: Option<serde_json::Value>,
}

fn get(target: &JsValue, key: &str) -> Option<JsValue> {
    js_sys::Reflect::get(target, &JsValue::from_str(key))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

/// Locate the injected provider, preferring MetaMask when several wallets
/// share `window.ethereum.providers`.
pub fn detect() -> Option<Eip1193Provider> {
    let window = web_sys::window()?;
    let ethereum = get(&window, "ethereum")?;

    let chosen = match get(&ethereum, "providers").filter(js_sys::Array::is_array) {
        Some(list) => {
            let providers: js_sys::Array = list.unchecked_into();
            providers
                .iter()
                .find(|p| get(p, "isMetaMask").and_then(|v| v.as_bool()).unwrap_or(false))
                .or_else(|| Some(providers.get(0)).filter(|p| !p.is_undefined()))
                .unwrap_or(ethereum)
        }
        None => ethereum,
    };
    Some(chosen.unchecked_into())
}

impl Eip1193Provider {
    pub async fn request(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> Result<JsValue, ConnectorError> {
        let args = RequestArguments { method, params }
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .map_err(|e| ConnectorError::Js(e.to_string()))?;
        let promise = self.request_raw(&args).map_err(|e| to_connector_error(&e))?;
        JsFuture::from(promise).await.map_err(|e| to_connector_error(&e))
    }

    pub async fn accounts(&self, method: &str) -> Result<Vec<String>, ConnectorError> {
        let value = self.request(method, None).await?;
        parse_accounts(value)
    }

    pub async fn chain_id(&self) -> Result<u64, ConnectorError> {
        let value = self.request("eth_chainId", None).await?;
        parse_chain_id(&value)
    }

    /// `provider.isConnected()`, when the wallet implements it.
    pub fn is_connected(&self) -> bool {
        get(self, "isConnected")
            .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
            .and_then(|f| f.call0(self).ok())
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }
}

pub fn parse_accounts(value: JsValue) -> Result<Vec<String>, ConnectorError> {
    serde_wasm_bindgen::from_value(value).map_err(|e| ConnectorError::Js(e.to_string()))
}

pub fn parse_chain_id(value: &JsValue) -> Result<u64, ConnectorError> {
    if let Some(raw) = value.as_string() {
        return parse_hex_chain_id(&raw).map_err(|e| ConnectorError::Js(e.to_string()));
    }
    match value.as_f64() {
        Some(n) if n.fract() == 0.0 && n > 0.0 => Ok(n as u64),
        _ => Err(ConnectorError::Js(format!("unexpected chain id {value:?}"))),
    }
}

/// Map a rejected provider promise to a [`ConnectorError`].
///
/// MetaMask nests the wallet's own code under `data.originalError.code`.
pub fn to_connector_error(err: &JsValue) -> ConnectorError {
    let code = get(err, "data")
        .and_then(|d| get(&d, "originalError"))
        .and_then(|o| get(&o, "code"))
        .or_else(|| get(err, "code"))
        .and_then(|c| c.as_f64());
    let message = get(err, "message")
        .and_then(|m| m.as_string())
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{err:?}"));

    match code {
        Some(code) => ConnectorError::rpc(code as i64, message),
        None => ConnectorError::Js(message),
    }
}
