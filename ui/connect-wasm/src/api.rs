//! Static configuration fetched next to the page.

use cs_chain_registry::ChainRegistry;
use gloo_net::http::Request;

use crate::state::WidgetConfig;

/// Fetch a URL and return the body as a plain string.
pub async fn fetch_text(url: &str) -> Result<String, String> {
    let resp = Request::get(url)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;
    if !resp.ok() {
        return Err(format!("{} {}", resp.status(), resp.status_text()));
    }
    resp.text().await.map_err(|e| format!("text error: {e}"))
}

/// Registry override from `chains.json`, or the built-in chains.
///
/// A missing or malformed override is not fatal.
pub async fn load_registry(config: &WidgetConfig) -> ChainRegistry {
    let url = config.chains_url();
    match fetch_text(&url).await {
        Ok(text) => match ChainRegistry::from_json(&text) {
            Ok(registry) if !registry.is_empty() => return registry,
            Ok(_) => gloo_console::warn!(format!("{url} lists no chains, using built-in registry")),
            Err(e) => gloo_console::warn!(format!("{url}: {e}, using built-in registry")),
        },
        Err(e) if config.has_custom_chains_url() => {
            gloo_console::warn!(format!("{url}: {e}, using built-in registry"))
        }
        Err(_) => {} // No default override deployed.
    }
    ChainRegistry::builtin(&config.registry_config())
}
