use cs_api_types::{ActivateParams, AddEthereumChainParameter, MAX_SAFE_CHAIN_ID, NativeCurrency, is_valid_chain_id};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

pub const MAINNET: u64 = 1;
pub const GOERLI: u64 = 5;
pub const OPTIMISM: u64 = 10;
pub const OPTIMISM_GOERLI: u64 = 420;
pub const POLYGON: u64 = 137;
pub const POLYGON_MUMBAI: u64 = 80001;
pub const ARBITRUM_ONE: u64 = 42161;
pub const ARBITRUM_GOERLI: u64 = 421613;
pub const CELO: u64 = 42220;
pub const CELO_ALFAJORES: u64 = 44787;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("chain id 0 is not a valid registry key")]
    ZeroChainId,
    #[error("chain id {0} is above the maximum of {MAX_SAFE_CHAIN_ID}")]
    ChainIdTooLarge(u64),
    #[error("chain {0} has no name")]
    MissingName(u64),
}

/// Static description of a chain the widget can offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainInfo {
    pub name: String,
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_currency: Option<NativeCurrency>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block_explorer_urls: Vec<String>,
}

impl ChainInfo {
    pub fn basic(name: &str, urls: Vec<String>) -> Self {
        Self {
            name: name.to_owned(),
            urls,
            native_currency: None,
            block_explorer_urls: Vec::new(),
        }
    }

    pub fn extended(
        name: &str,
        urls: Vec<String>,
        native_currency: NativeCurrency,
        block_explorer_urls: &[&str],
    ) -> Self {
        Self {
            name: name.to_owned(),
            urls,
            native_currency: Some(native_currency),
            block_explorer_urls: block_explorer_urls.iter().map(|u| (*u).to_owned()).collect(),
        }
    }
}

/// API keys for hosted RPC endpoints.
///
/// Keyed endpoints are left out of the registry when their key is unset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryConfig {
    pub infura_key: Option<String>,
    pub alchemy_key: Option<String>,
}

impl RegistryConfig {
    /// Reads `INFURA_KEY` and `ALCHEMY_KEY`.
    pub fn from_env() -> Self {
        Self {
            infura_key: non_empty(std::env::var("INFURA_KEY").ok()),
            alchemy_key: non_empty(std::env::var("ALCHEMY_KEY").ok()),
        }
    }

    fn infura(&self, network: &str) -> Option<String> {
        self.infura_key
            .as_deref()
            .map(|key| format!("https://{network}.infura.io/v3/{key}"))
    }

    fn alchemy(&self, network: &str) -> Option<String> {
        self.alchemy_key
            .as_deref()
            .map(|key| format!("https://{network}.alchemyapi.io/v2/{key}"))
    }
}

pub fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

fn endpoints(urls: impl IntoIterator<Item = Option<String>>) -> Vec<String> {
    urls.into_iter().flatten().collect()
}

fn currency(name: &str, symbol: &str) -> NativeCurrency {
    NativeCurrency {
        name: name.to_owned(),
        symbol: symbol.to_owned(),
        decimals: 18,
    }
}

/// Registry keys must be chain ids a wallet accepts, so a key can never
/// collide with the `-1` default selection.
fn validate(chain_id: u64, info: &ChainInfo) -> Result<(), RegistryError> {
    if chain_id == 0 {
        return Err(RegistryError::ZeroChainId);
    }
    if !is_valid_chain_id(chain_id) {
        return Err(RegistryError::ChainIdTooLarge(chain_id));
    }
    if info.name.trim().is_empty() {
        return Err(RegistryError::MissingName(chain_id));
    }
    Ok(())
}

/// Known chains keyed by chain id, iterated in ascending id order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainRegistry {
    chains: BTreeMap<u64, ChainInfo>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builtin(config: &RegistryConfig) -> Self {
        let public = |url: &str| Some(url.to_owned());
        let eth = || currency("Ether", "ETH");

        let mut registry = Self::new();
        registry.put(
            MAINNET,
            ChainInfo::basic(
                "Mainnet",
                endpoints([
                    config.infura("mainnet"),
                    config.alchemy("eth-mainnet"),
                    public("https://cloudflare-eth.com"),
                ]),
            ),
        );
        registry.put(
            GOERLI,
            ChainInfo::basic("Görli", endpoints([config.infura("goerli")])),
        );
        registry.put(
            OPTIMISM,
            ChainInfo::extended(
                "Optimism",
                endpoints([
                    config.infura("optimism-mainnet"),
                    public("https://mainnet.optimism.io"),
                ]),
                eth(),
                &["https://optimistic.etherscan.io"],
            ),
        );
        registry.put(
            OPTIMISM_GOERLI,
            ChainInfo::extended(
                "Optimism Goerli",
                endpoints([
                    config.infura("optimism-goerli"),
                    public("https://goerli.optimism.io"),
                ]),
                eth(),
                &["https://goerli-explorer.optimism.io"],
            ),
        );
        registry.put(
            ARBITRUM_ONE,
            ChainInfo::extended(
                "Arbitrum One",
                endpoints([
                    config.infura("arbitrum-mainnet"),
                    public("https://arb1.arbitrum.io/rpc"),
                ]),
                eth(),
                &["https://arbiscan.io"],
            ),
        );
        registry.put(
            ARBITRUM_GOERLI,
            ChainInfo::extended(
                "Arbitrum Goerli",
                endpoints([
                    config.infura("arbitrum-goerli"),
                    public("https://goerli-rollup.arbitrum.io/rpc"),
                ]),
                eth(),
                &["https://testnet.arbiscan.io"],
            ),
        );
        registry.put(
            POLYGON,
            ChainInfo::extended(
                "Polygon Mainnet",
                endpoints([
                    config.infura("polygon-mainnet"),
                    public("https://polygon-rpc.com"),
                ]),
                currency("Matic", "MATIC"),
                &["https://polygonscan.com"],
            ),
        );
        registry.put(
            POLYGON_MUMBAI,
            ChainInfo::extended(
                "Polygon Mumbai",
                endpoints([config.infura("polygon-mumbai")]),
                currency("Matic", "MATIC"),
                &["https://mumbai.polygonscan.com"],
            ),
        );
        registry.put(
            CELO,
            ChainInfo::extended(
                "Celo",
                endpoints([public("https://forno.celo.org")]),
                currency("Celo", "CELO"),
                &["https://explorer.celo.org"],
            ),
        );
        registry.put(
            CELO_ALFAJORES,
            ChainInfo::extended(
                "Celo Alfajores",
                endpoints([public("https://alfajores-forno.celo-testnet.org")]),
                currency("Celo", "CELO"),
                &["https://alfajores-blockscout.celo-testnet.org"],
            ),
        );
        registry
    }

    /// Load a registry from a JSON object keyed by decimal chain id.
    pub fn from_json(raw: &str) -> Result<Self, RegistryError> {
        let chains: BTreeMap<u64, ChainInfo> = serde_json::from_str(raw)?;
        for (id, info) in &chains {
            validate(*id, info)?;
        }
        debug!(chains = chains.len(), "loaded chain registry from json");
        Ok(Self { chains })
    }

    pub fn insert(&mut self, chain_id: u64, info: ChainInfo) -> Result<(), RegistryError> {
        validate(chain_id, &info)?;
        self.put(chain_id, info);
        Ok(())
    }

    fn put(&mut self, chain_id: u64, info: ChainInfo) {
        self.chains.insert(chain_id, info);
    }

    pub fn get(&self, chain_id: u64) -> Option<&ChainInfo> {
        self.chains.get(&chain_id)
    }

    pub fn contains(&self, chain_id: u64) -> bool {
        self.chains.contains_key(&chain_id)
    }

    pub fn name(&self, chain_id: u64) -> Option<&str> {
        self.get(chain_id).map(|info| info.name.as_str())
    }

    /// Display label for a chain, falling back to the numeric id.
    pub fn label(&self, chain_id: u64) -> String {
        self.name(chain_id)
            .map(str::to_owned)
            .unwrap_or_else(|| chain_id.to_string())
    }

    pub fn chain_ids(&self) -> Vec<u64> {
        self.chains.keys().copied().collect()
    }

    pub fn urls(&self, chain_id: u64) -> Vec<String> {
        self.get(chain_id)
            .map(|info| info.urls.clone())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }

    /// Parameters for activating `chain_id`.
    ///
    /// Chains carrying currency metadata and at least one RPC endpoint can be
    /// added to the wallet; anything else is a plain switch request.
    pub fn add_chain_parameters(&self, chain_id: u64) -> ActivateParams {
        let Some(info) = self.get(chain_id) else {
            return ActivateParams::ChainId(chain_id);
        };
        match &info.native_currency {
            Some(native_currency) if !info.urls.is_empty() => {
                ActivateParams::AddChain(AddEthereumChainParameter {
                    chain_id,
                    chain_name: info.name.clone(),
                    native_currency: native_currency.clone(),
                    rpc_urls: info.urls.clone(),
                    block_explorer_urls: info.block_explorer_urls.clone(),
                })
            }
            _ => ActivateParams::ChainId(chain_id),
        }
    }
}
