use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Raw `<select>` value standing for "let the wallet pick its own chain".
pub const DEFAULT_CHAIN_SENTINEL: i64 = -1;

/// Largest chain id wallets accept (EIP-2294).
pub const MAX_SAFE_CHAIN_ID: u64 = 4_503_599_627_370_476;

pub fn is_valid_chain_id(chain_id: u64) -> bool {
    (1..=MAX_SAFE_CHAIN_ID).contains(&chain_id)
}

/// Chain the user asked for in the selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ChainSelection {
    /// Whatever chain the wallet is currently on.
    #[default]
    Default,
    Chain(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ChainIdError {
    #[error("invalid chain id `{0}`")]
    Malformed(String),
    #[error("chain id {0} is out of range")]
    OutOfRange(i64),
    #[error("chain id {0} does not fit a select value")]
    TooLarge(u64),
}

impl ChainSelection {
    pub fn from_raw(raw: i64) -> Result<Self, ChainIdError> {
        match raw {
            DEFAULT_CHAIN_SENTINEL => Ok(Self::Default),
            id => match u64::try_from(id) {
                Ok(id) if is_valid_chain_id(id) => Ok(Self::Chain(id)),
                _ => Err(ChainIdError::OutOfRange(id)),
            },
        }
    }

    pub fn as_raw(self) -> Result<i64, ChainIdError> {
        match self {
            Self::Default => Ok(DEFAULT_CHAIN_SENTINEL),
            Self::Chain(id) => i64::try_from(id).map_err(|_| ChainIdError::TooLarge(id)),
        }
    }

    /// Parse a `<select>` option value.
    pub fn parse(raw: &str) -> Result<Self, ChainIdError> {
        let value: i64 = raw
            .trim()
            .parse()
            .map_err(|_| ChainIdError::Malformed(raw.to_owned()))?;
        Self::from_raw(value)
    }

    pub fn chain_id(self) -> Option<u64> {
        match self {
            Self::Default => None,
            Self::Chain(id) => Some(id),
        }
    }
}

impl fmt::Display for ChainSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "{DEFAULT_CHAIN_SENTINEL}"),
            Self::Chain(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

/// EIP-3085 `wallet_addEthereumChain` parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEthereumChainParameter {
    #[serde(serialize_with = "serialize_hex_chain_id", deserialize_with = "deserialize_hex_chain_id")]
    pub chain_id: u64,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub block_explorer_urls: Vec<String>,
}

/// What to hand the connector's `activate` call for a chosen chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivateParams {
    /// Switch only; the wallet is expected to know the chain already.
    ChainId(u64),
    /// Switch, adding the chain to the wallet first if it is unknown.
    AddChain(AddEthereumChainParameter),
}

impl ActivateParams {
    pub fn chain_id(&self) -> u64 {
        match self {
            Self::ChainId(id) => *id,
            Self::AddChain(params) => params.chain_id,
        }
    }
}

pub fn to_hex_chain_id(chain_id: u64) -> String {
    format!("0x{chain_id:x}")
}

pub fn parse_hex_chain_id(raw: &str) -> Result<u64, ChainIdError> {
    let trimmed = raw.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => trimmed.parse::<u64>(),
    };
    parsed.map_err(|_| ChainIdError::Malformed(raw.to_owned()))
}

fn serialize_hex_chain_id<S: Serializer>(chain_id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&to_hex_chain_id(*chain_id))
}

fn deserialize_hex_chain_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_hex_chain_id(&raw).map_err(serde::de::Error::custom)
}
