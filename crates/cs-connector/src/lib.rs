//! Wallet connector seam.
//!
//! A [`Connector`] mediates activation of an injected wallet. Connectors push
//! what they learn into a shared [`WalletStore`]; UI code reads the store and
//! never talks to the provider directly.

mod status;
mod store;

pub use status::ConnectionStatus;
pub use store::{ActivationTicket, ConnectorState, StateUpdate, SubscriptionId, WalletStore, MAX_SAFE_CHAIN_ID};

use async_trait::async_trait;
use cs_api_types::ActivateParams;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectorError {
    #[error("no injected wallet provider found")]
    NoProvider,
    /// EIP-1193 provider error, surfaced verbatim.
    #[error("{message}")]
    Rpc { code: i64, message: String },
    #[error("Invalid chainId {0}")]
    InvalidChainId(u64),
    #[error("Invalid account {0}")]
    InvalidAccount(String),
    #[error("connector does not support {0}")]
    Unsupported(&'static str),
    #[error("{0}")]
    Js(String),
}

impl ConnectorError {
    pub const USER_REJECTED: i64 = 4001;
    pub const UNRECOGNIZED_CHAIN: i64 = 4902;

    pub fn rpc(code: i64, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
        }
    }

    pub fn code(&self) -> Option<i64> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Short class name for status lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::NoProvider => "NoProviderError",
            Self::Rpc { code, .. } if *code == Self::USER_REJECTED => "UserRejectedRequestError",
            Self::Rpc { .. } => "ProviderRpcError",
            Self::InvalidChainId(_) | Self::InvalidAccount(_) => "ValidationError",
            Self::Unsupported(_) => "UnsupportedError",
            Self::Js(_) => "Error",
        }
    }
}

#[async_trait(?Send)]
pub trait Connector {
    /// Connect, optionally switching to (or adding) a specific chain.
    async fn activate(&self, params: Option<ActivateParams>) -> Result<(), ConnectorError>;

    /// Whether [`Connector::deactivate`] does anything.
    fn can_deactivate(&self) -> bool {
        false
    }

    async fn deactivate(&self) -> Result<(), ConnectorError> {
        Err(ConnectorError::Unsupported("deactivate"))
    }

    /// Forget local connection state without touching the wallet.
    async fn reset_state(&self) -> Result<(), ConnectorError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_display_verbatim() {
        let err = ConnectorError::rpc(ConnectorError::USER_REJECTED, "User rejected the request.");
        assert_eq!(err.to_string(), "User rejected the request.");
        assert_eq!(err.code(), Some(4001));
        assert_eq!(err.name(), "UserRejectedRequestError");
        assert_eq!(ConnectorError::Js("rejected".into()).to_string(), "rejected");
        assert_eq!(ConnectorError::NoProvider.code(), None);
    }
}
