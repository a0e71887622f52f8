use async_trait::async_trait;
use cs_api_types::ActivateParams;
use cs_chain_registry::{ChainInfo, ChainRegistry};
use cs_connector::{Connector, ConnectorError, StateUpdate, WalletStore};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tokio::sync::oneshot;

pub const ACCOUNT: &str = "0x1234567890123456789012345678901234567890";

pub fn two_chain_registry() -> ChainRegistry {
    let mut registry = ChainRegistry::new();
    registry
        .insert(1, ChainInfo::basic("Mainnet", vec!["https://cloudflare-eth.com".to_owned()]))
        .unwrap();
    registry.insert(
        137,
        ChainInfo::extended(
            "Polygon",
            vec!["https://polygon-rpc.com".to_owned()],
            cs_api_types::NativeCurrency {
                name: "Matic".to_owned(),
                symbol: "MATIC".to_owned(),
                decimals: 18,
            },
            &["https://polygonscan.com"],
        ),
    )
    .unwrap();
    registry
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Activate(Option<ActivateParams>),
    Deactivate,
    Reset,
}

enum Step {
    Ready(Result<(), ConnectorError>),
    Gate(oneshot::Receiver<Result<(), ConnectorError>>),
}

/// Connector double that records calls and replays scripted results.
///
/// Unscripted activations succeed. When backed by a store, activations drive
/// it the way a real injected-wallet connector would.
#[derive(Default)]
pub struct ScriptedConnector {
    calls: RefCell<Vec<Call>>,
    script: RefCell<VecDeque<Step>>,
    deactivate: bool,
    store: Option<Rc<WalletStore>>,
}

impl ScriptedConnector {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn with_deactivate() -> Rc<Self> {
        Rc::new(Self {
            deactivate: true,
            ..Self::default()
        })
    }

    pub fn backed_by(store: Rc<WalletStore>) -> Rc<Self> {
        Rc::new(Self {
            store: Some(store),
            ..Self::default()
        })
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    pub fn push_result(&self, result: Result<(), ConnectorError>) {
        self.script.borrow_mut().push_back(Step::Ready(result));
    }

    pub fn push_gate(&self, gate: oneshot::Receiver<Result<(), ConnectorError>>) {
        self.script.borrow_mut().push_back(Step::Gate(gate));
    }
}

#[async_trait(?Send)]
impl Connector for ScriptedConnector {
    async fn activate(&self, params: Option<ActivateParams>) -> Result<(), ConnectorError> {
        self.calls.borrow_mut().push(Call::Activate(params.clone()));
        let ticket = self.store.as_ref().map(|store| store.start_activation());

        let step = self.script.borrow_mut().pop_front();
        let result = match step {
            None => Ok(()),
            Some(Step::Ready(result)) => result,
            Some(Step::Gate(gate)) => gate
                .await
                .unwrap_or_else(|_| Err(ConnectorError::Js("gate dropped".into()))),
        };

        if let (Some(store), Some(ticket)) = (&self.store, ticket) {
            match &result {
                Ok(()) => store.update(StateUpdate {
                    chain_id: Some(params.map(|p| p.chain_id()).unwrap_or(1)),
                    accounts: Some(vec![ACCOUNT.to_owned()]),
                })?,
                Err(_) => store.cancel_activation(ticket),
            }
        }
        result
    }

    fn can_deactivate(&self) -> bool {
        self.deactivate
    }

    async fn deactivate(&self) -> Result<(), ConnectorError> {
        self.calls.borrow_mut().push(Call::Deactivate);
        Ok(())
    }

    async fn reset_state(&self) -> Result<(), ConnectorError> {
        self.calls.borrow_mut().push(Call::Reset);
        if let Some(store) = &self.store {
            store.reset_state();
        }
        Ok(())
    }
}
