use std::cell::{Cell, RefCell};
use std::rc::Rc;
use tracing::debug;

use crate::{ConnectionStatus, ConnectorError};

pub use cs_api_types::MAX_SAFE_CHAIN_ID;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectorState {
    pub chain_id: Option<u64>,
    pub accounts: Option<Vec<String>>,
    pub activating: bool,
}

impl ConnectorState {
    pub fn is_active(&self) -> bool {
        self.chain_id.is_some() && self.accounts.is_some() && !self.activating
    }

    pub fn is_activating(&self) -> bool {
        self.activating
    }

    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus::derive(self, None)
    }
}

/// Partial update pushed by a connector; `None` fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StateUpdate {
    pub chain_id: Option<u64>,
    pub accounts: Option<Vec<String>>,
}

/// Proof that the holder started the current activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Rc<dyn Fn(&ConnectorState)>;

/// Shared connection state for one connector.
///
/// Single-threaded: the browser runs everything on one event loop.
#[derive(Default)]
pub struct WalletStore {
    state: RefCell<ConnectorState>,
    nullifier: Cell<u64>,
    next_listener: Cell<u64>,
    listeners: RefCell<Vec<(SubscriptionId, Listener)>>,
}

impl WalletStore {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn snapshot(&self) -> ConnectorState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self, listener: impl Fn(&ConnectorState) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.borrow_mut().retain(|(other, _)| *other != id);
    }

    pub fn start_activation(&self) -> ActivationTicket {
        let ticket = ActivationTicket(self.bump_nullifier());
        self.mutate(|state| state.activating = true);
        ticket
    }

    /// Drop the activating flag, unless the store was reset or a newer
    /// activation started since `ticket` was issued.
    pub fn cancel_activation(&self, ticket: ActivationTicket) {
        if ticket.0 != self.nullifier.get() {
            debug!("ignoring stale activation cancel");
            return;
        }
        self.mutate(|state| state.activating = false);
    }

    pub fn update(&self, update: StateUpdate) -> Result<(), ConnectorError> {
        if let Some(chain_id) = update.chain_id {
            validate_chain_id(chain_id)?;
        }
        if let Some(accounts) = &update.accounts {
            for account in accounts {
                validate_account(account)?;
            }
        }

        self.mutate(|state| {
            if update.chain_id.is_some() {
                state.chain_id = update.chain_id;
            }
            if update.accounts.is_some() {
                state.accounts = update.accounts;
            }
            if state.activating && state.chain_id.is_some() && state.accounts.is_some() {
                state.activating = false;
            }
        });
        Ok(())
    }

    pub fn reset_state(&self) {
        self.bump_nullifier();
        self.mutate(|state| *state = ConnectorState::default());
    }

    fn bump_nullifier(&self) -> u64 {
        let next = self.nullifier.get() + 1;
        self.nullifier.set(next);
        next
    }

    fn mutate(&self, f: impl FnOnce(&mut ConnectorState)) {
        let (before, after) = {
            let mut state = self.state.borrow_mut();
            let before = state.clone();
            f(&mut state);
            (before, state.clone())
        };
        if before == after {
            return;
        }

        let (from, to) = (before.status(), after.status());
        if from != to {
            debug!(
                from = from.label(),
                to = to.label(),
                modelled = from.can_transition_to(&to),
                "connection status changed"
            );
        }

        // Listeners may read the store or mutate it again.
        let listeners: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(&after);
        }
    }
}

fn validate_chain_id(chain_id: u64) -> Result<(), ConnectorError> {
    if !cs_api_types::is_valid_chain_id(chain_id) {
        return Err(ConnectorError::InvalidChainId(chain_id));
    }
    Ok(())
}

fn validate_account(account: &str) -> Result<(), ConnectorError> {
    let valid = account
        .strip_prefix("0x")
        .is_some_and(|hex| hex.len() == 40 && hex.chars().all(|c| c.is_ascii_hexdigit()));
    if !valid {
        return Err(ConnectorError::InvalidAccount(account.to_owned()));
    }
    Ok(())
}
