use cs_api_types::{ActivateParams, ChainSelection};
use cs_chain_registry::ChainRegistry;
use cs_connector::{Connector, ConnectorError, ConnectorState};
use std::cell::Cell;
use std::rc::Rc;
use tracing::{debug, warn};

use crate::chain_select::ChainSelectView;
use crate::error_slot::ErrorSink;

/// Connection facts the widget reads but does not own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionProps {
    pub chain_id: Option<u64>,
    pub is_activating: bool,
    pub is_active: bool,
    pub error: Option<ConnectorError>,
}

impl ConnectionProps {
    pub fn from_state(state: &ConnectorState, error: Option<ConnectorError>) -> Self {
        Self {
            chain_id: state.chain_id,
            is_activating: state.is_activating(),
            is_active: state.is_active(),
            error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderBranch {
    Error,
    Active,
    Disconnected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    Retry,
    Disconnect,
    Connect,
}

impl ButtonAction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Retry => "Try Again?",
            Self::Disconnect => "Disconnect",
            Self::Connect => "Connect",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonView {
    pub action: ButtonAction,
    pub disabled: bool,
}

impl ButtonView {
    pub fn label(&self) -> &'static str {
        self.action.label()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectView {
    pub branch: RenderBranch,
    pub select: ChainSelectView,
    pub button: ButtonView,
}

/// What a user action ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Already on the requested chain; nothing was called.
    Unchanged,
    Activated,
    Failed(ConnectorError),
    Deactivated,
    Reset,
    /// Neither a registry chain nor the default sentinel.
    UnknownChain(u64),
}

/// Chain selector plus connect / disconnect / retry button.
pub struct ConnectWithSelect<C: ?Sized, E: ?Sized> {
    connector: Rc<C>,
    errors: Rc<E>,
    registry: Rc<ChainRegistry>,
    chain_ids: Vec<u64>,
    desired: Cell<ChainSelection>,
    attempts: Cell<u64>,
}

impl<C, E> ConnectWithSelect<C, E>
where
    C: Connector + ?Sized,
    E: ErrorSink + ?Sized,
{
    pub fn new(connector: Rc<C>, registry: Rc<ChainRegistry>, errors: Rc<E>) -> Self {
        let chain_ids = registry.chain_ids();
        Self {
            connector,
            errors,
            registry,
            chain_ids,
            desired: Cell::new(ChainSelection::Default),
            attempts: Cell::new(0),
        }
    }

    pub fn chain_ids(&self) -> &[u64] {
        &self.chain_ids
    }

    pub fn desired_chain(&self) -> ChainSelection {
        self.desired.get()
    }

    pub fn registry(&self) -> &ChainRegistry {
        &self.registry
    }

    /// Selector change. `current_chain` is the chain the wallet is on now.
    pub async fn switch_chain(&self, desired: ChainSelection, current_chain: Option<u64>) -> ActionOutcome {
        if let ChainSelection::Chain(id) = desired {
            if !self.registry.contains(id) {
                warn!(chain_id = id, "ignoring selection outside the chain registry");
                return ActionOutcome::UnknownChain(id);
            }
        }

        self.desired.set(desired);

        let already_there = match desired {
            ChainSelection::Chain(id) => current_chain == Some(id),
            ChainSelection::Default => current_chain.is_some(),
        };
        if already_there {
            self.errors.set_error(None);
            return ActionOutcome::Unchanged;
        }

        self.activate(desired).await
    }

    /// "Try Again?" from the error branch; always activates.
    pub async fn retry(&self) -> ActionOutcome {
        self.errors.set_error(None);
        self.activate(self.desired.get()).await
    }

    pub async fn connect(&self) -> ActionOutcome {
        self.activate(self.desired.get()).await
    }

    pub async fn disconnect(&self) -> ActionOutcome {
        let (result, outcome) = if self.connector.can_deactivate() {
            (self.connector.deactivate().await, ActionOutcome::Deactivated)
        } else {
            (self.connector.reset_state().await, ActionOutcome::Reset)
        };
        match result {
            Ok(()) => outcome,
            Err(err) => {
                warn!(%err, "disconnect failed");
                ActionOutcome::Failed(err)
            }
        }
    }

    pub fn view(&self, props: &ConnectionProps) -> ConnectView {
        let desired = self.desired.get();
        let select = |value: ChainSelection, switchable: bool| {
            ChainSelectView::new(&self.registry, &self.chain_ids, value, switchable, true)
        };

        if props.error.is_some() {
            ConnectView {
                branch: RenderBranch::Error,
                select: select(desired, true),
                button: ButtonView {
                    action: ButtonAction::Retry,
                    disabled: false,
                },
            }
        } else if props.is_active {
            let shown = match (desired, props.chain_id) {
                (ChainSelection::Default, _) | (_, None) => desired,
                (_, Some(chain_id)) => ChainSelection::Chain(chain_id),
            };
            ConnectView {
                branch: RenderBranch::Active,
                select: select(shown, true),
                button: ButtonView {
                    action: ButtonAction::Disconnect,
                    disabled: false,
                },
            }
        } else {
            ConnectView {
                branch: RenderBranch::Disconnected,
                select: select(desired, !props.is_activating),
                button: ButtonView {
                    action: ButtonAction::Connect,
                    disabled: props.is_activating,
                },
            }
        }
    }

    fn activation_params(&self, desired: ChainSelection) -> Option<ActivateParams> {
        desired
            .chain_id()
            .map(|chain_id| self.registry.add_chain_parameters(chain_id))
    }

    async fn activate(&self, desired: ChainSelection) -> ActionOutcome {
        let attempt = self.attempts.get() + 1;
        self.attempts.set(attempt);
        debug!(attempt, chain = %desired, "activating connector");

        let result = self.connector.activate(self.activation_params(desired)).await;

        let latest = self.attempts.get();
        if latest != attempt {
            warn!(attempt, latest, "activation settled after a newer attempt");
        }

        match result {
            Ok(()) => {
                self.errors.set_error(None);
                ActionOutcome::Activated
            }
            Err(err) => {
                debug!(attempt, %err, "activation failed");
                self.errors.set_error(Some(err.clone()));
                ActionOutcome::Failed(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, ScriptedConnector, two_chain_registry};
    use crate::{ErrorSlot, DEFAULT_CHAIN_LABEL};
    use cs_connector::WalletStore;

    fn widget(
        connector: &Rc<ScriptedConnector>,
        errors: &Rc<ErrorSlot>,
    ) -> ConnectWithSelect<ScriptedConnector, ErrorSlot> {
        ConnectWithSelect::new(connector.clone(), Rc::new(two_chain_registry()), errors.clone())
    }

    fn props(store: &WalletStore, errors: &ErrorSlot) -> ConnectionProps {
        ConnectionProps::from_state(&store.snapshot(), errors.get())
    }

    #[tokio::test]
    async fn reselecting_the_active_chain_only_clears_the_error() -> anyhow::Result<()> {
        for chain_id in two_chain_registry().chain_ids() {
            let connector = ScriptedConnector::new();
            let errors = ErrorSlot::new();
            errors.set_error(Some(ConnectorError::Js("stale".into())));
            let widget = widget(&connector, &errors);

            let outcome = widget.switch_chain(ChainSelection::Chain(chain_id), Some(chain_id)).await;

            assert_eq!(outcome, ActionOutcome::Unchanged);
            assert_eq!(errors.get(), None);
            assert!(connector.calls().is_empty());
            assert_eq!(widget.desired_chain(), ChainSelection::Chain(chain_id));
        }
        Ok(())
    }

    #[tokio::test]
    async fn default_while_connected_only_clears_the_error() {
        let connector = ScriptedConnector::new();
        let errors = ErrorSlot::new();
        errors.set_error(Some(ConnectorError::NoProvider));
        let widget = widget(&connector, &errors);

        let outcome = widget.switch_chain(ChainSelection::Default, Some(137)).await;

        assert_eq!(outcome, ActionOutcome::Unchanged);
        assert_eq!(errors.get(), None);
        assert!(connector.calls().is_empty());
    }

    #[tokio::test]
    async fn switching_activates_once_with_chain_params() {
        let registry = two_chain_registry();
        let connector = ScriptedConnector::new();
        let errors = ErrorSlot::new();
        let widget = widget(&connector, &errors);

        let outcome = widget.switch_chain(ChainSelection::Chain(137), Some(1)).await;

        assert_eq!(outcome, ActionOutcome::Activated);
        assert_eq!(
            connector.calls(),
            vec![Call::Activate(Some(registry.add_chain_parameters(137)))]
        );
    }

    #[tokio::test]
    async fn default_while_disconnected_activates_without_params() {
        let connector = ScriptedConnector::new();
        let errors = ErrorSlot::new();
        let widget = widget(&connector, &errors);

        widget.switch_chain(ChainSelection::Default, None).await;

        assert_eq!(connector.calls(), vec![Call::Activate(None)]);
    }

    #[tokio::test]
    async fn success_clears_and_failure_stores_the_error() {
        let connector = ScriptedConnector::new();
        let errors = ErrorSlot::new();
        let widget = widget(&connector, &errors);
        let rejection = ConnectorError::rpc(ConnectorError::USER_REJECTED, "User rejected the request.");

        connector.push_result(Err(rejection.clone()));
        assert_eq!(
            widget.switch_chain(ChainSelection::Chain(1), None).await,
            ActionOutcome::Failed(rejection.clone())
        );
        assert_eq!(errors.get(), Some(rejection));

        connector.push_result(Ok(()));
        assert_eq!(widget.connect().await, ActionOutcome::Activated);
        assert_eq!(errors.get(), None);
    }

    #[tokio::test]
    async fn retry_clears_first_and_always_activates() {
        let connector = ScriptedConnector::new();
        let errors = ErrorSlot::new();
        let widget = widget(&connector, &errors);
        let seen = Rc::new(std::cell::RefCell::new(Vec::new()));
        let sink = seen.clone();
        errors.subscribe(move |err| sink.borrow_mut().push(err.cloned()));

        errors.set_error(Some(ConnectorError::NoProvider));
        connector.push_result(Err(ConnectorError::NoProvider));
        widget.retry().await;
        widget.retry().await;

        assert_eq!(connector.calls(), vec![Call::Activate(None), Call::Activate(None)]);
        assert_eq!(
            *seen.borrow(),
            vec![Some(ConnectorError::NoProvider), None, Some(ConnectorError::NoProvider), None]
        );
    }

    #[tokio::test]
    async fn selections_outside_the_registry_are_ignored() {
        let connector = ScriptedConnector::new();
        let errors = ErrorSlot::new();
        let widget = widget(&connector, &errors);

        let outcome = widget.switch_chain(ChainSelection::Chain(31337), None).await;

        assert_eq!(outcome, ActionOutcome::UnknownChain(31337));
        assert_eq!(widget.desired_chain(), ChainSelection::Default);
        assert!(connector.calls().is_empty());
    }

    #[tokio::test]
    async fn disconnect_prefers_deactivate() {
        let errors = ErrorSlot::new();

        let with_teardown = ScriptedConnector::with_deactivate();
        assert_eq!(widget(&with_teardown, &errors).disconnect().await, ActionOutcome::Deactivated);
        assert_eq!(with_teardown.calls(), vec![Call::Deactivate]);

        let without = ScriptedConnector::new();
        assert_eq!(widget(&without, &errors).disconnect().await, ActionOutcome::Reset);
        assert_eq!(without.calls(), vec![Call::Reset]);
    }

    #[test]
    fn branch_follows_error_then_active() {
        let connector = ScriptedConnector::new();
        let errors = ErrorSlot::new();
        let widget = widget(&connector, &errors);

        for (error, is_active, expected) in [
            (true, true, RenderBranch::Error),
            (true, false, RenderBranch::Error),
            (false, true, RenderBranch::Active),
            (false, false, RenderBranch::Disconnected),
        ] {
            let props = ConnectionProps {
                chain_id: is_active.then_some(1),
                is_activating: false,
                is_active,
                error: error.then(|| ConnectorError::NoProvider),
            };
            let view = widget.view(&props);
            assert_eq!(view.branch, expected);
            let action = match expected {
                RenderBranch::Error => ButtonAction::Retry,
                RenderBranch::Active => ButtonAction::Disconnect,
                RenderBranch::Disconnected => ButtonAction::Connect,
            };
            assert_eq!(view.button.action, action);
        }
    }

    #[test]
    fn connect_is_unavailable_while_activating() {
        let connector = ScriptedConnector::new();
        let errors = ErrorSlot::new();
        let widget = widget(&connector, &errors);

        let view = widget.view(&ConnectionProps {
            is_activating: true,
            ..ConnectionProps::default()
        });
        assert_eq!(view.branch, RenderBranch::Disconnected);
        assert!(view.button.disabled);
        assert!(!view.select.enabled);

        let idle = widget.view(&ConnectionProps::default());
        assert!(!idle.button.disabled);
        assert!(idle.select.enabled);
        assert_eq!(idle.select.selected_label(), Some(DEFAULT_CHAIN_LABEL));
    }

    #[tokio::test]
    async fn active_selector_shows_default_until_a_chain_is_picked() {
        let connector = ScriptedConnector::new();
        let errors = ErrorSlot::new();
        let widget = widget(&connector, &errors);
        let active_on_137 = ConnectionProps {
            chain_id: Some(137),
            is_active: true,
            ..ConnectionProps::default()
        };

        assert_eq!(widget.view(&active_on_137).select.value, ChainSelection::Default);

        widget.switch_chain(ChainSelection::Chain(1), Some(137)).await;
        // The wallet has not moved yet; the selector tracks the real chain.
        assert_eq!(widget.view(&active_on_137).select.value, ChainSelection::Chain(137));
    }

    #[tokio::test]
    async fn rejected_polygon_switch_shows_retry() {
        let registry = two_chain_registry();
        let store = WalletStore::new();
        let connector = ScriptedConnector::backed_by(store.clone());
        let errors = ErrorSlot::new();
        let widget = widget(&connector, &errors);

        connector.push_result(Err(ConnectorError::Js("rejected".into())));
        widget
            .switch_chain(ChainSelection::Chain(137), props(&store, &errors).chain_id)
            .await;

        assert_eq!(
            connector.calls(),
            vec![Call::Activate(Some(registry.add_chain_parameters(137)))]
        );
        let view = widget.view(&props(&store, &errors));
        assert_eq!(view.branch, RenderBranch::Error);
        assert_eq!(view.button.label(), "Try Again?");
        assert_eq!(view.select.value, ChainSelection::Chain(137));
        assert_eq!(errors.get(), Some(ConnectorError::Js("rejected".into())));
    }

    #[tokio::test]
    async fn accepted_polygon_switch_shows_disconnect() {
        let store = WalletStore::new();
        let connector = ScriptedConnector::backed_by(store.clone());
        let errors = ErrorSlot::new();
        let widget = widget(&connector, &errors);

        connector.push_result(Ok(()));
        widget
            .switch_chain(ChainSelection::Chain(137), props(&store, &errors).chain_id)
            .await;

        let props = props(&store, &errors);
        assert!(props.is_active);
        let view = widget.view(&props);
        assert_eq!(view.branch, RenderBranch::Active);
        assert_eq!(view.button.label(), "Disconnect");
        assert_eq!(view.select.value, ChainSelection::Chain(137));
        assert_eq!(view.select.selected_label(), Some("Polygon"));
    }

    #[tokio::test]
    async fn last_settled_activation_owns_the_error() {
        use tokio::sync::oneshot;

        let connector = ScriptedConnector::new();
        let errors = ErrorSlot::new();
        let widget = widget(&connector, &errors);

        let (first_tx, first_rx) = oneshot::channel();
        let (second_tx, second_rx) = oneshot::channel();
        connector.push_gate(first_rx);
        connector.push_gate(second_rx);

        let driver = async move {
            tokio::task::yield_now().await;
            let _ = second_tx.send(Ok(()));
            tokio::task::yield_now().await;
            tokio::task::yield_now().await;
            let _ = first_tx.send(Err(ConnectorError::Js("late".into())));
        };

        let (first, second, ()) = tokio::join!(
            widget.switch_chain(ChainSelection::Chain(137), None),
            widget.switch_chain(ChainSelection::Chain(1), None),
            driver,
        );

        assert_eq!(second, ActionOutcome::Activated);
        assert_eq!(first, ActionOutcome::Failed(ConnectorError::Js("late".into())));
        assert_eq!(errors.get(), Some(ConnectorError::Js("late".into())));
        assert_eq!(widget.desired_chain(), ChainSelection::Chain(1));
    }
}
