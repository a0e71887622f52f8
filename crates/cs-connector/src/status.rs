use crate::{ConnectorError, ConnectorState};

/// Connection state machine as seen by the UI.
///
/// Transitions: connect moves `Disconnected` to `Activating`; activation
/// settles into `Active` or `Error`; retry moves `Error` back to
/// `Activating`; disconnect moves `Active` to `Disconnected`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionStatus {
    Disconnected,
    Activating,
    Active { chain_id: u64, accounts: Vec<String> },
    Error(ConnectorError),
}

impl ConnectionStatus {
    /// Error overlays everything else, then active, then activating.
    pub fn derive(state: &ConnectorState, error: Option<&ConnectorError>) -> Self {
        if let Some(error) = error {
            return Self::Error(error.clone());
        }
        match (state.chain_id, &state.accounts) {
            (Some(chain_id), Some(accounts)) if !state.activating => Self::Active {
                chain_id,
                accounts: accounts.clone(),
            },
            _ if state.activating => Self::Activating,
            _ => Self::Disconnected,
        }
    }

    pub fn can_transition_to(&self, next: &ConnectionStatus) -> bool {
        use ConnectionStatus::*;
        matches!(
            (self, next),
            (Disconnected, Activating)
                | (Activating, Active { .. })
                | (Activating, Error(_))
                | (Error(_), Activating)
                | (Active { .. }, Disconnected)
        ) || std::mem::discriminant(self) == std::mem::discriminant(next)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Disconnected => "disconnected",
            Self::Activating => "activating",
            Self::Active { .. } => "active",
            Self::Error(_) => "error",
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn active_state() -> ConnectorState {
        ConnectorState {
            chain_id: Some(137),
            accounts: Some(vec!["0x1234567890123456789012345678901234567890".to_owned()]),
            activating: false,
        }
    }

    #[test]
    fn derive_precedence() {
        let err = ConnectorError::Js("rejected".into());
        assert_eq!(
            ConnectionStatus::derive(&active_state(), Some(&err)),
            ConnectionStatus::Error(err.clone())
        );
        assert!(ConnectionStatus::derive(&active_state(), None).is_active());

        let activating = ConnectorState {
            activating: true,
            ..active_state()
        };
        assert_eq!(ConnectionStatus::derive(&activating, None), ConnectionStatus::Activating);
        assert_eq!(
            ConnectionStatus::derive(&ConnectorState::default(), None),
            ConnectionStatus::Disconnected
        );
    }

    #[test]
    fn modelled_transitions() {
        use ConnectionStatus::*;
        let active = ConnectionStatus::derive(&active_state(), None);
        let error = Error(ConnectorError::NoProvider);

        assert!(Disconnected.can_transition_to(&Activating));
        assert!(Activating.can_transition_to(&active));
        assert!(Activating.can_transition_to(&error));
        assert!(error.can_transition_to(&Activating));
        assert!(active.can_transition_to(&Disconnected));

        assert!(!Disconnected.can_transition_to(&active));
        assert!(!active.can_transition_to(&Activating));
        assert!(!error.can_transition_to(&Disconnected));
    }
}
