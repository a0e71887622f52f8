use cs_api_types::ChainSelection;
use cs_chain_registry::ChainRegistry;
use tracing::warn;

pub const DEFAULT_CHAIN_LABEL: &str = "Default Chain";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainOption {
    pub value: ChainSelection,
    pub label: String,
}

/// Stateless chain dropdown.
///
/// A disabled selector has no switch handler: changes are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSelectView {
    pub value: ChainSelection,
    pub options: Vec<ChainOption>,
    pub enabled: bool,
}

impl ChainSelectView {
    pub fn new(
        registry: &ChainRegistry,
        chain_ids: &[u64],
        value: ChainSelection,
        switchable: bool,
        display_default: bool,
    ) -> Self {
        let default = display_default.then(|| ChainOption {
            value: ChainSelection::Default,
            label: DEFAULT_CHAIN_LABEL.to_owned(),
        });
        let options = default
            .into_iter()
            .chain(chain_ids.iter().map(|&id| ChainOption {
                value: ChainSelection::Chain(id),
                label: registry.label(id),
            }))
            .collect();

        Self {
            value,
            options,
            enabled: switchable,
        }
    }

    /// Translate a raw `<select>` value into the chain to switch to.
    pub fn handle_change(&self, raw: &str) -> Option<ChainSelection> {
        if !self.enabled {
            return None;
        }
        match ChainSelection::parse(raw) {
            Ok(selection) => Some(selection),
            Err(err) => {
                warn!(%err, "ignoring chain selector change");
                None
            }
        }
    }

    pub fn selected_label(&self) -> Option<&str> {
        self.options
            .iter()
            .find(|option| option.value == self.value)
            .map(|option| option.label.as_str())
    }
}
