//! Chain selector and connect/disconnect widget, independent of any DOM.
//!
//! [`ConnectWithSelect`] forwards user intent to an injected
//! [`cs_connector::Connector`] and reports activation failures through an
//! [`ErrorSink`] owned by the caller. Rendering layers turn a [`ConnectView`]
//! into markup.

mod chain_select;
mod connect;
mod error_slot;

#[cfg(test)]
mod testing;

pub use chain_select::{ChainOption, ChainSelectView, DEFAULT_CHAIN_LABEL};
pub use connect::{
    ActionOutcome, ButtonAction, ButtonView, ConnectView, ConnectWithSelect, ConnectionProps, RenderBranch,
};
pub use error_slot::{ErrorSink, ErrorSlot};
