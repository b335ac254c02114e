//! Wallet operations against the Elements node.
//!
//! Each operation is a [`StepGraph`](crate::pipeline::StepGraph) declared once
//! and run per call:
//!
//! | operation | steps |
//! |-----------|-------|
//! | [`create_address`] | validate → createAddress → format |
//! | [`get_balance`] | validate → (getBalance ∥ getWalletInfo) → format |
//! | [`list_assets`] | validate → getAssets → format |
//! | [`send_transaction`] | validate → sendTransaction → getTransaction → format |
//! | [`get_chain_info`] | validate → getInfo → format |

pub mod create_address;
pub mod get_balance;
pub mod get_chain_info;
pub mod list_assets;
pub mod send_transaction;
pub mod types;

use std::sync::Arc;

use crate::pipeline::{PipelineError, PipelineResult, StepInput};
use crate::rpc::ElementsApi;

pub use create_address::{create_address, CreateAddressRequest};
pub use get_balance::{get_balance, BalanceRequest};
pub use get_chain_info::get_chain_info;
pub use list_assets::list_assets;
pub use send_transaction::{send_transaction, SendTransactionRequest};
pub use types::{AssetDescriptor, AssetList, ChainInfo, CreatedAddress, SentTransaction, WalletBalance};

/// Node handle shared by every operation.
pub type SharedElements = Arc<dyn ElementsApi>;

pub(crate) const VALIDATE: &str = "validate";
pub(crate) const FORMAT: &str = "format";

/// Output of a `validate` step: the node handle is known to be present.
#[derive(Clone)]
pub(crate) struct Connected(pub SharedElements);

pub(crate) fn require_elements(elements: &Option<SharedElements>) -> PipelineResult<Connected> {
    elements
        .clone()
        .map(Connected)
        .ok_or(PipelineError::invalid_input("ExpectedElementsRpcClient"))
}

/// Node handle validated by the `validate` step.
pub(crate) fn connected<C>(input: &StepInput<C>) -> PipelineResult<SharedElements> {
    Ok(Arc::clone(&input.get::<Connected>(VALIDATE)?.0))
}

/// Treat `None` and blank strings alike.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}

/// Take the terminal output out of its `Arc`.
pub(crate) fn into_owned<T: Clone>(value: Arc<T>) -> T {
    Arc::try_unwrap(value).unwrap_or_else(|shared| (*shared).clone())
}
