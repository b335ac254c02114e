//! Generate a fresh receive address.

use serde::Deserialize;
use std::sync::OnceLock;

use crate::operations::types::CreatedAddress;
use crate::operations::{
    connected, into_owned, non_empty, require_elements, Connected, SharedElements, FORMAT,
    VALIDATE,
};
use crate::pipeline::{PipelineError, PipelineResult, StepGraph, StepInput};
use crate::rpc::RpcError;

pub const DEFAULT_ADDRESS_FORMAT: &str = "bech32";

const CREATE_ADDRESS: &str = "createAddress";
const FAILED: &str = "FailedToCreateElementsAddress";

/// Optional label and address type for the new address.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAddressRequest {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
}

impl CreateAddressRequest {
    fn label(&self) -> &str {
        non_empty(&self.label).unwrap_or("")
    }

    fn format(&self) -> &str {
        non_empty(&self.format).unwrap_or(DEFAULT_ADDRESS_FORMAT)
    }
}

struct Context {
    elements: Option<SharedElements>,
    request: CreateAddressRequest,
}

async fn validate(input: StepInput<Context>) -> PipelineResult<Connected> {
    require_elements(&input.context().elements)
}

async fn create(input: StepInput<Context>) -> PipelineResult<String> {
    let elements = connected(&input)?;
    let request = &input.context().request;

    let address = elements
        .get_new_address(Some(request.label()), Some(request.format()))
        .await
        .map_err(PipelineError::remote(CREATE_ADDRESS, FAILED))?;

    match address.as_str() {
        Some(address) => Ok(address.to_string()),
        None => Err(PipelineError::remote(CREATE_ADDRESS, FAILED)(
            RpcError::UnexpectedResponse(format!("getnewaddress returned {}", address)),
        )),
    }
}

async fn format_result(input: StepInput<Context>) -> PipelineResult<CreatedAddress> {
    let address = input.get::<String>(CREATE_ADDRESS)?;
    Ok(CreatedAddress {
        address: address.to_string(),
        format: input.context().request.format().to_string(),
    })
}

fn graph() -> &'static StepGraph<Context> {
    static GRAPH: OnceLock<StepGraph<Context>> = OnceLock::new();
    GRAPH.get_or_init(|| {
        StepGraph::new("create_address")
            .step(VALIDATE, &[], validate)
            .step(CREATE_ADDRESS, &[VALIDATE], create)
            .step(FORMAT, &[CREATE_ADDRESS], format_result)
            .terminal(FORMAT)
    })
}

/// Ask the node's wallet for a new address.
pub async fn create_address(
    elements: Option<SharedElements>,
    request: CreateAddressRequest,
) -> PipelineResult<CreatedAddress> {
    graph()
        .run::<CreatedAddress>(Context { elements, request })
        .await
        .map(into_owned)
}
