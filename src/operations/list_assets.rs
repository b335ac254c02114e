//! Assets the node knows by label.

use serde_json::{Map, Value};
use std::sync::OnceLock;

use crate::operations::types::{AssetDescriptor, AssetList};
use crate::operations::{
    connected, into_owned, require_elements, Connected, SharedElements, FORMAT, VALIDATE,
};
use crate::pipeline::{PipelineError, PipelineResult, StepGraph, StepInput};
use crate::rpc::{RpcError, BASE_ASSET};

const GET_ASSETS: &str = "getAssets";

/// Decimal places of every Elements asset amount.
pub const ASSET_PRECISION: u8 = 8;

struct Context {
    elements: Option<SharedElements>,
}

fn describe(name: &str, asset_id: &Value) -> AssetDescriptor {
    AssetDescriptor {
        asset_id: asset_id
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| asset_id.to_string()),
        name: name.to_string(),
        ticker: name.to_uppercase(),
        precision: ASSET_PRECISION,
        entity: String::new(),
        is_reissuable: name != BASE_ASSET,
    }
}

async fn validate(input: StepInput<Context>) -> PipelineResult<Connected> {
    require_elements(&input.context().elements)
}

async fn assets(input: StepInput<Context>) -> PipelineResult<Map<String, Value>> {
    let remote = PipelineError::remote(GET_ASSETS, "FailedToGetElementsAssets");

    match connected(&input)?.dump_asset_labels().await {
        Ok(Value::Object(labels)) => Ok(labels),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(other) => Err(remote(RpcError::UnexpectedResponse(format!(
            "dumpassetlabels returned {}",
            other
        )))),
        Err(e) => Err(remote(e)),
    }
}

async fn format_result(input: StepInput<Context>) -> PipelineResult<AssetList> {
    let labels = input.get::<Map<String, Value>>(GET_ASSETS)?;
    Ok(AssetList {
        assets: labels
            .iter()
            .map(|(name, asset_id)| describe(name, asset_id))
            .collect(),
    })
}

fn graph() -> &'static StepGraph<Context> {
    static GRAPH: OnceLock<StepGraph<Context>> = OnceLock::new();
    GRAPH.get_or_init(|| {
        StepGraph::new("list_assets")
            .step(VALIDATE, &[], validate)
            .step(GET_ASSETS, &[VALIDATE], assets)
            .step(FORMAT, &[GET_ASSETS], format_result)
            .terminal(FORMAT)
    })
}

/// One descriptor per labelled asset.
pub async fn list_assets(elements: Option<SharedElements>) -> PipelineResult<AssetList> {
    graph()
        .run::<AssetList>(Context { elements })
        .await
        .map(into_owned)
}
