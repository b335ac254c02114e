//! Chain state as reported by `getblockchaininfo`.

use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;

use crate::operations::types::ChainInfo;
use crate::operations::{
    connected, into_owned, require_elements, Connected, SharedElements, FORMAT, VALIDATE,
};
use crate::pipeline::{PipelineError, PipelineResult, StepGraph, StepInput};
use crate::rpc::RpcError;

const GET_INFO: &str = "getInfo";

struct Context {
    elements: Option<SharedElements>,
}

#[derive(Debug, Deserialize)]
struct BlockchainInfo {
    bestblockhash: String,
    blocks: u64,
    chain: String,
    #[serde(default)]
    difficulty: Option<f64>,
    headers: u64,
    #[serde(default)]
    initialblockdownload: bool,
    mediantime: u64,
    #[serde(default)]
    pruned: bool,
    #[serde(default)]
    size_on_disk: Option<u64>,
    verificationprogress: f64,
    /// A string on older nodes, a list of strings on newer ones.
    #[serde(default)]
    warnings: Value,
}

fn join_warnings(warnings: &Value) -> String {
    match warnings {
        Value::String(warning) => warning.clone(),
        Value::Array(list) => list
            .iter()
            .map(|w| w.as_str().map(str::to_string).unwrap_or_else(|| w.to_string()))
            .collect::<Vec<_>>()
            .join("; "),
        _ => String::new(),
    }
}

async fn validate(input: StepInput<Context>) -> PipelineResult<Connected> {
    require_elements(&input.context().elements)
}

async fn info(input: StepInput<Context>) -> PipelineResult<BlockchainInfo> {
    let remote = PipelineError::remote(GET_INFO, "FailedToGetElementsBlockchainInfo");

    match connected(&input)?.get_blockchain_info().await {
        Ok(result) => serde_json::from_value(result)
            .map_err(|e| remote(RpcError::UnexpectedResponse(e.to_string()))),
        Err(e) => Err(remote(e)),
    }
}

async fn format_result(input: StepInput<Context>) -> PipelineResult<ChainInfo> {
    let info = input.get::<BlockchainInfo>(GET_INFO)?;

    Ok(ChainInfo {
        best_block_hash: info.bestblockhash.clone(),
        blocks: info.blocks,
        chain: info.chain.clone(),
        difficulty: info.difficulty,
        headers: info.headers,
        initial_block_download: info.initialblockdownload,
        median_time: info.mediantime,
        progress: info.verificationprogress,
        pruned: info.pruned,
        size_on_disk: info.size_on_disk,
        verification_progress: info.verificationprogress,
        warnings: join_warnings(&info.warnings),
    })
}

fn graph() -> &'static StepGraph<Context> {
    static GRAPH: OnceLock<StepGraph<Context>> = OnceLock::new();
    GRAPH.get_or_init(|| {
        StepGraph::new("get_chain_info")
            .step(VALIDATE, &[], validate)
            .step(GET_INFO, &[VALIDATE], info)
            .step(FORMAT, &[GET_INFO], format_result)
            .terminal(FORMAT)
    })
}

pub async fn get_chain_info(elements: Option<SharedElements>) -> PipelineResult<ChainInfo> {
    graph()
        .run::<ChainInfo>(Context { elements })
        .await
        .map(into_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::api::mock::MockNode;
    use serde_json::json;
    use std::sync::Arc;

    fn liquid_info() -> Value {
        json!({
            "chain": "liquidv1",
            "blocks": 2_904_118,
            "headers": 2_904_118,
            "bestblockhash": "8f4c0d1c3ad1b5ae",
            "mediantime": 1_718_000_000,
            "verificationprogress": 1.0,
            "initialblockdownload": false,
            "size_on_disk": 51_234_567_890u64,
            "pruned": false,
            "warnings": ""
        })
    }

    #[tokio::test]
    async fn test_field_mapping() {
        let node = Arc::new(MockNode::new().respond("getblockchaininfo", liquid_info()));

        let info = get_chain_info(Some(node)).await.unwrap();

        assert_eq!(info.chain, "liquidv1");
        assert_eq!(info.best_block_hash, "8f4c0d1c3ad1b5ae");
        assert_eq!(info.blocks, 2_904_118);
        assert_eq!(info.median_time, 1_718_000_000);
        assert_eq!(info.progress, 1.0);
        assert_eq!(info.verification_progress, 1.0);
        assert_eq!(info.difficulty, None);
        assert_eq!(info.size_on_disk, Some(51_234_567_890));
        assert_eq!(info.warnings, "");
    }

    #[test]
    fn test_warning_shapes() {
        assert_eq!(join_warnings(&json!("low disk")), "low disk");
        assert_eq!(join_warnings(&json!(["a", "b"])), "a; b");
        assert_eq!(join_warnings(&Value::Null), "");
    }

    #[tokio::test]
    async fn test_node_failure_and_bad_shape() {
        let node = Arc::new(MockNode::new().fail("getblockchaininfo", "Loading block index..."));
        let err = get_chain_info(Some(node)).await.unwrap_err();
        assert_eq!(err.code(), "FailedToGetElementsBlockchainInfo");
        assert_eq!(err.class().status_code(), 503);

        let node = Arc::new(MockNode::new().respond("getblockchaininfo", json!({"chain": 1})));
        let err = get_chain_info(Some(node)).await.unwrap_err();
        assert_eq!(err.step(), Some("getInfo"));
    }

    #[tokio::test]
    async fn test_missing_transport() {
        let err = get_chain_info(None).await.unwrap_err();
        assert_eq!(err.code(), "ExpectedElementsRpcClient");
    }
}
