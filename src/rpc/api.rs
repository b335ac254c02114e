//! Catalog of named node calls.
//!
//! Every wrapper is a thin shim over [`ElementsApi::call`] that fixes the
//! positional parameter order and the defaults the node expects. Only
//! `call` has to be implemented; the rest come for free.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::rpc::types::{
    EstimateMode, RpcResult, SendManyArgs, SendToAddressArgs, BASE_ASSET,
};

/// A handle able to issue JSON-RPC calls against an Elements node.
#[async_trait]
pub trait ElementsApi: Send + Sync {
    /// Issue `method` with positional `params` and return the decoded `result`.
    async fn call(&self, method: &str, params: Vec<Value>) -> RpcResult<Value>;

    // Chain and node state

    async fn get_blockchain_info(&self) -> RpcResult<Value> {
        self.call("getblockchaininfo", vec![]).await
    }

    async fn get_network_info(&self) -> RpcResult<Value> {
        self.call("getnetworkinfo", vec![]).await
    }

    async fn get_wallet_info(&self) -> RpcResult<Value> {
        self.call("getwalletinfo", vec![]).await
    }

    /// `verbosity` defaults to 1.
    async fn get_block(&self, hash: &str, verbosity: Option<u8>) -> RpcResult<Value> {
        self.call("getblock", vec![json!(hash), json!(verbosity.unwrap_or(1))])
            .await
    }

    async fn get_block_hash(&self, height: u64) -> RpcResult<Value> {
        self.call("getblockhash", vec![json!(height)]).await
    }

    async fn get_transaction(&self, txid: &str, include_watchonly: bool) -> RpcResult<Value> {
        self.call("gettransaction", vec![json!(txid), json!(include_watchonly)])
            .await
    }

    async fn get_raw_transaction(&self, txid: &str, verbose: bool) -> RpcResult<Value> {
        self.call("getrawtransaction", vec![json!(txid), json!(verbose)])
            .await
    }

    // Wallet

    /// All-asset balance mapping; includes unconfirmed (minconf 0) and watch-only.
    async fn get_balance(&self) -> RpcResult<Value> {
        self.call("getbalance", vec![json!("*"), json!(0), json!(true)])
            .await
    }

    /// `label` defaults to `""`, `address_type` to `"bech32"`.
    async fn get_new_address(
        &self,
        label: Option<&str>,
        address_type: Option<&str>,
    ) -> RpcResult<Value> {
        self.call(
            "getnewaddress",
            vec![
                json!(label.unwrap_or("")),
                json!(address_type.unwrap_or("bech32")),
            ],
        )
        .await
    }

    /// `minconf` defaults to 1 and `maxconf` to 9999999.
    async fn list_unspent(
        &self,
        minconf: Option<u32>,
        maxconf: Option<u32>,
        addresses: Vec<String>,
    ) -> RpcResult<Value> {
        self.call(
            "listunspent",
            vec![
                json!(minconf.unwrap_or(1)),
                json!(maxconf.unwrap_or(9_999_999)),
                json!(addresses),
            ],
        )
        .await
    }

    // Assets

    /// Label → asset id mapping of the assets the node knows by name.
    async fn dump_asset_labels(&self) -> RpcResult<Value> {
        self.call("dumpassetlabels", vec![]).await
    }

    async fn get_asset_info(&self, asset: &str) -> RpcResult<Value> {
        self.call("getassetinfo", vec![json!(asset)]).await
    }

    async fn issue_asset(
        &self,
        asset_amount: f64,
        token_amount: f64,
        blind: bool,
    ) -> RpcResult<Value> {
        self.call(
            "issueasset",
            vec![json!(asset_amount), json!(token_amount), json!(blind)],
        )
        .await
    }

    async fn reissue_asset(&self, asset: &str, asset_amount: f64) -> RpcResult<Value> {
        self.call("reissueasset", vec![json!(asset), json!(asset_amount)])
            .await
    }

    // Confidential transactions

    /// Input blinders, assets and asset blinders are left empty for the wallet to fill.
    async fn blind_raw_transaction(&self, raw_tx: &str) -> RpcResult<Value> {
        self.call(
            "blindrawtransaction",
            vec![json!(raw_tx), json!([]), json!([]), json!([])],
        )
        .await
    }

    async fn unblind_raw_transaction(&self, raw_tx: &str) -> RpcResult<Value> {
        self.call("unblindrawtransaction", vec![json!(raw_tx)]).await
    }

    // Pegs

    async fn create_raw_pegin(
        &self,
        bitcoin_tx: &str,
        txout_proof: &str,
        claim_script: &str,
    ) -> RpcResult<Value> {
        self.call(
            "createrawpegin",
            vec![json!(bitcoin_tx), json!(txout_proof), json!(claim_script)],
        )
        .await
    }

    /// `asset` defaults to the base asset.
    async fn create_raw_pegout(
        &self,
        address: &str,
        amount: f64,
        asset: Option<&str>,
    ) -> RpcResult<Value> {
        self.call(
            "createrawpegout",
            vec![json!(address), json!(amount), json!(asset.unwrap_or(BASE_ASSET))],
        )
        .await
    }

    // Sending

    async fn send_to_address(&self, args: SendToAddressArgs) -> RpcResult<Value> {
        self.call("sendtoaddress", args.into_params()).await
    }

    async fn send_many(&self, args: SendManyArgs) -> RpcResult<Value> {
        self.call("sendmany", args.into_params()).await
    }

    async fn estimate_smart_fee(
        &self,
        conf_target: u32,
        estimate_mode: EstimateMode,
    ) -> RpcResult<Value> {
        self.call(
            "estimatesmartfee",
            vec![json!(conf_target), json!(estimate_mode.as_str())],
        )
        .await
    }

    // Mempool and peers

    async fn get_mempool_info(&self) -> RpcResult<Value> {
        self.call("getmempoolinfo", vec![]).await
    }

    async fn get_raw_mempool(&self, verbose: bool) -> RpcResult<Value> {
        self.call("getrawmempool", vec![json!(verbose)]).await
    }

    async fn get_peer_info(&self) -> RpcResult<Value> {
        self.call("getpeerinfo", vec![]).await
    }

    async fn get_connection_count(&self) -> RpcResult<Value> {
        self.call("getconnectioncount", vec![]).await
    }

    /// `command` defaults to `"add"`.
    async fn add_node(&self, node: &str, command: Option<&str>) -> RpcResult<Value> {
        self.call("addnode", vec![json!(node), json!(command.unwrap_or("add"))])
            .await
    }

    // Utility

    async fn validate_address(&self, address: &str) -> RpcResult<Value> {
        self.call("validateaddress", vec![json!(address)]).await
    }

    async fn sign_raw_transaction_with_wallet(&self, raw_tx: &str) -> RpcResult<Value> {
        self.call("signrawtransactionwithwallet", vec![json!(raw_tx)])
            .await
    }

    async fn send_raw_transaction(&self, raw_tx: &str) -> RpcResult<Value> {
        self.call("sendrawtransaction", vec![json!(raw_tx)]).await
    }

    /// Regtest only.
    async fn generate_to_address(&self, nblocks: u32, address: &str) -> RpcResult<Value> {
        self.call("generatetoaddress", vec![json!(nblocks), json!(address)])
            .await
    }

    /// Escape hatch for methods not in the catalog.
    async fn custom_call(&self, method: &str, params: Vec<Value>) -> RpcResult<Value> {
        self.call(method, params).await
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory node used by unit tests.

    use super::*;
    use crate::rpc::types::RpcError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    type Handler = Box<dyn Fn(&[Value]) -> RpcResult<Value> + Send + Sync>;

    /// Records every call and answers from per-method handlers.
    #[derive(Default)]
    pub struct MockNode {
        handlers: HashMap<String, Handler>,
        calls: Mutex<Vec<(String, Vec<Value>)>>,
    }

    impl MockNode {
        pub fn new() -> Self {
            Self::default()
        }

        /// Answer `method` with a fixed result.
        pub fn respond(mut self, method: &str, result: Value) -> Self {
            self.handlers
                .insert(method.to_string(), Box::new(move |_| Ok(result.clone())));
            self
        }

        /// Answer `method` with a protocol error.
        pub fn fail(mut self, method: &str, message: &str) -> Self {
            let message = message.to_string();
            self.handlers.insert(
                method.to_string(),
                Box::new(move |_| {
                    Err(RpcError::Protocol {
                        code: Some(-1),
                        message: message.clone(),
                    })
                }),
            );
            self
        }

        pub fn calls(&self) -> Vec<(String, Vec<Value>)> {
            self.calls.lock().unwrap().clone()
        }

        pub fn methods(&self) -> Vec<String> {
            self.calls().into_iter().map(|(m, _)| m).collect()
        }
    }

    #[async_trait]
    impl ElementsApi for MockNode {
        async fn call(&self, method: &str, params: Vec<Value>) -> RpcResult<Value> {
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), params.clone()));
            match self.handlers.get(method) {
                Some(handler) => handler(&params),
                None => Err(RpcError::Protocol {
                    code: Some(-32601),
                    message: "Method not found".to_string(),
                }),
            }
        }
    }
}
