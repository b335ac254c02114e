//! Shared utilities for integration tests: a scriptable Elements node speaking
//! JSON-RPC over plain HTTP/1.1.

#![allow(dead_code)]

use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use elements_gateway::ElementsRpc;

/// How the mock node answers one call.
pub enum Reply {
    /// `{"result": ..., "error": null}` with 200.
    Result(Value),
    /// `{"result": null, "error": {code, message}}` with 200.
    Error(i64, &'static str),
    /// Bare HTTP status with the given body.
    Status(u16, &'static str),
    /// Hold the connection open without answering.
    Stall,
}

/// One request as seen by the node.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub method: String,
    pub params: Value,
    pub id: Value,
    pub jsonrpc: Value,
    pub authorization: Option<String>,
}

pub struct MockNode {
    pub addr: SocketAddr,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
}

impl MockNode {
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn methods(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.method).collect()
    }

    /// Client pointed at this node with `alice:secret` credentials.
    pub fn client(&self, timeout_ms: Option<u64>) -> ElementsRpc {
        ElementsRpc::new(
            &self.addr.ip().to_string(),
            self.addr.port(),
            "alice",
            "secret",
            timeout_ms,
        )
        .unwrap()
    }
}

/// Start a programmable mock node on an ephemeral port.
pub async fn start_mock_node<F>(handler: F) -> MockNode
where
    F: Fn(&str, &Value) -> Reply + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let calls = Arc::new(Mutex::new(Vec::new()));
    let handler = Arc::new(handler);

    let recorded = calls.clone();
    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((socket, _)) => {
                    let handler = handler.clone();
                    let recorded = recorded.clone();
                    tokio::spawn(async move {
                        serve(socket, handler.as_ref(), &recorded).await;
                    });
                }
                Err(_) => break,
            }
        }
    });

    MockNode { addr, calls }
}

/// Node answering every method from a fixed table; unknown methods get -32601.
pub async fn start_table_node(table: Vec<(&'static str, Value)>) -> MockNode {
    start_mock_node(move |method, _| {
        match table.iter().find(|(name, _)| *name == method) {
            Some((_, result)) => Reply::Result(result.clone()),
            None => Reply::Error(-32601, "Method not found"),
        }
    })
    .await
}

/// The node a healthy Liquid wallet looks like.
pub fn wallet_table() -> Vec<(&'static str, Value)> {
    vec![
        ("getbalance", json!({"bitcoin": 0.002, "tether": 25.0})),
        ("getwalletinfo", json!({"walletname": "", "txcount": 4})),
        ("dumpassetlabels", json!({"bitcoin": "6f0279e9", "tether": "ce091c99"})),
        ("getnewaddress", json!("el1qqf6tv4n8qp55qc04v4xts5snd9v5uurkry4vskef6lmecahj6c42jt9lnj0432287rs67z9vzq2zvuer036s5mahptwxgyd8k")),
        ("sendtoaddress", json!("tx1")),
        ("gettransaction", json!({"amount": {"bitcoin": -0.001}, "confirmations": 0})),
        (
            "getblockchaininfo",
            json!({
                "chain": "liquidregtest",
                "blocks": 101,
                "headers": 101,
                "bestblockhash": "0f9188f13cb7b2c71f2a335e3a4fc328bf5beb436012afca590b1a11466e2206",
                "mediantime": 1_700_000_000,
                "verificationprogress": 1,
                "initialblockdownload": false,
                "size_on_disk": 30_512,
                "pruned": false,
                "warnings": ["node is a test build"]
            }),
        ),
    ]
}

async fn serve<F>(mut socket: TcpStream, handler: &F, recorded: &Mutex<Vec<RecordedCall>>)
where
    F: Fn(&str, &Value) -> Reply,
{
    let Some((head, body)) = read_request(&mut socket).await else {
        return;
    };

    let request: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let method = request["method"].as_str().unwrap_or_default().to_string();
    let params = request["params"].clone();

    recorded.lock().unwrap().push(RecordedCall {
        method: method.clone(),
        params: params.clone(),
        id: request["id"].clone(),
        jsonrpc: request["jsonrpc"].clone(),
        authorization: header(&head, "authorization"),
    });

    let (status, body) = match handler(&method, &params) {
        Reply::Result(result) => (200, json!({"result": result, "error": null, "id": request["id"]}).to_string()),
        Reply::Error(code, message) => (
            200,
            json!({"result": null, "error": {"code": code, "message": message}, "id": request["id"]})
                .to_string(),
        ),
        Reply::Status(status, body) => (status, body.to_string()),
        Reply::Stall => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            return;
        }
    };

    let status_text = match status {
        200 => "200 OK",
        401 => "401 Unauthorized",
        404 => "404 Not Found",
        500 => "500 Internal Server Error",
        502 => "502 Bad Gateway",
        503 => "503 Service Unavailable",
        _ => "200 OK",
    };

    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status_text,
        body.len(),
        body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

async fn read_request(socket: &mut TcpStream) -> Option<(String, Vec<u8>)> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let length = header(&head, "content-length")
        .and_then(|v| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + length {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let end = buf.len().min(header_end + length);
    Some((head, buf[header_end..end].to_vec()))
}

fn header(head: &str, name: &str) -> Option<String> {
    head.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        key.trim()
            .eq_ignore_ascii_case(name)
            .then(|| value.trim().to_string())
    })
}
