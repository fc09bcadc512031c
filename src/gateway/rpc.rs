// src/gateway/rpc.rs
use crate::error::GatewayError;
use crate::gateway::LedgerGateway;
use crate::types::{CallRequest, TxStatus, WalletIdentity};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// JSON-RPC gateway to a spoke-chain node that accepts pre-built contract
/// operations and reports transaction status.
pub struct RpcGateway {
    client: Client,
    url: String,
    next_id: AtomicU64,
}

#[derive(Serialize)]
struct RpcRequest<'a, P: Serialize> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct SubmitResult {
    hash: String,
}

#[derive(Deserialize)]
struct TransactionResult {
    status: String,
    #[serde(default)]
    return_value: Option<String>,
    #[serde(default)]
    reason: Option<String>,
}

impl RpcGateway {
    pub fn new(url: String) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GatewayError::Network(format!("failed to build client: {e}")))?;
        Ok(Self {
            client,
            url,
            next_id: AtomicU64::new(1),
        })
    }

    async fn call<P: Serialize, T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: P,
    ) -> Result<T, GatewayError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };
        let response = self
            .client
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| GatewayError::Network(format!("{method}: {e}")))?;
        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| GatewayError::Network(format!("{method}: {e}")))?;

        if let Some(error) = body.error {
            return Err(GatewayError::Rejected(format!(
                "{method}: {} (code {})",
                error.message, error.code
            )));
        }
        body.result
            .ok_or_else(|| GatewayError::Network(format!("{method}: empty result")))
    }
}

#[async_trait]
impl LedgerGateway for RpcGateway {
    async fn submit(
        &self,
        wallet: &WalletIdentity,
        call: CallRequest,
    ) -> Result<String, GatewayError> {
        let params = serde_json::json!({
            "source": wallet.public,
            "contract": call.contract,
            "method": call.method,
            "destination": call.destination,
            "value": call.value,
            "data": call.data,
        });
        let result: SubmitResult = self.call("submitOperation", params).await?;
        Ok(result.hash)
    }

    async fn poll_transaction(&self, tx_hash: &str) -> Result<TxStatus, GatewayError> {
        let params = serde_json::json!({ "hash": tx_hash });
        let result: TransactionResult = self.call("getTransaction", params).await?;
        match result.status.as_str() {
            "SUCCESS" => Ok(TxStatus::Success(result.return_value)),
            "FAILED" => Ok(TxStatus::Failed(
                result.reason.unwrap_or_else(|| "transaction failed".to_string()),
            )),
            "NOT_FOUND" => Ok(TxStatus::NotFound),
            other => Err(GatewayError::Network(format!(
                "unexpected transaction status for {tx_hash}: {other}"
            ))),
        }
    }
}
