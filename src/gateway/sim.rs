// src/gateway/sim.rs
use crate::error::GatewayError;
use crate::gateway::LedgerGateway;
use crate::types::{CallRequest, TxStatus, WalletIdentity};
use async_trait::async_trait;
use std::collections::HashMap;
use std::ops::Range;
use tokio::sync::Mutex;
use tokio::time::{Duration, sleep};

struct PendingTx {
    polls_left: u32,
    fails: bool,
}

/// In-process stand-in for a ledger node. Seeded, so a fixed seed replays
/// the same rejections, failures and confirmation delays. Used for dry runs
/// and tests.
pub struct SimulatedGateway {
    rng: Mutex<fastrand::Rng>,
    pending: Mutex<HashMap<String, PendingTx>>,
    rejection_rate: f64,
    failure_rate: f64,
    latency_ms: Range<u64>,
    confirm_polls: Range<u32>,
}

impl SimulatedGateway {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
            pending: Mutex::new(HashMap::new()),
            rejection_rate: 0.02,
            failure_rate: 0.05,
            latency_ms: 10..50,
            confirm_polls: 0..3,
        }
    }

    /// A gateway that accepts and confirms everything immediately.
    pub fn reliable(seed: u64) -> Self {
        Self::new(seed)
            .with_rejection_rate(0.0)
            .with_failure_rate(0.0)
            .with_latency_ms(0..1)
            .with_confirm_polls(0..1)
    }

    pub fn with_rejection_rate(mut self, rate: f64) -> Self {
        self.rejection_rate = rate;
        self
    }

    pub fn with_failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate;
        self
    }

    pub fn with_latency_ms(mut self, latency_ms: Range<u64>) -> Self {
        self.latency_ms = latency_ms;
        self
    }

    pub fn with_confirm_polls(mut self, confirm_polls: Range<u32>) -> Self {
        self.confirm_polls = confirm_polls;
        self
    }
}

#[async_trait]
impl LedgerGateway for SimulatedGateway {
    async fn submit(
        &self,
        wallet: &WalletIdentity,
        call: CallRequest,
    ) -> Result<String, GatewayError> {
        let (latency, rejected, tx_hash, pending) = {
            let mut rng = self.rng.lock().await;
            let latency = rng.u64(self.latency_ms.clone());
            let rejected = rng.f64() < self.rejection_rate;
            let tx_hash = format!("0x{:016x}{:016x}", rng.u64(..), rng.u64(..));
            let pending = PendingTx {
                polls_left: rng.u32(self.confirm_polls.clone()),
                fails: rng.f64() < self.failure_rate,
            };
            (latency, rejected, tx_hash, pending)
        };

        if latency > 0 {
            sleep(Duration::from_millis(latency)).await;
        }
        if rejected {
            return Err(GatewayError::Rejected(format!(
                "simulated rejection of {} from {}",
                call.method, wallet.public
            )));
        }
        self.pending.lock().await.insert(tx_hash.clone(), pending);
        Ok(tx_hash)
    }

    async fn poll_transaction(&self, tx_hash: &str) -> Result<TxStatus, GatewayError> {
        let mut pending = self.pending.lock().await;
        let Some(tx) = pending.get_mut(tx_hash) else {
            return Ok(TxStatus::NotFound);
        };
        if tx.polls_left > 0 {
            tx.polls_left -= 1;
            return Ok(TxStatus::NotFound);
        }
        let fails = tx.fails;
        pending.remove(tx_hash);
        if fails {
            Ok(TxStatus::Failed("simulated revert".to_string()))
        } else {
            Ok(TxStatus::Success(None))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::await_completion;
    use crate::types::CallData;
    use tokio_test::assert_ok;

    fn wallet() -> WalletIdentity {
        WalletIdentity {
            public: "0xwallet".to_string(),
            secret: "s".to_string(),
        }
    }

    fn call() -> CallRequest {
        CallRequest {
            contract: "0xcontract".to_string(),
            method: "deposit".to_string(),
            destination: None,
            value: None,
            data: CallData::Json(serde_json::json!({})),
        }
    }

    #[tokio::test]
    async fn test_reliable_gateway_confirms() {
        let gateway = SimulatedGateway::reliable(1);
        let hash = gateway.submit(&wallet(), call()).await.unwrap();
        let result = await_completion(
            &gateway,
            &hash,
            Duration::from_millis(1),
            Duration::from_secs(1),
        )
        .await;
        assert_ok!(result);
    }

    #[tokio::test]
    async fn test_always_failing_gateway() {
        let gateway = SimulatedGateway::reliable(1).with_failure_rate(1.0);
        let hash = gateway.submit(&wallet(), call()).await.unwrap();
        let result = await_completion(
            &gateway,
            &hash,
            Duration::from_millis(1),
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(result, Err(GatewayError::Failed(_))));
    }

    #[tokio::test]
    async fn test_always_rejecting_gateway() {
        let gateway = SimulatedGateway::reliable(1).with_rejection_rate(1.0);
        let result = gateway.submit(&wallet(), call()).await;
        assert!(matches!(result, Err(GatewayError::Rejected(_))));
    }

    #[tokio::test]
    async fn test_same_seed_same_hashes() {
        let a = SimulatedGateway::reliable(42);
        let b = SimulatedGateway::reliable(42);
        let hash_a = a.submit(&wallet(), call()).await.unwrap();
        let hash_b = b.submit(&wallet(), call()).await.unwrap();
        assert_eq!(hash_a, hash_b);
    }
}
