// src/gateway/mod.rs
//
// Boundary to the ledger. Building, signing and fee logic live behind this
// trait; the operator only submits calls and waits for terminal status.
pub mod rpc;
pub mod sim;

pub use rpc::RpcGateway;
pub use sim::SimulatedGateway;

use crate::error::GatewayError;
use crate::types::{CallRequest, TxStatus, WalletIdentity};
use async_trait::async_trait;
use tokio::time::{Duration, Instant, sleep};

#[async_trait]
pub trait LedgerGateway: Send + Sync {
    /// Build, sign and submit one call for the wallet. Returns the
    /// transaction hash to poll.
    async fn submit(&self, wallet: &WalletIdentity, call: CallRequest)
    -> Result<String, GatewayError>;

    /// One status probe. `TxStatus::NotFound` means not yet visible, which
    /// callers treat as still pending.
    async fn poll_transaction(&self, tx_hash: &str) -> Result<TxStatus, GatewayError>;
}

/// Poll until the transaction reaches a terminal status. `NotFound` is
/// re-polled on a fixed interval; once `overall_timeout` elapses the wait
/// fails with a timeout.
pub async fn await_completion(
    gateway: &dyn LedgerGateway,
    tx_hash: &str,
    poll_interval: Duration,
    overall_timeout: Duration,
) -> Result<Option<String>, GatewayError> {
    let deadline = Instant::now() + overall_timeout;
    loop {
        match gateway.poll_transaction(tx_hash).await? {
            TxStatus::Success(return_value) => return Ok(return_value),
            TxStatus::Failed(reason) => return Err(GatewayError::Failed(reason)),
            TxStatus::NotFound => {}
        }
        if Instant::now() + poll_interval > deadline {
            return Err(GatewayError::Timeout(tx_hash.to_string()));
        }
        sleep(poll_interval).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio_test::assert_ok;

    /// Returns NOT_FOUND a fixed number of times, then a terminal status.
    struct ScriptedGateway {
        polls_before_terminal: u32,
        polls: AtomicU32,
        terminal: TxStatus,
    }

    #[async_trait]
    impl LedgerGateway for ScriptedGateway {
        async fn submit(
            &self,
            _wallet: &WalletIdentity,
            _call: CallRequest,
        ) -> Result<String, GatewayError> {
            Ok("0xabc".to_string())
        }

        async fn poll_transaction(&self, _tx_hash: &str) -> Result<TxStatus, GatewayError> {
            if self.polls.fetch_add(1, Ordering::SeqCst) < self.polls_before_terminal {
                Ok(TxStatus::NotFound)
            } else {
                Ok(self.terminal.clone())
            }
        }
    }

    #[tokio::test]
    async fn test_not_found_is_still_pending() {
        let gateway = ScriptedGateway {
            polls_before_terminal: 2,
            polls: AtomicU32::new(0),
            terminal: TxStatus::Success(None),
        };
        let result = await_completion(
            &gateway,
            "0xabc",
            Duration::from_millis(1),
            Duration::from_secs(1),
        )
        .await;
        assert_ok!(result);
        assert_eq!(gateway.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failed_status_is_an_error() {
        let gateway = ScriptedGateway {
            polls_before_terminal: 0,
            polls: AtomicU32::new(0),
            terminal: TxStatus::Failed("reverted".to_string()),
        };
        let result = await_completion(
            &gateway,
            "0xabc",
            Duration::from_millis(1),
            Duration::from_secs(1),
        )
        .await;
        assert!(matches!(result, Err(GatewayError::Failed(_))));
    }

    #[tokio::test]
    async fn test_overall_timeout_elapses() {
        let gateway = ScriptedGateway {
            polls_before_terminal: u32::MAX,
            polls: AtomicU32::new(0),
            terminal: TxStatus::Success(None),
        };
        let result = await_completion(
            &gateway,
            "0xabc",
            Duration::from_millis(5),
            Duration::from_millis(20),
        )
        .await;
        assert!(matches!(result, Err(GatewayError::Timeout(_))));
    }
}
