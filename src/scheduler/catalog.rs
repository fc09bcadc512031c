// src/scheduler/catalog.rs
//
// The fixed, ordered list of actions every wallet cycles through, plus the
// single interpreter that turns a catalog entry into a ledger call.
use crate::codec;
use crate::config::OperatorConfig;
use crate::error::{OperatorError, OperatorResult};
use crate::gateway::{self, LedgerGateway};
use crate::types::{Asset, CallData, CallRequest, PairType, RouteAction, WalletIdentity};
use alloy_primitives::U256;
use tokio::time::Duration;

/// One operation type with its fixed parameters. Ordering inside the catalog
/// is shared by every wallet.
#[derive(Debug, Clone)]
pub enum Action {
    ProvideCollateral { amount: U256 },
    TakeLoan { amount: U256 },
    Swap { from: Asset, to: Asset, amount: U256 },
    Deposit { amount: U256 },
}

impl Action {
    pub fn kind(&self) -> &'static str {
        match self {
            Action::ProvideCollateral { .. } => "provide_collateral",
            Action::TakeLoan { .. } => "take_loan",
            Action::Swap { .. } => "swap",
            Action::Deposit { .. } => "deposit",
        }
    }

    /// Past-tense audit line for the operations log.
    pub fn describe(&self) -> String {
        match self {
            Action::ProvideCollateral { amount } => {
                format!("provided {amount} XLM collateral")
            }
            Action::TakeLoan { amount } => format!("took out {amount} bnUSD loan"),
            Action::Swap { from, to, amount } => {
                format!("swapped {amount} {} to {}", from.symbol, to.symbol)
            }
            Action::Deposit { amount } => format!("put {amount} bnUSD into savings"),
        }
    }
}

/// Build the shared catalog: collateralize, borrow, swap through the
/// stability fund, deposit to savings.
pub fn build_catalog(config: &OperatorConfig) -> OperatorResult<Vec<Action>> {
    let usdc = config.asset("USDC")?.clone();
    let bnusd = config.asset("bnUSD")?.clone();
    Ok(vec![
        Action::ProvideCollateral {
            amount: U256::from(config.collateral_amount),
        },
        Action::TakeLoan {
            amount: U256::from(config.loan_amount),
        },
        Action::Swap {
            from: usdc,
            to: bnusd,
            amount: U256::from(config.swap_amount),
        },
        Action::Deposit {
            amount: U256::from(config.savings_amount),
        },
    ])
}

/// Serialize the action into one contract call. All payload encoding happens
/// here, so an encoding invariant violation surfaces before anything is
/// submitted.
pub fn build_call(
    action: &Action,
    wallet: &WalletIdentity,
    config: &OperatorConfig,
) -> OperatorResult<CallRequest> {
    match action {
        Action::ProvideCollateral { amount } => Ok(CallRequest {
            contract: config.loans_address.clone(),
            method: "deposit_collateral".to_string(),
            destination: None,
            value: Some(amount.to_string()),
            data: CallData::Json(serde_json::json!({})),
        }),
        Action::TakeLoan { amount } => Ok(CallRequest {
            contract: config.loans_address.clone(),
            method: "borrow".to_string(),
            destination: None,
            value: None,
            data: CallData::Json(serde_json::json!({
                "_asset": "bnUSD",
                "_amount": amount.to_string(),
            })),
        }),
        Action::Swap { from, to, amount } => {
            // Stable pair, so the floor is the input amount less slippage,
            // expressed in the output token's hub decimals.
            let floor = amount
                .checked_mul(U256::from(10_000 - config.slippage_bps))
                .ok_or_else(|| {
                    OperatorError::EncodingOverflow(format!("slippage floor for {amount}"))
                })?
                / U256::from(10_000u64);
            let min_received = codec::to_hub_decimals(floor, from.decimals, to.hub_decimals)?;
            let path = [RouteAction {
                pair_type: PairType::StabilityFund,
                address: Some(to.hub_contract.clone()),
            }];
            let receiver = format!("{}/{}", config.hub_network_id, wallet.public);
            let payload =
                codec::encode_swap_payload(&path, Some("_swap"), Some(&receiver), Some(min_received))?;

            let hub_router = format!("{}/{}", config.hub_network_id, config.hub_swap_destination);
            Ok(CallRequest {
                contract: from.contract.clone(),
                method: "cross_transfer".to_string(),
                destination: Some(hub_router),
                value: Some(
                    codec::to_hub_decimals(*amount, from.decimals, from.hub_decimals)?.to_string(),
                ),
                data: CallData::Binary(payload),
            })
        }
        Action::Deposit { amount } => Ok(CallRequest {
            contract: config.asset("bnUSD")?.contract.clone(),
            method: "transfer".to_string(),
            destination: None,
            value: Some(amount.to_string()),
            data: CallData::Json(serde_json::json!({
                "_to": config.savings_address,
                "_data": codec::token_call_data("_lock", serde_json::json!({})),
            })),
        }),
    }
}

/// Run one action to completion: build the call, submit it, wait for a
/// terminal status. Returns the transaction hash on success.
pub async fn execute(
    action: &Action,
    wallet: &WalletIdentity,
    gateway: &dyn LedgerGateway,
    config: &OperatorConfig,
) -> OperatorResult<String> {
    let call = build_call(action, wallet, config)?;
    let tx_hash = gateway.submit(wallet, call).await?;
    gateway::await_completion(
        gateway,
        &tx_hash,
        Duration::from_millis(config.polling_interval_ms),
        Duration::from_millis(config.completion_timeout_ms),
    )
    .await?;
    Ok(tx_hash)
}
