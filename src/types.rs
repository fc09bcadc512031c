// src/types.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One blockchain account driven by the operator. The public identifier keys
/// every state record; the secret never leaves this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletIdentity {
    pub public: String,
    pub secret: String,
}

/// Durable per-wallet progress and throttle counters, keyed by the wallet's
/// public identifier. Created lazily on the wallet's first scheduling touch
/// and never deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletState {
    /// Cursor into the action catalog; always `< catalog length`.
    pub next_action_index: usize,
    /// Successful actions over the wallet's lifetime. Monotonic.
    pub total_actions: u64,
    /// Successful actions on `last_action_date`.
    pub actions_today: u32,
    /// The day `actions_today` refers to. Reset by day rollover.
    pub last_action_date: NaiveDate,
    /// Day of the last successful action. Unlike `last_action_date` this is
    /// untouched by rollover, so the slow-wallet cooldown can observe real
    /// gaps between actions.
    pub last_success_date: Option<NaiveDate>,
    /// Drawn once at creation; fixed for the wallet's lifetime.
    pub is_slow_wallet: bool,
    /// Redrawn from the configured range on each day rollover.
    pub daily_action_limit: u32,
    /// Failed attempts since the last success. Cleared on success and at
    /// day rollover.
    pub consecutive_failures: u32,
    /// Set after the wallet's first successful action.
    pub is_initialized: bool,
    /// Public identifier of the fund wallet that seeded this one.
    pub funded_by: Option<String>,
}

/// Pool pair variants recognized by the remote router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PairType {
    Normal = 1,
    StabilityFund = 2,
    Staking = 3,
}

/// One hop of a swap route. `address` is `None` when the router should keep
/// the current token (the encoding has no native null, see the codec).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAction {
    pub pair_type: PairType,
    pub address: Option<String>,
}

/// A token known on both the local ledger and the hub ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Asset {
    pub symbol: String,
    pub contract: String,
    pub decimals: u8,
    pub hub_contract: String,
    pub hub_decimals: u8,
}

/// Argument payload of one contract call.
#[derive(Debug, Clone)]
pub enum CallData {
    Json(serde_json::Value),
    /// Pre-encoded cross-chain bytes, hex-serialized on the wire.
    Binary(Vec<u8>),
}

impl Serialize for CallData {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            CallData::Json(value) => value.serialize(serializer),
            CallData::Binary(bytes) => serializer.serialize_str(&hex::encode(bytes)),
        }
    }
}

/// One operation handed to the ledger gateway for building, signing and
/// submission. `value` is the token amount moved by the call itself, when
/// the method transfers one; `destination` is the hub-side contract a
/// cross-chain call is forwarded to.
#[derive(Debug, Clone, Serialize)]
pub struct CallRequest {
    pub contract: String,
    pub method: String,
    pub destination: Option<String>,
    pub value: Option<String>,
    pub data: CallData,
}

/// Terminal or pending status of a submitted transaction.
#[derive(Debug, Clone, PartialEq)]
pub enum TxStatus {
    Success(Option<String>),
    Failed(String),
    /// Not yet visible on ledger; still pending from the caller's view.
    NotFound,
}
