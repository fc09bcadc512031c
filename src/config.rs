// src/config.rs
use crate::error::{OperatorError, OperatorResult};
use crate::types::Asset;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Runtime configuration. Every field has a default so an empty `{}` file
/// (or no file at all) yields a working dry-run setup.
#[derive(Debug, Clone, Deserialize)]
pub struct OperatorConfig {
    // Pool
    #[serde(default = "default_fund_wallet_count")]
    pub fund_wallet_count: usize,
    #[serde(default = "default_child_wallet_count")]
    pub child_wallet_count: usize,

    // Scheduling
    #[serde(default = "default_max_concurrent_wallets")]
    pub max_concurrent_wallets: usize,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    #[serde(default = "default_action_timeout_secs")]
    pub action_timeout_secs: u64,
    #[serde(default = "default_flush_interval_secs")]
    pub flush_interval_secs: u64,

    // Throttling
    #[serde(default = "default_daily_limit_min")]
    pub daily_limit_min: u32,
    #[serde(default = "default_daily_limit_max")]
    pub daily_limit_max: u32,
    #[serde(default = "default_slow_wallet_ratio")]
    pub slow_wallet_ratio: f64,
    #[serde(default = "default_slow_wallet_cooldown_days")]
    pub slow_wallet_cooldown_days: i64,
    #[serde(default = "default_failure_backoff_threshold")]
    pub failure_backoff_threshold: u32,

    // Gateway
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    #[serde(default = "default_polling_interval_ms")]
    pub polling_interval_ms: u64,
    #[serde(default = "default_completion_timeout_ms")]
    pub completion_timeout_ms: u64,
    #[serde(default)]
    pub dry_run: bool,

    /// Seed for the operator's random source. Fixed seed reproduces the
    /// same slow-wallet draws and daily limits across runs.
    #[serde(default)]
    pub rng_seed: Option<u64>,

    // Paths
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_logs_dir")]
    pub logs_dir: PathBuf,

    // Action amounts, in each asset's base units
    #[serde(default = "default_collateral_amount")]
    pub collateral_amount: u64,
    #[serde(default = "default_loan_amount")]
    pub loan_amount: u64,
    #[serde(default = "default_swap_amount")]
    pub swap_amount: u64,
    #[serde(default = "default_savings_amount")]
    pub savings_amount: u64,
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u64,

    // Protocol addresses
    #[serde(default = "default_loans_address")]
    pub loans_address: String,
    #[serde(default = "default_stability_fund_address")]
    pub stability_fund_address: String,
    #[serde(default = "default_savings_address")]
    pub savings_address: String,
    /// Network id of the hub ledger consuming cross-chain payloads.
    #[serde(default = "default_hub_network_id")]
    pub hub_network_id: String,
    /// Hub-side contract the spoke forwards swap payloads to.
    #[serde(default = "default_hub_swap_destination")]
    pub hub_swap_destination: String,

    #[serde(default = "default_assets")]
    pub assets: Vec<Asset>,
}

fn default_fund_wallet_count() -> usize {
    11
}
fn default_child_wallet_count() -> usize {
    350
}
fn default_max_concurrent_wallets() -> usize {
    8
}
fn default_tick_interval_ms() -> u64 {
    500
}
fn default_action_timeout_secs() -> u64 {
    90
}
fn default_flush_interval_secs() -> u64 {
    30
}
fn default_daily_limit_min() -> u32 {
    1
}
fn default_daily_limit_max() -> u32 {
    4
}
fn default_slow_wallet_ratio() -> f64 {
    0.3
}
fn default_slow_wallet_cooldown_days() -> i64 {
    2
}
fn default_failure_backoff_threshold() -> u32 {
    5
}
fn default_rpc_url() -> String {
    "http://localhost:8000/rpc".to_string()
}
fn default_polling_interval_ms() -> u64 {
    1000
}
fn default_completion_timeout_ms() -> u64 {
    60_000
}
fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}
fn default_logs_dir() -> PathBuf {
    PathBuf::from("logs")
}
fn default_collateral_amount() -> u64 {
    50_0000000 // 50 XLM, 7 decimals
}
fn default_loan_amount() -> u64 {
    10_000_000_000_000_000_000 // 10 bnUSD, 18 decimals
}
fn default_swap_amount() -> u64 {
    10_0000000 // 10 USDC, 7 decimals
}
fn default_savings_amount() -> u64 {
    5_000_000_000_000_000_000 // 5 bnUSD, 18 decimals
}
fn default_slippage_bps() -> u64 {
    50
}
fn default_loans_address() -> String {
    "GBLNS7Z53GN7472T42N744X7B7Y6W6Z5J3Z5Y5Y6Z5J3Z5Y5Y6Z5LOAN".to_string()
}
fn default_stability_fund_address() -> String {
    "GAD22KN7Z53GN7472T42N744X7B7Y6W6Z5J3Z5Y5Y6Z5J3Z5Y5Y6Z5J3".to_string()
}
fn default_savings_address() -> String {
    "GAX5X5X5X5X5X5X5X5X5X5X5X5X5X5X5X5X5X5X5X5X5X5X5X5X5X5".to_string()
}
fn default_hub_network_id() -> String {
    "0x1.icon".to_string()
}
fn default_hub_swap_destination() -> String {
    "cx66d4d90f5f113eba575bf793570135f9b10cece1".to_string()
}

fn default_assets() -> Vec<Asset> {
    vec![
        Asset {
            symbol: "XLM".to_string(),
            contract: "CAS3J7GYLGXMF6TDJBBYYSE3HQ6BBSMLNUQ34T6TZMYMW2EVH34XOWMA".to_string(),
            decimals: 7,
            hub_contract: "cx518f64edcd35db9044a2de63fdc10abfd5f7d611".to_string(),
            hub_decimals: 7,
        },
        Asset {
            symbol: "USDC".to_string(),
            contract: "CCW67TSZV3SSS2HXMBQ5JFGCKJNXKZM7UQUWUZPUTHXSTZLEO7SJMI75".to_string(),
            decimals: 7,
            hub_contract: "cx22319ac7f412f53eabe3c9827acf5e27e9c6a95f".to_string(),
            hub_decimals: 6,
        },
        Asset {
            symbol: "bnUSD".to_string(),
            contract: "CCT4ZYIYZ3TUO2AWQFEOFGBZ6HQP3GW5TA37CK7CRZVFRDXYTHTYX7KP".to_string(),
            decimals: 18,
            hub_contract: "cx88fd7df7ddff82f7cc735c871dc519838cb235bb".to_string(),
            hub_decimals: 18,
        },
    ]
}

impl Default for OperatorConfig {
    fn default() -> Self {
        // Every field defaults, so deserializing an empty object is total.
        serde_json::from_str("{}").expect("default config is valid")
    }
}

impl OperatorConfig {
    /// Load configuration from a JSON file, falling back to defaults for any
    /// omitted field.
    pub fn load(path: &Path) -> OperatorResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| OperatorError::ConfigurationLoad(format!("{}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&raw)
            .map_err(|e| OperatorError::ConfigurationLoad(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> OperatorResult<()> {
        if self.max_concurrent_wallets == 0 {
            return Err(OperatorError::InvalidConfiguration(
                "max_concurrent_wallets must be at least 1".to_string(),
            ));
        }
        if self.daily_limit_min == 0 || self.daily_limit_min > self.daily_limit_max {
            return Err(OperatorError::InvalidConfiguration(format!(
                "daily limit range [{}, {}] is invalid",
                self.daily_limit_min, self.daily_limit_max
            )));
        }
        if !(0.0..=1.0).contains(&self.slow_wallet_ratio) {
            return Err(OperatorError::InvalidConfiguration(format!(
                "slow_wallet_ratio {} is outside [0, 1]",
                self.slow_wallet_ratio
            )));
        }
        if self.child_wallet_count == 0 {
            return Err(OperatorError::InvalidConfiguration(
                "child_wallet_count must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn asset(&self, symbol: &str) -> OperatorResult<&Asset> {
        self.assets
            .iter()
            .find(|a| a.symbol == symbol)
            .ok_or_else(|| {
                OperatorError::InvalidConfiguration(format!("asset {symbol} is not configured"))
            })
    }

    pub fn wallets_path(&self) -> PathBuf {
        self.data_dir.join("wallets.json")
    }

    pub fn state_path(&self) -> PathBuf {
        self.data_dir.join("wallet_state.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = OperatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.fund_wallet_count, 11);
        assert_eq!(config.child_wallet_count, 350);
        assert!(config.asset("USDC").is_ok());
        assert!(config.asset("DOGE").is_err());
    }

    #[test]
    fn test_rejects_bad_limit_range() {
        let mut config = OperatorConfig::default();
        config.daily_limit_min = 5;
        config.daily_limit_max = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_file_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("operator.json");
        std::fs::write(&path, r#"{"child_wallet_count": 12, "rng_seed": 7}"#).unwrap();

        let config = OperatorConfig::load(&path).unwrap();
        assert_eq!(config.child_wallet_count, 12);
        assert_eq!(config.rng_seed, Some(7));
        assert_eq!(config.fund_wallet_count, 11);
    }
}
