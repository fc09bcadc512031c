// src/state/mod.rs
//
// Durable wallet progress. The full key -> state mapping is held in memory
// and written out as one JSON snapshot on every mutating event plus a
// periodic timer. Losing the window between a success and the next snapshot
// replays one action, which the scheduler tolerates.
use crate::config::OperatorConfig;
use crate::error::{OperatorError, OperatorResult};
use crate::types::WalletState;
use chrono::NaiveDate;
use rand::Rng;
use rand::rngs::StdRng;
use std::collections::HashMap;
use std::path::PathBuf;
use tokio::sync::RwLock;

pub struct StateStore {
    states: RwLock<HashMap<String, WalletState>>,
    path: PathBuf,
}

impl StateStore {
    /// Load the snapshot at `path`. An absent file is a cold start with an
    /// empty mapping; a corrupt file fails startup.
    pub fn load(path: PathBuf) -> OperatorResult<Self> {
        let states = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)
                .map_err(|e| OperatorError::StateLoad(format!("{}: {e}", path.display())))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "no state snapshot, cold start");
                HashMap::new()
            }
            Err(e) => {
                return Err(OperatorError::StateLoad(format!("{}: {e}", path.display())));
            }
        };

        Ok(Self {
            states: RwLock::new(states),
            path,
        })
    }

    /// Create the wallet's record on first touch. `is_slow_wallet` is drawn
    /// exactly once here; the daily limit gets its initial draw and is then
    /// redrawn by the throttle policy at each day rollover.
    pub async fn ensure(
        &self,
        key: &str,
        funded_by: Option<String>,
        today: NaiveDate,
        config: &OperatorConfig,
        rng: &mut StdRng,
    ) {
        let mut states = self.states.write().await;
        if states.contains_key(key) {
            return;
        }
        let state = WalletState {
            next_action_index: 0,
            total_actions: 0,
            actions_today: 0,
            last_action_date: today,
            last_success_date: None,
            is_slow_wallet: rng.gen_bool(config.slow_wallet_ratio),
            daily_action_limit: rng.gen_range(config.daily_limit_min..=config.daily_limit_max),
            consecutive_failures: 0,
            is_initialized: false,
            funded_by,
        };
        states.insert(key.to_string(), state);
    }

    pub async fn get(&self, key: &str) -> Option<WalletState> {
        self.states.read().await.get(key).cloned()
    }

    /// Run `f` against the wallet's record under the write lock.
    pub async fn with_state_mut<R>(
        &self,
        key: &str,
        f: impl FnOnce(&mut WalletState) -> R,
    ) -> OperatorResult<R> {
        let mut states = self.states.write().await;
        let state = states
            .get_mut(key)
            .ok_or_else(|| OperatorError::UnknownWallet(key.to_string()))?;
        Ok(f(state))
    }

    /// Record a successful action: advance the cursor modulo the catalog,
    /// bump counters, clear the failure streak.
    pub async fn record_success(
        &self,
        key: &str,
        catalog_len: usize,
        today: NaiveDate,
    ) -> OperatorResult<()> {
        self.with_state_mut(key, |state| {
            state.next_action_index = (state.next_action_index + 1) % catalog_len;
            state.total_actions += 1;
            state.actions_today += 1;
            state.last_success_date = Some(today);
            state.consecutive_failures = 0;
            state.is_initialized = true;
        })
        .await
    }

    /// Record a failed attempt. Cursor and success counters stay put so the
    /// same action is retried on the wallet's next eligible turn.
    pub async fn record_failure(&self, key: &str) -> OperatorResult<()> {
        self.with_state_mut(key, |state| {
            state.consecutive_failures += 1;
        })
        .await
    }

    /// Write the full snapshot. Failure here is logged by the caller and
    /// retried on the next mutating event or flush tick.
    pub async fn flush(&self) -> OperatorResult<()> {
        let serialized = {
            let states = self.states.read().await;
            serde_json::to_vec_pretty(&*states)
                .map_err(|e| OperatorError::Persistence(e.to_string()))?
        };
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| OperatorError::Persistence(e.to_string()))?;
        }
        tokio::fs::write(&self.path, serialized)
            .await
            .map_err(|e| OperatorError::Persistence(format!("{}: {e}", self.path.display())))
    }

    pub async fn len(&self) -> usize {
        self.states.read().await.len()
    }

    pub async fn snapshot(&self) -> HashMap<String, WalletState> {
        self.states.read().await.clone()
    }
}
