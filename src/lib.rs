// src/lib.rs
pub mod codec;
pub mod config;
pub mod error;
pub mod gateway;
pub mod oplog;
pub mod pool;
pub mod scheduler;
pub mod state;
pub mod types;

use crate::config::OperatorConfig;
use crate::error::OperatorResult;
use crate::gateway::LedgerGateway;
use crate::oplog::OperationLog;
use crate::pool::WalletPool;
use crate::scheduler::Scheduler;
use crate::state::StateStore;
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::sync::Arc;
use tokio::time::Duration;

/// The fully wired operator: wallet pool, durable state, gateway and
/// scheduler, constructed once at startup and owning all shared context.
pub struct Operator {
    config: OperatorConfig,
    pool: Arc<WalletPool>,
    store: Arc<StateStore>,
    scheduler: Arc<Scheduler>,
}

impl Operator {
    pub fn bootstrap(
        config: OperatorConfig,
        gateway: Arc<dyn LedgerGateway>,
    ) -> OperatorResult<Self> {
        config.validate()?;

        // One seeded source for everything random: pool generation first,
        // then wallet-state draws inside the scheduler.
        let seed = config.rng_seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);

        let pool = Arc::new(WalletPool::load_or_generate(
            &config.wallets_path(),
            config.fund_wallet_count,
            config.child_wallet_count,
            &mut rng,
        )?);
        let store = Arc::new(StateStore::load(config.state_path())?);
        let oplog = Arc::new(OperationLog::open(&config.logs_dir)?);
        let scheduler = Arc::new(Scheduler::new(
            config.clone(),
            pool.clone(),
            store.clone(),
            gateway,
            oplog,
            rng,
        )?);

        Ok(Self {
            config,
            pool,
            store,
            scheduler,
        })
    }

    pub fn pool(&self) -> &WalletPool {
        &self.pool
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Tick the scheduler on a fixed cadence and snapshot state on a timer
    /// until `shutdown` fires, then write a final snapshot.
    pub async fn run(
        &self,
        mut shutdown: tokio::sync::watch::Receiver<bool>,
    ) -> OperatorResult<()> {
        let mut tick = tokio::time::interval(Duration::from_millis(self.config.tick_interval_ms));
        let mut flush = tokio::time::interval(Duration::from_secs(self.config.flush_interval_secs));

        tracing::info!(
            wallets = self.pool.child_count(),
            max_concurrent = self.config.max_concurrent_wallets,
            "operator running"
        );
        loop {
            tokio::select! {
                _ = tick.tick() => self.scheduler.tick().await,
                _ = flush.tick() => {
                    if let Err(e) = self.store.flush().await {
                        tracing::warn!(error = %e, "periodic state flush failed");
                    }
                }
                _ = shutdown.changed() => break,
            }
        }

        tracing::info!("shutting down, writing final snapshot");
        self.store.flush().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::SimulatedGateway;

    fn test_config(dir: &std::path::Path) -> OperatorConfig {
        let mut config = OperatorConfig::default();
        config.fund_wallet_count = 2;
        config.child_wallet_count = 4;
        config.slow_wallet_ratio = 0.0;
        config.daily_limit_min = 10;
        config.daily_limit_max = 10;
        config.polling_interval_ms = 1;
        config.rng_seed = Some(5);
        config.data_dir = dir.join("data");
        config.logs_dir = dir.join("logs");
        config
    }

    #[tokio::test]
    async fn test_bootstrap_and_progress_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());
        let operator =
            Operator::bootstrap(config, Arc::new(SimulatedGateway::reliable(3))).unwrap();

        let keys: Vec<String> = operator.pool().child_keys();
        for _ in 0..4 {
            operator.scheduler().tick().await;
        }
        // wait for the spawned actions to finish
        for _ in 0..500 {
            if operator.scheduler().active_count().await == 0
                && operator.scheduler().queue_len().await == keys.len()
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        let total: u64 = {
            let mut sum = 0;
            for key in &keys {
                sum += operator.store().get(key).await.map_or(0, |s| s.total_actions);
            }
            sum
        };
        assert_eq!(total, 4);
    }

    #[tokio::test]
    async fn test_second_bootstrap_reuses_pool_and_state() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config(dir.path());

        let first =
            Operator::bootstrap(config.clone(), Arc::new(SimulatedGateway::reliable(3))).unwrap();
        let keys = first.pool().child_keys();
        first.scheduler().tick().await;
        for _ in 0..500 {
            if first.scheduler().active_count().await == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        let snapshot = first.store().snapshot().await;
        drop(first);

        let second =
            Operator::bootstrap(config, Arc::new(SimulatedGateway::reliable(3))).unwrap();
        assert_eq!(second.pool().child_keys(), keys);
        assert_eq!(second.store().snapshot().await, snapshot);
    }
}
