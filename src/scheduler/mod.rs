// src/scheduler/mod.rs
//
// Bounded-concurrency rotation over the wallet pool. Wallets live in a FIFO
// queue; each tick pops one, gates it through the throttle policy, and
// dispatches at most one action. A wallet is in exactly one place at a time:
// the queue, the active set, or the hands of the tick that popped it.
pub mod catalog;
pub mod throttle;


pub use catalog::{Action, build_catalog};
pub use throttle::{DenyReason, ThrottleDecision, ThrottlePolicy};

use crate::config::OperatorConfig;
use crate::error::{OperatorError, OperatorResult};
use crate::gateway::LedgerGateway;
use crate::oplog::OperationLog;
use crate::pool::WalletPool;
use crate::state::StateStore;
use crate::types::WalletIdentity;
use chrono::{NaiveDate, Utc};
use rand::rngs::StdRng;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::time::Duration;
use uuid::Uuid;

pub struct Scheduler {
    inner: Arc<Inner>,
}

struct Inner {
    config: OperatorConfig,
    catalog: Vec<Action>,
    pool: Arc<WalletPool>,
    store: Arc<StateStore>,
    gateway: Arc<dyn LedgerGateway>,
    oplog: Arc<OperationLog>,
    throttle: ThrottlePolicy,
    queue: Mutex<VecDeque<String>>,
    active: Mutex<HashSet<String>>,
    rng: Mutex<StdRng>,
}

impl Scheduler {
    pub fn new(
        config: OperatorConfig,
        pool: Arc<WalletPool>,
        store: Arc<StateStore>,
        gateway: Arc<dyn LedgerGateway>,
        oplog: Arc<OperationLog>,
        rng: StdRng,
    ) -> OperatorResult<Self> {
        let catalog = catalog::build_catalog(&config)?;
        let throttle = ThrottlePolicy::new(&config);
        let queue = Mutex::new(VecDeque::from(pool.child_keys()));

        Ok(Self {
            inner: Arc::new(Inner {
                config,
                catalog,
                pool,
                store,
                gateway,
                oplog,
                throttle,
                queue,
                active: Mutex::new(HashSet::new()),
                rng: Mutex::new(rng),
            }),
        })
    }

    pub async fn tick(&self) {
        self.tick_on(Utc::now().date_naive()).await;
    }

    /// One scheduling step for the given calendar date. Processes the head
    /// of the rotation queue; a drained queue is a no-op, not an error.
    pub async fn tick_on(&self, today: NaiveDate) {
        let key = {
            let mut queue = self.inner.queue.lock().await;
            match queue.pop_front() {
                Some(key) => key,
                None => return,
            }
        };

        // Mid-action wallets go straight back: one outstanding action per
        // wallet, always.
        if self.inner.active.lock().await.contains(&key) {
            self.requeue(key).await;
            return;
        }

        let funded_by = self
            .inner
            .pool
            .funding_parent(&key)
            .map(|w| w.public.clone());
        let decision = {
            let mut rng = self.inner.rng.lock().await;
            self.inner
                .store
                .ensure(&key, funded_by, today, &self.inner.config, &mut rng)
                .await;
            let throttle = &self.inner.throttle;
            self.inner
                .store
                .with_state_mut(&key, |state| throttle.evaluate(state, today, &mut rng))
                .await
        };
        match decision {
            Ok(ThrottleDecision::Allow) => {}
            Ok(ThrottleDecision::Deny(reason)) => {
                tracing::debug!(wallet = %key, reason = reason.as_str(), "throttled");
                self.requeue(key).await;
                return;
            }
            Err(e) => {
                tracing::warn!(wallet = %key, error = %e, "throttle evaluation failed");
                self.requeue(key).await;
                return;
            }
        }

        // Concurrency bound: a tick that would exceed it does not dispatch.
        {
            let mut active = self.inner.active.lock().await;
            if active.len() >= self.inner.config.max_concurrent_wallets {
                drop(active);
                self.requeue(key).await;
                return;
            }
            active.insert(key.clone());
        }

        let next_action_index = match self.inner.store.get(&key).await {
            Some(state) => state.next_action_index,
            None => {
                self.inner.active.lock().await.remove(&key);
                self.requeue(key).await;
                return;
            }
        };
        let action = self.inner.catalog[next_action_index].clone();
        let wallet = match self.inner.pool.child(&key) {
            Some(wallet) => wallet.clone(),
            None => {
                tracing::warn!(wallet = %key, "queued wallet missing from pool");
                self.inner.active.lock().await.remove(&key);
                return;
            }
        };

        let inner = self.inner.clone();
        tokio::spawn(async move {
            inner.run_action(key, wallet, action, today).await;
        });
    }

    async fn requeue(&self, key: String) {
        self.inner.queue.lock().await.push_back(key);
    }

    pub async fn active_count(&self) -> usize {
        self.inner.active.lock().await.len()
    }

    pub async fn queue_len(&self) -> usize {
        self.inner.queue.lock().await.len()
    }

    pub fn catalog_len(&self) -> usize {
        self.inner.catalog.len()
    }
}

impl Inner {
    /// Drive one dispatched action to its outcome, update durable state, and
    /// hand the wallet back to the rotation. The action failing, timing out
    /// or the snapshot write failing never escapes this function.
    async fn run_action(
        self: Arc<Self>,
        key: String,
        wallet: WalletIdentity,
        action: Action,
        today: NaiveDate,
    ) {
        let attempt = Uuid::new_v4();
        tracing::info!(wallet = %key, %attempt, action = action.kind(), "action dispatched");
        self.oplog
            .record(&format!("wallet {key} started {}", action.kind()));

        let timeout = Duration::from_secs(self.config.action_timeout_secs);
        let result = match tokio::time::timeout(
            timeout,
            catalog::execute(&action, &wallet, self.gateway.as_ref(), &self.config),
        )
        .await
        {
            Ok(result) => result,
            // a stalled remote call must not hold its concurrency slot
            Err(_) => Err(OperatorError::ActionTimeout(self.config.action_timeout_secs)),
        };

        match &result {
            Ok(tx_hash) => {
                if let Err(e) = self
                    .store
                    .record_success(&key, self.catalog.len(), today)
                    .await
                {
                    tracing::warn!(wallet = %key, error = %e, "success bookkeeping failed");
                }
                self.oplog
                    .record(&format!("wallet {key} {}", action.describe()));
                tracing::info!(wallet = %key, %attempt, tx = %tx_hash, "action succeeded");
            }
            Err(e) => {
                if let Err(e) = self.store.record_failure(&key).await {
                    tracing::warn!(wallet = %key, error = %e, "failure bookkeeping failed");
                }
                self.oplog
                    .record(&format!("wallet {key} failed {}: {e}", action.kind()));
                tracing::warn!(
                    wallet = %key,
                    %attempt,
                    action = action.kind(),
                    category = e.category(),
                    error = %e,
                    "action failed, will retry on next eligible turn"
                );
            }
        }

        // Snapshot after every mutating event. A miss costs at most one
        // replayed action, so the loop carries on.
        if let Err(e) = self.store.flush().await {
            tracing::warn!(error = %e, "state flush failed, retrying next cycle");
        }

        self.active.lock().await.remove(&key);
        self.queue.lock().await.push_back(key);
    }
}
