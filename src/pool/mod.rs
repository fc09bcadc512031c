// src/pool/mod.rs
//
// The pool of fund and child wallets the scheduler rotates through. Key
// material is generated once, saved beside the state snapshot and loaded on
// later runs; the core only ever holds references into the pool.
use crate::error::{OperatorError, OperatorResult};
use crate::types::WalletIdentity;
use rand::RngCore;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct StoredPool {
    fund_wallets: Vec<WalletIdentity>,
    child_wallets: Vec<WalletIdentity>,
}

pub struct WalletPool {
    fund_wallets: Vec<WalletIdentity>,
    child_wallets: Vec<WalletIdentity>,
    child_index: HashMap<String, usize>,
}

impl WalletPool {
    fn from_parts(fund_wallets: Vec<WalletIdentity>, child_wallets: Vec<WalletIdentity>) -> Self {
        let child_index = child_wallets
            .iter()
            .enumerate()
            .map(|(i, w)| (w.public.clone(), i))
            .collect();
        Self {
            fund_wallets,
            child_wallets,
            child_index,
        }
    }

    /// Generate a fresh pool of `fund_count` fund wallets and `child_count`
    /// child wallets from the operator's seeded randomness.
    pub fn generate(
        fund_count: usize,
        child_count: usize,
        rng: &mut StdRng,
    ) -> OperatorResult<Self> {
        let fund_wallets = generate_wallets(fund_count, rng)?;
        let child_wallets = generate_wallets(child_count, rng)?;
        tracing::info!(
            fund = fund_wallets.len(),
            children = child_wallets.len(),
            "generated wallet pool"
        );
        Ok(Self::from_parts(fund_wallets, child_wallets))
    }

    /// Load the pool saved at `path`, or generate and save a new one. Mirrors
    /// a cold start against a warm one.
    pub fn load_or_generate(
        path: &Path,
        fund_count: usize,
        child_count: usize,
        rng: &mut StdRng,
    ) -> OperatorResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => {
                let stored: StoredPool = serde_json::from_str(&raw)
                    .map_err(|e| OperatorError::WalletFile(format!("{}: {e}", path.display())))?;
                tracing::info!(path = %path.display(), "loaded wallet pool from file");
                Ok(Self::from_parts(stored.fund_wallets, stored.child_wallets))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let pool = Self::generate(fund_count, child_count, rng)?;
                pool.save(path)?;
                tracing::info!(path = %path.display(), "wallet pool generated and saved");
                Ok(pool)
            }
            Err(e) => Err(OperatorError::WalletFile(format!("{}: {e}", path.display()))),
        }
    }

    pub fn save(&self, path: &Path) -> OperatorResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| OperatorError::WalletFile(e.to_string()))?;
        }
        let stored = StoredPool {
            fund_wallets: self.fund_wallets.clone(),
            child_wallets: self.child_wallets.clone(),
        };
        let serialized = serde_json::to_vec_pretty(&stored)?;
        std::fs::write(path, serialized)
            .map_err(|e| OperatorError::WalletFile(format!("{}: {e}", path.display())))
    }

    pub fn child(&self, public: &str) -> Option<&WalletIdentity> {
        self.child_index
            .get(public)
            .map(|&i| &self.child_wallets[i])
    }

    /// Child identifiers in generation order; the scheduler's initial queue.
    pub fn child_keys(&self) -> Vec<String> {
        self.child_wallets.iter().map(|w| w.public.clone()).collect()
    }

    /// Fund wallet that seeds the given child, assigned round-robin.
    pub fn funding_parent(&self, child_public: &str) -> Option<&WalletIdentity> {
        if self.fund_wallets.is_empty() {
            return None;
        }
        let index = *self.child_index.get(child_public)?;
        Some(&self.fund_wallets[index % self.fund_wallets.len()])
    }

    pub fn fund_wallets(&self) -> &[WalletIdentity] {
        &self.fund_wallets
    }

    pub fn child_count(&self) -> usize {
        self.child_wallets.len()
    }
}

fn generate_wallets(count: usize, rng: &mut StdRng) -> OperatorResult<Vec<WalletIdentity>> {
    (0..count).map(|_| generate_wallet(rng)).collect()
}

fn generate_wallet(rng: &mut StdRng) -> OperatorResult<WalletIdentity> {
    use secp256k1::{PublicKey, Secp256k1, SecretKey};
    use tiny_keccak::{Hasher, Keccak};

    let secp = Secp256k1::new();

    // Almost every 32-byte string is a valid key; retry the rare miss.
    let secret_key = loop {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        if let Ok(key) = SecretKey::from_slice(&bytes) {
            break key;
        }
    };

    let public_key = PublicKey::from_secret_key(&secp, &secret_key);
    let public_key_bytes = public_key.serialize_uncompressed();

    // Address is the last 20 bytes of the keccak256 of the public key.
    let mut hasher = Keccak::v256();
    hasher.update(&public_key_bytes[1..]);
    let mut hash = [0u8; 32];
    hasher.finalize(&mut hash);

    Ok(WalletIdentity {
        public: format!("0x{}", hex::encode(&hash[12..])),
        secret: hex::encode(secret_key.secret_bytes()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn test_generate_counts_and_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = WalletPool::generate(3, 10, &mut rng).unwrap();
        assert_eq!(pool.fund_wallets().len(), 3);
        assert_eq!(pool.child_count(), 10);
        for key in pool.child_keys() {
            assert!(key.starts_with("0x"));
            assert_eq!(key.len(), 42);
        }
    }

    #[test]
    fn test_seeded_generation_is_reproducible() {
        let mut a = StdRng::seed_from_u64(11);
        let mut b = StdRng::seed_from_u64(11);
        let pool_a = WalletPool::generate(2, 4, &mut a).unwrap();
        let pool_b = WalletPool::generate(2, 4, &mut b).unwrap();
        assert_eq!(pool_a.child_keys(), pool_b.child_keys());
    }

    #[test]
    fn test_round_robin_funding_parent() {
        let mut rng = StdRng::seed_from_u64(7);
        let pool = WalletPool::generate(2, 5, &mut rng).unwrap();
        let keys = pool.child_keys();
        let parent0 = pool.funding_parent(&keys[0]).unwrap().public.clone();
        let parent2 = pool.funding_parent(&keys[2]).unwrap().public.clone();
        let parent1 = pool.funding_parent(&keys[1]).unwrap().public.clone();
        assert_eq!(parent0, parent2);
        assert_ne!(parent0, parent1);
    }

    #[test]
    fn test_save_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("wallets.json");
        let mut rng = StdRng::seed_from_u64(7);
        let pool = WalletPool::generate(2, 3, &mut rng).unwrap();
        pool.save(&path).unwrap();

        let reloaded = WalletPool::load_or_generate(&path, 9, 9, &mut rng).unwrap();
        assert_eq!(reloaded.child_keys(), pool.child_keys());
        assert_eq!(reloaded.fund_wallets().len(), 2);
    }
}
