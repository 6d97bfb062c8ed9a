//! Transaction cache with fixed expiry.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use log::*;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::transaction::Transaction;

/// Grace period on top of the session timeout before an entry is evicted.
pub const EXPIRY_GRACE: Duration = Duration::from_secs(1);

struct Entry {
    transaction: Arc<Transaction>,
    expires_at: Instant,
}

/// Concurrent store of live transactions.
///
/// Every entry expires a fixed time after insertion regardless of how often it is read.
/// Operations on different keys only contend when they hash to the same shard; the
/// per-key collect locks serialize polling of a single order.
pub struct TransactionCache {
    entries: DashMap<String, Entry>,
    collect_locks: DashMap<String, Arc<Mutex<()>>>,
    ttl: Duration,
}

impl TransactionCache {
    /// Create a cache whose entries live for `ttl`.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            collect_locks: DashMap::new(),
            ttl,
        }
    }

    /// Create a cache for orders that time out after `session_timeout`.
    pub fn for_session_timeout(session_timeout: Duration) -> Self {
        Self::new(session_timeout + EXPIRY_GRACE)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Insert a transaction, replacing any entry under the same key.
    pub fn put(&self, key: &str, transaction: Transaction) {
        let expires_at = Instant::now() + self.ttl;
        self.entries.insert(
            key.to_string(),
            Entry {
                transaction: Arc::new(transaction),
                expires_at,
            },
        );
    }

    /// Get a live transaction. Expired entries are removed and reported as absent.
    pub fn get(&self, key: &str) -> Option<Arc<Transaction>> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if entry.expires_at > now {
                return Some(Arc::clone(&entry.transaction));
            }
        } else {
            return None;
        }

        // Guard from `get` is released before taking the shard write lock.
        if self
            .entries
            .remove_if(key, |_, entry| entry.expires_at <= now)
            .is_some()
        {
            debug!("Evicted expired transaction on read");
            self.collect_locks.remove(key);
        }
        None
    }

    /// Remove a transaction, returning it if it was still live.
    pub fn delete(&self, key: &str) -> Option<Arc<Transaction>> {
        let now = Instant::now();
        self.collect_locks.remove(key);
        self.entries
            .remove(key)
            .filter(|(_, entry)| entry.expires_at > now)
            .map(|(_, entry)| entry.transaction)
    }

    /// Acquire the collect lock for `key`.
    ///
    /// Held for the duration of one collect call so a single order never has two
    /// requests in flight.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let lock = self
            .collect_locks
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        lock.lock_owned().await
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.expires_at > now);
        self.collect_locks
            .retain(|key, _| self.entries.contains_key(key));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Periodically purge expired entries for the life of the process.
    pub fn spawn_sweeper(self: Arc<Self>, interval: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let removed = self.purge_expired();
                if removed > 0 {
                    debug!("Purged {} expired BankID transaction(s)", removed);
                }
            }
        })
    }
}
