//! In-process query cache with a centrally defined key registry.
//!
//! Pages read through the cache and mutation endpoints invalidate it, so the
//! key shapes used by both sides must match. [CacheKey] is the single source
//! of truth for those shapes, and [MutationKind::invalidated_keys] is the
//! single table saying which keys each mutation invalidates. Cached entries
//! mirror database state and are always invalidated, never patched in place.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use serde::{Serialize, de::DeserializeOwned};

use crate::database_id::{AccountId, CategoryId, TransactionId};

/// The registry of cache key shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// The list of all accounts.
    Accounts,
    /// A single account by ID.
    Account(AccountId),
    /// The list of all categories.
    Categories,
    /// A single category by ID.
    Category(CategoryId),
    /// The default (unfiltered, first page) transaction listing.
    Transactions,
    /// A single transaction by ID.
    Transaction(TransactionId),
    /// The dashboard summary aggregate.
    Summary,
}

/// A write operation, used to look up which cache keys it invalidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    CreateAccount,
    UpdateAccount(AccountId),
    DeleteAccount(AccountId),
    CreateCategory,
    UpdateCategory(CategoryId),
    DeleteCategory(CategoryId),
    CreateTransaction,
    BulkCreateTransactions,
    UpdateTransaction(TransactionId),
    DeleteTransaction(TransactionId),
}

impl MutationKind {
    /// The exact set of cache keys a successful mutation of this kind must
    /// invalidate.
    ///
    /// Account and category edits and deletes also invalidate the transaction
    /// listing: deleting an account cascades to its transactions, deleting a
    /// category nulls out the category column, and renames change the names
    /// shown in the joined listing.
    // TODO: transaction mutations should also invalidate Summary. The
    // dashboard currently serves a stale summary until its cache entry is
    // dropped for another reason.
    pub fn invalidated_keys(self) -> Vec<CacheKey> {
        match self {
            MutationKind::CreateAccount => vec![CacheKey::Accounts],
            MutationKind::UpdateAccount(id) | MutationKind::DeleteAccount(id) => {
                vec![
                    CacheKey::Accounts,
                    CacheKey::Account(id),
                    CacheKey::Transactions,
                ]
            }
            MutationKind::CreateCategory => vec![CacheKey::Categories],
            MutationKind::UpdateCategory(id) | MutationKind::DeleteCategory(id) => {
                vec![
                    CacheKey::Categories,
                    CacheKey::Category(id),
                    CacheKey::Transactions,
                ]
            }
            MutationKind::CreateTransaction | MutationKind::BulkCreateTransactions => {
                vec![CacheKey::Transactions]
            }
            MutationKind::UpdateTransaction(id) | MutationKind::DeleteTransaction(id) => {
                vec![CacheKey::Transactions, CacheKey::Transaction(id)]
            }
        }
    }
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: HashMap<CacheKey, serde_json::Value>,
    invalidation_counts: HashMap<CacheKey, u64>,
}

/// A thread-safe cache of query results, keyed by [CacheKey].
///
/// Values are stored as JSON so one map can hold the different row types.
/// A value that fails to serialize or deserialize is treated as a cache miss
/// rather than an error, since the database remains the source of truth.
#[derive(Debug, Clone, Default)]
pub struct QueryCache {
    inner: Arc<Mutex<CacheInner>>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up the cached value for `key`.
    pub fn get<T: DeserializeOwned>(&self, key: CacheKey) -> Option<T> {
        let inner = self.lock();

        inner
            .entries
            .get(&key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    /// Store `value` under `key`, replacing any previous entry.
    pub fn put<T: Serialize>(&self, key: CacheKey, value: &T) {
        let serialized = match serde_json::to_value(value) {
            Ok(serialized) => serialized,
            Err(error) => {
                tracing::error!("could not serialize cache entry for {key:?}: {error}");
                return;
            }
        };

        self.lock().entries.insert(key, serialized);
    }

    /// Drop every cache entry `mutation` affects.
    ///
    /// Callers must invoke this exactly once per successful mutation and must
    /// not invoke it when the mutation failed.
    pub fn invalidate(&self, mutation: MutationKind) {
        let keys = mutation.invalidated_keys();
        tracing::debug!("invalidating cache keys {keys:?} for {mutation:?}");

        let mut inner = self.lock();

        for key in keys {
            inner.entries.remove(&key);
            *inner.invalidation_counts.entry(key).or_insert(0) += 1;
        }
    }

    /// How many times `key` has been invalidated since start-up.
    pub fn invalidation_count(&self, key: CacheKey) -> u64 {
        self.lock()
            .invalidation_counts
            .get(&key)
            .copied()
            .unwrap_or(0)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        // A poisoned cache only means a panic mid-insert. The entries map is
        // still valid JSON values, so recover the guard instead of failing
        // the request.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
