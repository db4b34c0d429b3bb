use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::debug;
use uuid::Uuid;

/// A typed row store keyed by id.
///
/// Readers take a shared lock; every write replaces rows under an exclusive
/// lock, so a row is either fully old or fully new and a bulk `insert` is
/// observed all-or-nothing.
pub struct Collection<T> {
    rows: RwLock<HashMap<Uuid, T>>,
}

impl<T: Clone> Collection<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }

    pub async fn get(&self, id: &Uuid) -> Option<T> {
        self.rows.read().await.get(id).cloned()
    }

    pub async fn contains(&self, id: &Uuid) -> bool {
        self.rows.read().await.contains_key(id)
    }

    /// Insert or overwrite the row stored under `id`.
    pub async fn insert(&self, id: Uuid, row: T) {
        self.rows.write().await.insert(id, row);
    }

    /// Apply `f` to the stored row in place, returning the updated copy.
    pub async fn update<F>(&self, id: &Uuid, f: F) -> Option<T>
    where
        F: FnOnce(&mut T),
    {
        let mut rows = self.rows.write().await;
        let row = rows.get_mut(id)?;
        f(row);
        Some(row.clone())
    }

    pub async fn remove(&self, id: &Uuid) -> Option<T> {
        self.rows.write().await.remove(id)
    }

    pub async fn filter<P>(&self, pred: P) -> Vec<T>
    where
        P: Fn(&T) -> bool,
    {
        self.rows
            .read()
            .await
            .values()
            .filter(|row| pred(row))
            .cloned()
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.rows.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rows.read().await.is_empty()
    }
}

impl<T: Clone> Default for Collection<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-key mutual exclusion for read-check-write sequences.
///
/// Holding the guard for a doctor id makes "fetch busy intervals, validate,
/// insert" one isolated unit for that doctor; operations on other keys are
/// untouched.
pub struct LockRegistry {
    locks: Mutex<HashMap<Uuid, Arc<Mutex<()>>>>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn acquire(&self, key: Uuid) -> OwnedMutexGuard<()> {
        let entry = {
            let mut locks = self.locks.lock().await;
            Arc::clone(locks.entry(key).or_default())
        };
        debug!("Acquiring serialization lock for key {}", key);
        entry.lock_owned().await
    }
}

impl Default for LockRegistry {
    fn default() -> Self {
        Self::new()
    }
}
