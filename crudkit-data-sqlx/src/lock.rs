//! Process-local async write locks.
//!
//! Writers take the lock for a row before opening their session and keep it
//! until the session is released, so two read-modify-write cycles on the same
//! row never interleave. Locks are advisory: they do nothing across
//! processes.

use dashmap::DashMap;
use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// What a lock covers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LockGranularity {
    /// One lock per `(table, identifier)`.
    #[default]
    Identifier,
    /// One lock per table: all writes to an entity type are serialized.
    Entity,
}

impl fmt::Display for LockGranularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockGranularity::Identifier => f.write_str("identifier"),
            LockGranularity::Entity => f.write_str("entity"),
        }
    }
}

impl FromStr for LockGranularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "identifier" | "id" => Ok(LockGranularity::Identifier),
            "entity" | "table" => Ok(LockGranularity::Entity),
            other => Err(format!(
                "unknown lock granularity '{other}' (expected 'identifier' or 'entity')"
            )),
        }
    }
}

/// Registry of named async mutexes, created on demand.
///
/// An entry lives only while some task holds or waits for it; the last
/// [`LockGuard`] to go removes it.
#[derive(Clone, Default)]
pub struct LockRegistry {
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    granularity: LockGranularity,
}

impl LockRegistry {
    pub fn new(granularity: LockGranularity) -> Self {
        Self {
            locks: Arc::new(DashMap::new()),
            granularity,
        }
    }

    pub fn granularity(&self) -> LockGranularity {
        self.granularity
    }

    /// Wait for and take the write lock of row `id` in `table`.
    pub fn acquire<I: fmt::Display + ?Sized>(
        &self,
        table: &str,
        id: &I,
    ) -> impl Future<Output = LockGuard> + Send + '_ {
        let key = match self.granularity {
            LockGranularity::Identifier => format!("{table}:{id}"),
            LockGranularity::Entity => table.to_string(),
        };
        self.acquire_key(key)
    }

    async fn acquire_key(&self, key: String) -> LockGuard {
        let mutex = self.locks.entry(key.clone()).or_default().clone();
        let guard = mutex.lock_owned().await;
        tracing::trace!(lock = %key, "Lock acquired");
        LockGuard {
            key,
            locks: Arc::clone(&self.locks),
            guard: Some(guard),
        }
    }

    /// Number of live lock entries.
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl fmt::Debug for LockRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockRegistry")
            .field("granularity", &self.granularity)
            .field("live", &self.locks.len())
            .finish()
    }
}

/// Held write lock. Released on drop.
pub struct LockGuard {
    key: String,
    locks: Arc<DashMap<String, Arc<Mutex<()>>>>,
    guard: Option<OwnedMutexGuard<()>>,
}

impl LockGuard {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // the guard holds one reference; drop it before the count check
        self.guard.take();
        self.locks
            .remove_if(&self.key, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

impl fmt::Debug for LockGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockGuard").field("key", &self.key).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn entries_are_removed_after_release() {
        let registry = LockRegistry::default();
        let guard = registry.acquire("tests", &1).await;
        assert_eq!(guard.key(), "tests:1");
        assert_eq!(registry.len(), 1);
        drop(guard);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn different_identifiers_do_not_block() {
        let registry = LockRegistry::new(LockGranularity::Identifier);
        let _a = registry.acquire("tests", &1).await;
        let b = tokio::time::timeout(Duration::from_millis(100), registry.acquire("tests", &2)).await;
        assert!(b.is_ok());
    }

    #[tokio::test]
    async fn entity_granularity_serializes_the_table() {
        let registry = LockRegistry::new(LockGranularity::Entity);
        let a = registry.acquire("tests", &1).await;
        assert_eq!(a.key(), "tests");
        let b = tokio::time::timeout(Duration::from_millis(50), registry.acquire("tests", &2)).await;
        assert!(b.is_err());
    }

    #[tokio::test]
    async fn waiter_gets_lock_after_release() {
        let registry = LockRegistry::default();
        let first = registry.acquire("tests", &7).await;

        let waiter = {
            let registry = registry.clone();
            tokio::spawn(async move {
                let guard = registry.acquire("tests", &7).await;
                guard.key().to_string()
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(first);
        // the waiter still references the entry
        let key = waiter.await.unwrap();
        assert_eq!(key, "tests:7");
        assert!(registry.is_empty());
    }

    #[test]
    fn granularity_parsing() {
        assert_eq!("Entity".parse::<LockGranularity>(), Ok(LockGranularity::Entity));
        assert_eq!("identifier".parse::<LockGranularity>(), Ok(LockGranularity::Identifier));
        assert!("row".parse::<LockGranularity>().is_err());
    }
}
