use super::ObjectStore;
use std::time::Duration;
use tracing::warn;

/// Bounded retry with exponential backoff for presence probes.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

/// Answers "is this object there right now?" against the object store.
///
/// Transient store failures are retried with exponential backoff; after
/// exhaustion the probe resolves to Missing instead of propagating, since
/// an Incomplete classification is always recoverable on a later pass.
pub struct PresenceResolver<'a> {
    store: &'a dyn ObjectStore,
    policy: RetryPolicy,
}

impl<'a> PresenceResolver<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self {
            store,
            policy: RetryPolicy::default(),
        }
    }

    pub fn with_policy(store: &'a dyn ObjectStore, policy: RetryPolicy) -> Self {
        Self { store, policy }
    }

    /// Check whether the object at `key` currently exists. Never errors.
    pub async fn is_present(&self, key: &str) -> bool {
        let mut delay = self.policy.base_delay;
        for attempt in 1..=self.policy.attempts.max(1) {
            match self.store.exists(key).await {
                Ok(found) => return found,
                Err(err) if attempt < self.policy.attempts => {
                    warn!(%key, attempt, %err, "presence check failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
                Err(err) => {
                    warn!(%key, %err, "presence check exhausted retries, treating as missing");
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Store whose exists() fails a configured number of times first.
    struct FlakyStore {
        failures: AtomicU32,
        found: bool,
    }

    #[async_trait]
    impl ObjectStore for FlakyStore {
        async fn exists(&self, _key: &str) -> Result<bool, StoreError> {
            if self.failures.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |f| {
                if f > 0 {
                    Some(f - 1)
                } else {
                    None
                }
            }).is_ok()
            {
                return Err(StoreError::IoError(std::io::Error::other("transient")));
            }
            Ok(self.found)
        }

        async fn read(&self, key: &str) -> Result<Vec<u8>, StoreError> {
            Err(StoreError::NotFound(key.to_string()))
        }

        async fn write(&self, _key: &str, _data: &[u8]) -> Result<(), StoreError> {
            Ok(())
        }

        async fn rename(&self, _src: &str, _dst: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn delete(&self, _key: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn list(&self, _prefix: &str) -> Result<Vec<String>, StoreError> {
            Ok(Vec::new())
        }
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            attempts: 3,
            base_delay: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn test_recovers_after_transient_failure() {
        let store = FlakyStore {
            failures: AtomicU32::new(1),
            found: true,
        };
        let resolver = PresenceResolver::with_policy(&store, fast_policy());
        assert!(resolver.is_present("Drop/a.pdf").await);
    }

    #[tokio::test]
    async fn test_exhaustion_resolves_to_missing() {
        let store = FlakyStore {
            failures: AtomicU32::new(10),
            found: true,
        };
        let resolver = PresenceResolver::with_policy(&store, fast_policy());
        assert!(!resolver.is_present("Drop/a.pdf").await);
    }

    #[tokio::test]
    async fn test_missing_object_reports_missing() {
        let store = FlakyStore {
            failures: AtomicU32::new(0),
            found: false,
        };
        let resolver = PresenceResolver::with_policy(&store, fast_policy());
        assert!(!resolver.is_present("Drop/a.pdf").await);
    }
}
