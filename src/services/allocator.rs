use crate::alias::AliasFactory;
use crate::config::AliasConfig;
use crate::error::{AppError, AppResult, ConflictField};
use crate::models::ShortUrlRecord;
use crate::store::RecordStore;
use crate::target::TargetUrl;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Result of `get_or_create_alias`
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    pub record: ShortUrlRecord,
    /// `false` when the target was already registered
    pub created: bool,
}

impl Allocation {
    pub fn alias(&self) -> &str {
        &self.record.alias
    }
}

/// Maps target URLs to aliases.
///
/// Keeps no mutable state between calls; uniqueness relies on the store's
/// constraints, and a lost insert race is resolved by retrying or by
/// adopting the winner's record.
#[derive(Clone)]
pub struct AliasAllocator {
    store: Arc<dyn RecordStore>,
    factory: AliasFactory,
    max_attempts: u32,
    conflict_warn_limit: u32,
}

impl AliasAllocator {
    pub fn new(store: Arc<dyn RecordStore>, config: &AliasConfig) -> AppResult<Self> {
        let factory = AliasFactory::new(&config.alphabet, config.min_len, config.max_len)?;

        Ok(Self {
            store,
            factory,
            max_attempts: config.max_attempts,
            conflict_warn_limit: config.conflict_warn_limit,
        })
    }

    pub fn factory(&self) -> &AliasFactory {
        &self.factory
    }

    /// Return the alias registered for `target`, registering it if needed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::AllocationExhausted` when every generated candidate
    /// collided with an existing alias.
    pub async fn get_or_create_alias(&self, target: &TargetUrl) -> AppResult<Allocation> {
        if let Some(record) = self.store.find_by_target(target.as_str()).await? {
            debug!(alias = %record.alias, target = %target, "Reusing existing alias");
            return Ok(Allocation {
                record,
                created: false,
            });
        }

        let mut collisions = 0u32;

        for attempt in 1..=self.max_attempts {
            let candidate = self.factory.create_random();

            if self.store.exists_alias(&candidate).await? {
                collisions += 1;
                debug!(attempt, alias = %candidate, "Generated alias already taken");
                continue;
            }

            match self.store.insert(&candidate, target.as_str()).await {
                Ok(record) => {
                    self.report_collisions(collisions);
                    return Ok(Allocation {
                        record,
                        created: true,
                    });
                }
                Err(AppError::UniqueConflict(ConflictField::Alias)) => {
                    collisions += 1;
                    debug!(attempt, alias = %candidate, "Lost alias insert race");
                }
                Err(AppError::UniqueConflict(ConflictField::Target)) => {
                    self.report_collisions(collisions);
                    return self.adopt_concurrent_registration(target).await;
                }
                Err(e) => return Err(e),
            }
        }

        error!(
            attempts = self.max_attempts,
            min_len = self.factory.min_length(),
            max_len = self.factory.max_length(),
            "Could not find a free alias"
        );
        Err(AppError::AllocationExhausted(self.max_attempts))
    }

    /// Another request registered the same target first; return its record
    async fn adopt_concurrent_registration(&self, target: &TargetUrl) -> AppResult<Allocation> {
        let record = self
            .store
            .find_by_target(target.as_str())
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Target {} conflicted on insert but cannot be found",
                    target
                ))
            })?;

        debug!(alias = %record.alias, target = %target, "Adopted concurrent registration");
        Ok(Allocation {
            record,
            created: false,
        })
    }

    fn report_collisions(&self, collisions: u32) {
        if collisions > self.conflict_warn_limit {
            warn!(
                "Number of alias collisions exceeds the limit: {} > {}",
                collisions, self.conflict_warn_limit
            );
        }
    }

    /// Look up the record for a user-supplied alias.
    ///
    /// The alias is normalized first, so a homoglyph typed in place of an
    /// alphabet character still resolves.
    pub async fn resolve(&self, alias: &str) -> AppResult<ShortUrlRecord> {
        let normalized = self
            .factory
            .from_string(alias)
            .map_err(|_| AppError::AliasNotFound(alias.to_string()))?;

        self.store
            .find_by_alias(&normalized)
            .await?
            .ok_or_else(|| AppError::AliasNotFound(alias.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MockRecordStore;
    use chrono::Utc;
    use std::sync::atomic::{AtomicU32, Ordering};

    const TARGET: &str = "https://example.com/a";

    fn config(max_attempts: u32) -> AliasConfig {
        AliasConfig {
            min_len: 4,
            max_len: 6,
            alphabet: "abcdefghijklmnopqrstuvwxyz0123456789".to_string(),
            max_attempts,
            conflict_warn_limit: 3,
        }
    }

    fn record(alias: &str, target: &str) -> ShortUrlRecord {
        ShortUrlRecord {
            id: 1,
            alias: alias.to_string(),
            target_url: target.to_string(),
            is_flagged: false,
            created_at: Utc::now(),
        }
    }

    fn allocator(store: MockRecordStore, max_attempts: u32) -> AliasAllocator {
        AliasAllocator::new(Arc::new(store), &config(max_attempts)).unwrap()
    }

    fn target() -> TargetUrl {
        TargetUrl::parse(TARGET).unwrap()
    }

    #[tokio::test]
    async fn test_existing_target_is_reused_without_insert() {
        let mut store = MockRecordStore::new();
        store
            .expect_find_by_target()
            .withf(|t| t == TARGET)
            .times(1)
            .returning(|t| Ok(Some(record("a1c2", t))));
        store.expect_exists_alias().never();
        store.expect_insert().never();

        let allocation = allocator(store, 10)
            .get_or_create_alias(&target())
            .await
            .unwrap();

        assert_eq!(allocation.alias(), "a1c2");
        assert!(!allocation.created);
    }

    #[tokio::test]
    async fn test_taken_alias_is_regenerated() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let mut store = MockRecordStore::new();
        store.expect_find_by_target().returning(|_| Ok(None));
        store
            .expect_exists_alias()
            .returning(move |_| Ok(counter.fetch_add(1, Ordering::SeqCst) < 2));
        store
            .expect_insert()
            .times(1)
            .returning(|alias, target| Ok(record(alias, target)));

        let allocation = allocator(store, 10)
            .get_or_create_alias(&target())
            .await
            .unwrap();

        assert!(allocation.created);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_alias_insert_conflict_is_retried() {
        let inserts = Arc::new(AtomicU32::new(0));
        let counter = inserts.clone();

        let mut store = MockRecordStore::new();
        store.expect_find_by_target().returning(|_| Ok(None));
        store.expect_exists_alias().returning(|_| Ok(false));
        store.expect_insert().returning(move |alias, target| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(AppError::UniqueConflict(ConflictField::Alias))
            } else {
                Ok(record(alias, target))
            }
        });

        let allocation = allocator(store, 10)
            .get_or_create_alias(&target())
            .await
            .unwrap();

        assert!(allocation.created);
        assert_eq!(inserts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_target_conflict_adopts_winner() {
        let lookups = Arc::new(AtomicU32::new(0));
        let counter = lookups.clone();

        let mut store = MockRecordStore::new();
        store.expect_find_by_target().returning(move |t| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(None)
            } else {
                Ok(Some(record("w1nr", t)))
            }
        });
        store.expect_exists_alias().returning(|_| Ok(false));
        store
            .expect_insert()
            .times(1)
            .returning(|_, _| Err(AppError::UniqueConflict(ConflictField::Target)));

        let allocation = allocator(store, 10)
            .get_or_create_alias(&target())
            .await
            .unwrap();

        assert_eq!(allocation.alias(), "w1nr");
        assert!(!allocation.created);
    }

    #[tokio::test]
    async fn test_exhaustion() {
        let mut store = MockRecordStore::new();
        store.expect_find_by_target().returning(|_| Ok(None));
        store.expect_exists_alias().times(5).returning(|_| Ok(true));
        store.expect_insert().never();

        let result = allocator(store, 5).get_or_create_alias(&target()).await;

        assert!(matches!(result, Err(AppError::AllocationExhausted(5))));
    }

    #[tokio::test]
    async fn test_store_errors_propagate() {
        let mut store = MockRecordStore::new();
        store.expect_find_by_target().returning(|_| Ok(None));
        store.expect_exists_alias().returning(|_| Ok(false));
        store
            .expect_insert()
            .times(1)
            .returning(|_, _| Err(AppError::Internal("disk on fire".to_string())));

        let result = allocator(store, 10).get_or_create_alias(&target()).await;

        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_generated_aliases_fit_configuration() {
        let mut store = MockRecordStore::new();
        store.expect_find_by_target().returning(|_| Ok(None));
        store.expect_exists_alias().returning(|_| Ok(false));
        store
            .expect_insert()
            .returning(|alias, target| Ok(record(alias, target)));

        let allocator = allocator(store, 10);
        let alphabet = config(10).alphabet;

        for _ in 0..100 {
            let allocation = allocator.get_or_create_alias(&target()).await.unwrap();
            let len = allocation.alias().chars().count();
            assert!((4..=6).contains(&len));
            assert!(allocation.alias().chars().all(|c| alphabet.contains(c)));
        }
    }

    #[tokio::test]
    async fn test_resolve_normalizes_alias() {
        let mut store = MockRecordStore::new();
        store
            .expect_find_by_alias()
            .withf(|alias| alias == "a611")
            .returning(|alias| Ok(Some(record(alias, TARGET))));

        let record = allocator(store, 10).resolve("abl1").await.unwrap();
        assert_eq!(record.target_url, TARGET);
    }

    #[tokio::test]
    async fn test_resolve_unknown_and_malformed() {
        let mut store = MockRecordStore::new();
        store.expect_find_by_alias().returning(|_| Ok(None));

        let allocator = allocator(store, 10);
        assert!(matches!(
            allocator.resolve("zzzz").await,
            Err(AppError::AliasNotFound(_))
        ));
        assert!(matches!(
            allocator.resolve("no/such").await,
            Err(AppError::AliasNotFound(_))
        ));
    }
}
