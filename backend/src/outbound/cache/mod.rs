//! Read-through cache decorating the product repository.
//!
//! Products are read on every availability check, sale, and GRN but change
//! rarely. Lookups by id are served from a bounded `moka` cache; every write
//! goes to the inner repository first and then drops the cached entry.
//! Listings are never cached. Stock is never cached because it changes on
//! every sale and receipt.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use moka::sync::Cache;
use pagination::PageRequest;
use tracing::debug;

use crate::domain::ports::{ListSlice, ProductFilter, ProductRepository, RepositoryError};
use crate::domain::{Product, ProductId};

/// Hit and miss totals since construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CacheStats {
    /// Lookups served from the cache.
    pub hits: u64,
    /// Lookups forwarded to the inner repository.
    pub misses: u64,
}

/// Bounded product cache in front of another [`ProductRepository`].
pub struct CachedProductRepository {
    inner: Arc<dyn ProductRepository>,
    entries: Cache<ProductId, Product>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CachedProductRepository {
    /// Cache at most `capacity` products read from `inner`.
    pub fn new(inner: Arc<dyn ProductRepository>, capacity: u64) -> Self {
        Self {
            inner,
            entries: Cache::new(capacity),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    fn invalidate(&self, id: ProductId) {
        self.entries.invalidate(&id);
        debug!(product_id = %id, "product cache entry invalidated");
    }
}

#[async_trait]
impl ProductRepository for CachedProductRepository {
    async fn create(&self, product: &Product) -> Result<(), RepositoryError> {
        self.inner.create(product).await?;
        self.invalidate(product.id);
        Ok(())
    }

    async fn update(&self, product: &Product) -> Result<(), RepositoryError> {
        self.inner.update(product).await?;
        self.invalidate(product.id);
        Ok(())
    }

    async fn find(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        if let Some(product) = self.entries.get(&id) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(product));
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let CacheStats { hits, misses } = self.stats();
        debug!(product_id = %id, hits, misses, "product cache miss");
        let found = self.inner.find(id).await?;
        if let Some(product) = &found {
            self.entries.insert(id, product.clone());
        }
        Ok(found)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<Product>, RepositoryError> {
        self.inner.find_by_name(name).await
    }

    async fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Product>, RepositoryError> {
        self.inner.list(filter, page).await
    }

    async fn all(&self) -> Result<Vec<Product>, RepositoryError> {
        self.inner.all().await
    }
}

#[cfg(test)]
mod tests {
    //! Hit, miss, and invalidation behaviour.

    use std::io;
    use std::sync::Mutex;

    use chrono::Utc;
    use rstest::{fixture, rstest};
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::domain::ports::MockProductRepository;

    /// Collects formatted log lines in memory.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().expect("log buffer")).into_owned()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0
                .lock()
                .map_err(|_| io::Error::other("log buffer poisoned"))?
                .extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = Self;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    #[fixture]
    fn product() -> Product {
        Product {
            id: ProductId::random(),
            name: "Paracetamol 500mg".to_owned(),
            generic_name: Some("Paracetamol".to_owned()),
            manufacturer: None,
            unit: "tablet".to_owned(),
            reorder_level: 50,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    #[tokio::test]
    async fn second_find_is_served_from_cache(product: Product) {
        let mut inner = MockProductRepository::new();
        let stored = product.clone();
        inner
            .expect_find()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));
        let cache = CachedProductRepository::new(Arc::new(inner), 16);

        let first = cache.find(product.id).await.expect("first");
        let second = cache.find(product.id).await.expect("second");

        assert_eq!(first, second);
        assert_eq!(cache.stats(), CacheStats { hits: 1, misses: 1 });
    }

    #[rstest]
    #[tokio::test]
    async fn update_drops_the_cached_entry(product: Product) {
        let mut inner = MockProductRepository::new();
        let stored = product.clone();
        inner
            .expect_find()
            .times(2)
            .returning(move |_| Ok(Some(stored.clone())));
        inner.expect_update().times(1).returning(|_| Ok(()));
        let cache = CachedProductRepository::new(Arc::new(inner), 16);

        cache.find(product.id).await.expect("warm");
        cache.update(&product).await.expect("update");
        cache.find(product.id).await.expect("reload");

        assert_eq!(cache.stats(), CacheStats { hits: 0, misses: 2 });
    }

    #[rstest]
    #[tokio::test]
    async fn failed_write_keeps_the_entry(product: Product) {
        let mut inner = MockProductRepository::new();
        let stored = product.clone();
        inner
            .expect_find()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));
        inner
            .expect_update()
            .returning(|_| Err(RepositoryError::conflict("name taken")));
        let cache = CachedProductRepository::new(Arc::new(inner), 16);

        cache.find(product.id).await.expect("warm");
        assert!(cache.update(&product).await.is_err());
        cache.find(product.id).await.expect("cached");

        assert_eq!(cache.stats().hits, 1);
    }

    #[rstest]
    #[tokio::test]
    async fn misses_for_unknown_products_are_not_cached() {
        let mut inner = MockProductRepository::new();
        inner.expect_find().times(2).returning(|_| Ok(None));
        let cache = CachedProductRepository::new(Arc::new(inner), 16);
        let id = ProductId::random();

        assert!(cache.find(id).await.expect("find").is_none());
        assert!(cache.find(id).await.expect("find").is_none());
        assert_eq!(cache.stats().misses, 2);
    }

    #[rstest]
    #[tokio::test]
    async fn misses_log_the_running_counters(product: Product) {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        let _default = tracing::subscriber::set_default(subscriber);

        let mut inner = MockProductRepository::new();
        let stored = product.clone();
        inner
            .expect_find()
            .times(1)
            .returning(move |_| Ok(Some(stored.clone())));
        let cache = CachedProductRepository::new(Arc::new(inner), 16);
        cache.find(product.id).await.expect("miss");
        cache.find(product.id).await.expect("hit");

        let output = logs.contents();
        assert!(output.contains("product cache miss"), "{output}");
        assert!(output.contains("hits=0 misses=1"), "{output}");
        assert_eq!(output.matches("product cache miss").count(), 1, "{output}");
    }
}
