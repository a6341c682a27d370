//! Loaded catalog collections.
//!
//! Collections are cached with `moka` (5-minute TTL). Concurrent loads of the
//! same collection are coalesced: the first caller fetches, later callers
//! await the same result. Every wait is bounded by the configured ready
//! timeout and fails with [`DataError::Timeout`] instead of retrying forever.
//!
//! The product list also drives a [`LoadState`] signal that readiness checks
//! read.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use thiserror::Error;
use tokio::sync::watch;

use catalog_desk_core::{Customer, Order, Product, ProductId};

use super::{CatalogError, CatalogReader};

const CACHE_TTL: Duration = Duration::from_secs(300);

/// Errors returned by [`CatalogData`].
#[derive(Debug, Error)]
pub enum DataError {
    /// The remote read failed.
    #[error("catalog read failed: {0}")]
    Catalog(Arc<CatalogError>),

    /// The collection did not load within the ready timeout.
    #[error("catalog did not load within {0:?}")]
    Timeout(Duration),
}

/// Product list load state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// No product list has been loaded yet.
    Loading,
    /// The product list is loaded.
    Loaded { count: usize },
    /// The most recent load failed.
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CacheKey {
    Products,
    Customers,
    Orders,
}

#[derive(Debug, Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Customers(Arc<Vec<Customer>>),
    Orders(Arc<Vec<Order>>),
}

/// Cached access to catalog collections.
#[derive(Clone)]
pub struct CatalogData {
    inner: Arc<CatalogDataInner>,
}

struct CatalogDataInner {
    reader: Arc<dyn CatalogReader>,
    cache: Cache<CacheKey, CacheValue>,
    state: watch::Sender<LoadState>,
    ready_timeout: Duration,
}

impl CatalogData {
    /// Create an empty catalog view over a reader.
    #[must_use]
    pub fn new(reader: Arc<dyn CatalogReader>, ready_timeout: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(16)
            .time_to_live(CACHE_TTL)
            .build();
        let (state, _) = watch::channel(LoadState::Loading);

        Self {
            inner: Arc::new(CatalogDataInner {
                reader,
                cache,
                state,
                ready_timeout,
            }),
        }
    }

    /// Current product list load state.
    #[must_use]
    pub fn load_state(&self) -> LoadState {
        self.inner.state.borrow().clone()
    }

    /// Watch the product list load state.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<LoadState> {
        self.inner.state.subscribe()
    }

    /// Products, from cache or freshly fetched.
    ///
    /// # Errors
    ///
    /// Returns `DataError` if the fetch fails or exceeds the ready timeout.
    pub async fn products(&self) -> Result<Arc<Vec<Product>>, DataError> {
        let reader = Arc::clone(&self.inner.reader);
        let result = self
            .load(CacheKey::Products, async move {
                reader
                    .fetch_products()
                    .await
                    .map(|p| CacheValue::Products(Arc::new(p)))
            })
            .await;

        match result {
            Ok(CacheValue::Products(products)) => {
                self.inner
                    .state
                    .send_if_modified(|state| {
                        let next = LoadState::Loaded {
                            count: products.len(),
                        };
                        if *state == next {
                            return false;
                        }
                        tracing::info!(count = products.len(), "products loaded");
                        *state = next;
                        true
                    });
                Ok(products)
            }
            Ok(_) => Err(unexpected_entry()),
            Err(e) => {
                self.inner.state.send_replace(LoadState::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    /// Customers, from cache or freshly fetched.
    ///
    /// # Errors
    ///
    /// Returns `DataError` if the fetch fails or exceeds the ready timeout.
    pub async fn customers(&self) -> Result<Arc<Vec<Customer>>, DataError> {
        let reader = Arc::clone(&self.inner.reader);
        match self
            .load(CacheKey::Customers, async move {
                reader
                    .fetch_customers()
                    .await
                    .map(|c| CacheValue::Customers(Arc::new(c)))
            })
            .await?
        {
            CacheValue::Customers(customers) => Ok(customers),
            _ => Err(unexpected_entry()),
        }
    }

    /// Orders, from cache or freshly fetched.
    ///
    /// # Errors
    ///
    /// Returns `DataError` if the fetch fails or exceeds the ready timeout.
    pub async fn orders(&self) -> Result<Arc<Vec<Order>>, DataError> {
        let reader = Arc::clone(&self.inner.reader);
        match self
            .load(CacheKey::Orders, async move {
                reader
                    .fetch_orders()
                    .await
                    .map(|o| CacheValue::Orders(Arc::new(o)))
            })
            .await?
        {
            CacheValue::Orders(orders) => Ok(orders),
            _ => Err(unexpected_entry()),
        }
    }

    /// Look up a loaded product by id.
    ///
    /// # Errors
    ///
    /// Returns `DataError` if the product list cannot be loaded.
    pub async fn find_product(&self, id: ProductId) -> Result<Option<Product>, DataError> {
        let products = self.products().await?;
        Ok(products.iter().find(|p| p.id == id).cloned())
    }

    /// Drop the cached product list so the next load re-fetches it.
    pub async fn invalidate_products(&self) {
        self.inner.cache.invalidate(&CacheKey::Products).await;
        tracing::debug!("product cache invalidated");
    }

    /// Whether a product list is currently cached.
    #[must_use]
    pub fn products_cached(&self) -> bool {
        self.inner.cache.contains_key(&CacheKey::Products)
    }

    /// Re-fetch the product list after `delay` in a background task.
    ///
    /// The cached list is dropped when the delay ends, so a page load that
    /// refilled the cache in the meantime does not hide the write. The delay
    /// gives the spreadsheet time to reflect a write; it is a heuristic, not a
    /// consistency guarantee.
    pub fn schedule_reload(&self, delay: Duration) -> tokio::task::JoinHandle<()> {
        let data = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            data.invalidate_products().await;
            if let Err(e) = data.products().await {
                tracing::warn!(error = %e, "deferred product reload failed");
            }
        })
    }

    async fn load<F>(&self, key: CacheKey, fetch: F) -> Result<CacheValue, DataError>
    where
        F: Future<Output = Result<CacheValue, CatalogError>> + Send + 'static,
    {
        let timeout = self.inner.ready_timeout;
        match tokio::time::timeout(timeout, self.inner.cache.try_get_with(key, fetch)).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(DataError::Catalog(e)),
            Err(_) => {
                tracing::warn!(?key, ?timeout, "catalog load timed out");
                Err(DataError::Timeout(timeout))
            }
        }
    }
}

fn unexpected_entry() -> DataError {
    DataError::Catalog(Arc::new(CatalogError::Parse(
        "cache entry has unexpected type".to_string(),
    )))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use catalog_desk_core::ProductDraft;

    use super::*;

    #[derive(Default)]
    struct CountingReader {
        product_calls: AtomicUsize,
        delay: Option<Duration>,
        fail: bool,
    }

    #[async_trait]
    impl CatalogReader for CountingReader {
        async fn fetch_products(&self) -> Result<Vec<Product>, CatalogError> {
            self.product_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(CatalogError::Parse("sheet missing".to_string()));
            }
            Ok(vec![Product {
                id: ProductId::new(1),
                fields: ProductDraft {
                    name: "Camphor".to_string(),
                    ..ProductDraft::default()
                },
            }])
        }

        async fn fetch_customers(&self) -> Result<Vec<Customer>, CatalogError> {
            Ok(vec![])
        }

        async fn fetch_orders(&self) -> Result<Vec<Order>, CatalogError> {
            Ok(vec![])
        }
    }

    fn data(reader: CountingReader, timeout: Duration) -> (CatalogData, Arc<CountingReader>) {
        let reader = Arc::new(reader);
        let dyn_reader: Arc<dyn CatalogReader> = reader.clone();
        (CatalogData::new(dyn_reader, timeout), reader)
    }

    #[tokio::test]
    async fn test_products_are_cached() {
        let (data, reader) = data(CountingReader::default(), Duration::from_secs(1));
        assert_eq!(data.load_state(), LoadState::Loading);

        data.products().await.unwrap();
        data.products().await.unwrap();

        assert_eq!(reader.product_calls.load(Ordering::SeqCst), 1);
        assert_eq!(data.load_state(), LoadState::Loaded { count: 1 });
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let (data, reader) = data(CountingReader::default(), Duration::from_secs(1));
        data.products().await.unwrap();
        assert!(data.products_cached());

        data.invalidate_products().await;
        assert!(!data.products_cached());

        data.products().await.unwrap();
        assert_eq!(reader.product_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_scheduled_reload_bypasses_refilled_cache() {
        let (data, reader) = data(CountingReader::default(), Duration::from_secs(1));
        let reload = data.schedule_reload(Duration::from_millis(30));

        // A page view refills the cache before the delay ends
        data.products().await.unwrap();
        reload.await.unwrap();

        assert_eq!(reader.product_calls.load(Ordering::SeqCst), 2);
        assert!(data.products_cached());
    }

    #[tokio::test]
    async fn test_concurrent_loads_are_coalesced() {
        let reader = CountingReader {
            delay: Some(Duration::from_millis(50)),
            ..CountingReader::default()
        };
        let (data, reader) = data(reader, Duration::from_secs(1));

        let (a, b) = tokio::join!(data.products(), data.products());
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(reader.product_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_slow_load_times_out() {
        let reader = CountingReader {
            delay: Some(Duration::from_millis(500)),
            ..CountingReader::default()
        };
        let (data, _) = data(reader, Duration::from_millis(20));

        let err = data.products().await.unwrap_err();
        assert!(matches!(err, DataError::Timeout(_)));
        assert!(matches!(data.load_state(), LoadState::Failed(_)));
    }

    #[tokio::test]
    async fn test_failed_load_is_not_cached() {
        let reader = CountingReader {
            fail: true,
            ..CountingReader::default()
        };
        let (data, reader) = data(reader, Duration::from_secs(1));

        assert!(data.products().await.is_err());
        assert!(data.products().await.is_err());
        assert_eq!(reader.product_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_find_product() {
        let (data, _) = data(CountingReader::default(), Duration::from_secs(1));
        assert!(data.find_product(ProductId::new(1)).await.unwrap().is_some());
        assert!(data.find_product(ProductId::new(2)).await.unwrap().is_none());
    }
}
