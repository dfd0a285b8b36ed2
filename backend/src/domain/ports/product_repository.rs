//! Port for pharmacy catalogue persistence.

use async_trait::async_trait;
use pagination::PageRequest;

use super::{ListSlice, RepositoryError};
use crate::domain::{Product, ProductId};

/// Product list filters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductFilter {
    /// Case-insensitive substring of the name or generic name.
    pub search: Option<String>,
    /// Restrict to active or inactive products.
    pub active: Option<bool>,
}

impl ProductFilter {
    /// Whether `product` passes the filter.
    pub fn matches(&self, product: &Product) -> bool {
        self.active.is_none_or(|active| product.is_active == active)
            && self.search.as_deref().is_none_or(|needle| {
                let needle = needle.to_lowercase();
                product.name.to_lowercase().contains(&needle)
                    || product
                        .generic_name
                        .as_deref()
                        .is_some_and(|generic| generic.to_lowercase().contains(&needle))
            })
    }
}

/// Storage for products. Names are unique ignoring case.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// Insert a new product.
    async fn create(&self, product: &Product) -> Result<(), RepositoryError>;
    /// Replace an existing product.
    async fn update(&self, product: &Product) -> Result<(), RepositoryError>;
    /// Fetch by id.
    async fn find(&self, id: ProductId) -> Result<Option<Product>, RepositoryError>;
    /// Fetch by name, ignoring case.
    async fn find_by_name(&self, name: &str) -> Result<Option<Product>, RepositoryError>;
    /// Filtered page ordered by name.
    async fn list(
        &self,
        filter: &ProductFilter,
        page: PageRequest,
    ) -> Result<ListSlice<Product>, RepositoryError>;
    /// Every product.
    async fn all(&self) -> Result<Vec<Product>, RepositoryError>;
}
