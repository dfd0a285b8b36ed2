//! Keyed row storage shared by the in-memory repositories.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::hash::Hash;

use pagination::PageRequest;
use tokio::sync::RwLock;

use crate::domain::ports::{ListSlice, RepositoryError};

/// Rows keyed by identifier.
#[derive(Debug)]
pub(super) struct Table<K, V> {
    rows: RwLock<HashMap<K, V>>,
}

impl<K, V> Default for Table<K, V> {
    fn default() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
        }
    }
}

impl<K, V> Table<K, V>
where
    K: Eq + Hash + Copy + std::fmt::Display,
    V: Clone,
{
    /// Insert a row unless `clash` matches an existing one or the key is taken.
    pub(super) async fn insert(
        &self,
        key: K,
        row: &V,
        clash: impl Fn(&V) -> bool,
    ) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;
        if rows.contains_key(&key) {
            return Err(RepositoryError::conflict(format!("{key} already exists")));
        }
        if rows.values().any(&clash) {
            return Err(RepositoryError::conflict(format!("{key} clashes with an existing row")));
        }
        rows.insert(key, row.clone());
        Ok(())
    }

    /// Replace an existing row unless `clash` matches another row.
    pub(super) async fn replace(
        &self,
        key: K,
        row: &V,
        clash: impl Fn(&K, &V) -> bool,
    ) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|(other, v)| *other != key && clash(other, v)) {
            return Err(RepositoryError::conflict(format!("{key} clashes with an existing row")));
        }
        match rows.get_mut(&key) {
            Some(slot) => {
                *slot = row.clone();
                Ok(())
            }
            None => Err(RepositoryError::query(format!("{key} does not exist"))),
        }
    }

    pub(super) async fn remove(&self, key: K) -> bool {
        self.rows.write().await.remove(&key).is_some()
    }

    pub(super) async fn get(&self, key: K) -> Option<V> {
        self.rows.read().await.get(&key).cloned()
    }

    pub(super) async fn find(&self, predicate: impl Fn(&V) -> bool) -> Option<V> {
        self.rows.read().await.values().find(|v| predicate(v)).cloned()
    }

    pub(super) async fn count(&self, predicate: impl Fn(&V) -> bool) -> u64 {
        let n = self.rows.read().await.values().filter(|v| predicate(v)).count();
        u64::try_from(n).unwrap_or(u64::MAX)
    }

    /// Matching rows in `order`.
    pub(super) async fn select(
        &self,
        predicate: impl Fn(&V) -> bool,
        order: impl FnMut(&V, &V) -> Ordering,
    ) -> Vec<V> {
        let mut matched: Vec<V> = self
            .rows
            .read()
            .await
            .values()
            .filter(|v| predicate(v))
            .cloned()
            .collect();
        matched.sort_by(order);
        matched
    }

    /// One page of matching rows in `order`.
    pub(super) async fn page(
        &self,
        predicate: impl Fn(&V) -> bool,
        order: impl FnMut(&V, &V) -> Ordering,
        page: PageRequest,
    ) -> ListSlice<V> {
        let matched = self.select(predicate, order).await;
        ListSlice {
            total: u64::try_from(matched.len()).unwrap_or(u64::MAX),
            items: page.slice(&matched),
        }
    }
}

impl<K, V> Table<K, V>
where
    K: Eq + Hash + Copy + std::fmt::Display,
    V: Clone + PartialEq,
{
    /// Replace the row at `key` with `row` only while it still equals
    /// `current`.
    pub(super) async fn swap(&self, key: K, current: &V, row: &V) -> Result<(), RepositoryError> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(&key) {
            Some(slot) if slot == current => {
                *slot = row.clone();
                Ok(())
            }
            Some(_) => Err(RepositoryError::conflict(format!(
                "{key} was changed by another request"
            ))),
            None => Err(RepositoryError::query(format!("{key} does not exist"))),
        }
    }
}

pub(super) fn same_text(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}
