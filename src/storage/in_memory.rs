//! In-memory implementation of DataStore for testing and development

use crate::core::entity::Entity;
use crate::core::error::{EntityError, GridResult};
use crate::core::query::{Predicate, Query};
use crate::core::store::{DataSession, DataStore, Queryable};
use crate::storage::matcher::{Matcher, Sorter};
use anyhow::anyhow;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard};

#[derive(Clone)]
struct Table<T> {
    rows: BTreeMap<i32, T>,
    last_id: i32,
}

/// In-memory store
///
/// Useful for testing and development. Rows are kept in key order behind an
/// `RwLock`; a save builds the new table on a copy and swaps it in only when
/// every staged change applied.
pub struct InMemoryStore<T> {
    table: Arc<RwLock<Table<T>>>,
}

impl<T: Entity> InMemoryStore<T> {
    /// Create an empty store; the first inserted entity gets id 1
    pub fn new() -> Self {
        Self {
            table: Arc::new(RwLock::new(Table {
                rows: BTreeMap::new(),
                last_id: 0,
            })),
        }
    }
}

impl<T: Entity> Default for InMemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for InMemoryStore<T> {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
        }
    }
}

#[async_trait]
impl<T: Entity> DataStore<T> for InMemoryStore<T> {
    fn backend(&self) -> &'static str {
        "in_memory"
    }

    async fn session(&self) -> GridResult<Box<dyn DataSession<T>>> {
        Ok(Box::new(InMemorySession {
            table: Arc::clone(&self.table),
            changes: Vec::new(),
        }))
    }
}

enum Change<T> {
    Add(T),
    Replace(T),
    Remove(i32),
}

/// Session over an [`InMemoryStore`]
///
/// Reads see committed rows only; staged changes become visible after
/// `save_changes`.
pub struct InMemorySession<T> {
    table: Arc<RwLock<Table<T>>>,
    changes: Vec<Change<T>>,
}

impl<T: Entity> InMemorySession<T> {
    fn read_table(&self) -> GridResult<RwLockReadGuard<'_, Table<T>>> {
        Ok(self
            .table
            .read()
            .map_err(|e| anyhow!("Failed to acquire read lock: {}", e))?)
    }

    fn matching(&self, predicate: Option<&Predicate>) -> GridResult<Vec<T>> {
        let matcher = Matcher::compile(predicate, T::fields())?;
        let table = self.read_table()?;

        Ok(table
            .rows
            .values()
            .filter(|entity| matcher.matches(entity))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl<T: Entity> Queryable<T> for InMemorySession<T> {
    async fn count(&mut self, predicate: Option<&Predicate>) -> GridResult<u64> {
        let matcher = Matcher::compile(predicate, T::fields())?;
        let table = self.read_table()?;

        let count = table
            .rows
            .values()
            .filter(|entity| matcher.matches(entity))
            .count();
        Ok(count as u64)
    }

    async fn fetch(&mut self, query: &Query) -> GridResult<Vec<T>> {
        let sorter = Sorter::compile(&query.ordering, T::fields())?;
        let mut items = self.matching(query.predicate.as_ref())?;
        sorter.sort(&mut items);

        let skip = usize::try_from(query.skip).unwrap_or(usize::MAX);
        let take = query
            .take
            .map_or(usize::MAX, |take| usize::try_from(take).unwrap_or(usize::MAX));

        Ok(items.into_iter().skip(skip).take(take).collect())
    }
}

#[async_trait]
impl<T: Entity> DataSession<T> for InMemorySession<T> {
    fn add(&mut self, entity: T) {
        self.changes.push(Change::Add(entity));
    }

    fn attach_modified(&mut self, entity: T) {
        self.changes.push(Change::Replace(entity));
    }

    fn remove(&mut self, id: i32) {
        self.changes.push(Change::Remove(id));
    }

    fn pending(&self) -> usize {
        self.changes.len()
    }

    async fn save_changes(&mut self) -> GridResult<Vec<T>> {
        let changes = std::mem::take(&mut self.changes);
        let mut table = self
            .table
            .write()
            .map_err(|e| anyhow!("Failed to acquire write lock: {}", e))?;

        let mut next = table.clone();
        let mut inserted = Vec::new();
        let not_found = |id: i32| EntityError::NotFound {
            entity_type: T::entity_type().to_string(),
            id,
        };

        for change in changes {
            match change {
                Change::Add(mut entity) => {
                    next.last_id += 1;
                    entity.set_id(next.last_id);
                    next.rows.insert(next.last_id, entity.clone());
                    inserted.push(entity);
                }
                Change::Replace(entity) => {
                    let slot = next
                        .rows
                        .get_mut(&entity.id())
                        .ok_or_else(|| not_found(entity.id()))?;
                    *slot = entity;
                }
                Change::Remove(id) => {
                    next.rows.remove(&id).ok_or_else(|| not_found(id))?;
                }
            }
        }

        *table = next;
        tracing::debug!(
            entity = T::entity_type(),
            inserted = inserted.len(),
            rows = table.rows.len(),
            "saved changes"
        );
        Ok(inserted)
    }
}

impl<T> Drop for InMemorySession<T> {
    fn drop(&mut self) {
        if !self.changes.is_empty() {
            tracing::warn!(
                pending = self.changes.len(),
                "session dropped with unsaved changes"
            );
        }
    }
}
