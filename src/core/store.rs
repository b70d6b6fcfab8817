//! Store traits: queryable sources and scoped sessions
//!
//! A [`DataStore`] hands out one [`DataSession`] per request. The session owns
//! whatever scoped resource the backend needs (a lock handle, a pooled
//! connection) and gives it back when dropped, on every exit path. Writes are
//! staged on the session and applied together by
//! [`save_changes`](DataSession::save_changes): the whole batch is applied or
//! none of it is.

use crate::core::entity::Entity;
use crate::core::error::GridResult;
use crate::core::query::{Predicate, Query};
use async_trait::async_trait;

/// A source that can be filtered, counted, ordered and paged
///
/// The predicate and ordering arrive as text with bound parameters (see
/// [`crate::core::expression`]); implementations parse them and fail with a
/// `QueryError` on anything they cannot execute.
#[async_trait]
pub trait Queryable<T>: Send {
    /// Number of items matching the predicate (all items if `None`)
    async fn count(&mut self, predicate: Option<&Predicate>) -> GridResult<u64>;

    /// Items matching the query, ordered and paged
    async fn fetch(&mut self, query: &Query) -> GridResult<Vec<T>>;
}

/// One unit of work against a store
#[async_trait]
pub trait DataSession<T: Entity>: Queryable<T> {
    /// Stage an insert; the identifier is assigned on save
    fn add(&mut self, entity: T);

    /// Stage a full replacement of the stored entity with the same id
    fn attach_modified(&mut self, entity: T);

    /// Stage a delete by id
    fn remove(&mut self, id: i32);

    /// Number of staged changes
    fn pending(&self) -> usize;

    /// Apply all staged changes as one unit.
    ///
    /// Returns the inserted entities, carrying their new ids, in the order
    /// they were added. Fails with `EntityError::NotFound` if a replaced or
    /// removed id does not exist; in that case nothing is applied.
    async fn save_changes(&mut self) -> GridResult<Vec<T>>;
}

/// Factory of sessions for one entity type
#[async_trait]
pub trait DataStore<T: Entity>: Send + Sync {
    /// Backend name for logs and errors
    fn backend(&self) -> &'static str;

    /// Open a session; the returned value releases its resources on drop
    async fn session(&self) -> GridResult<Box<dyn DataSession<T>>>;
}
