//! Repository traits
//!
//! [`Repository`] is the storage seam handlers and the list pipeline are
//! written against. Methods return `impl Future + Send` so implementations
//! can be plain `async` blocks without boxing.

use std::future::Future;

use serde::{de::DeserializeOwned, Serialize};

use super::{Filter, Pagination, RepositoryResult, SortKey};

/// A persisted entity kind
pub trait Document: Serialize + DeserializeOwned + Send + Sync + Unpin + 'static {
    /// Partial update payload, serialized as a merge document
    type Patch: Serialize + Send + Sync + 'static;

    /// Table the entity lives in
    const TABLE: &'static str;

    /// Human-readable entity name used in errors and logs
    const ENTITY: &'static str;

    /// Fields holding arrays, matched by containment rather than equality
    const ARRAY_FIELDS: &'static [&'static str] = &[];

    /// Record key
    fn id(&self) -> &str;
}

/// CRUD operations over one entity kind
pub trait Repository<Entity, Patch>: Send + Sync {
    /// Find an entity by its key
    fn find_by_id(
        &self,
        id: &str,
    ) -> impl Future<Output = RepositoryResult<Option<Entity>>> + Send;

    /// Find entities matching `filter`, ordered by `sort`, optionally windowed
    fn find_all(
        &self,
        filter: &Filter,
        sort: &[SortKey],
        window: Option<Pagination>,
    ) -> impl Future<Output = RepositoryResult<Vec<Entity>>> + Send;

    /// Count entities matching `filter`
    fn count(&self, filter: &Filter) -> impl Future<Output = RepositoryResult<u64>> + Send;

    /// Whether an entity with this key exists
    fn exists(&self, id: &str) -> impl Future<Output = RepositoryResult<bool>> + Send;

    /// Persist a new entity, returning it as stored
    fn create(&self, entity: Entity) -> impl Future<Output = RepositoryResult<Entity>> + Send;

    /// Merge `patch` into an existing entity; `None` when the key is unknown
    fn update(
        &self,
        id: &str,
        patch: Patch,
    ) -> impl Future<Output = RepositoryResult<Option<Entity>>> + Send;

    /// Remove an entity, returning what was removed
    fn delete(&self, id: &str) -> impl Future<Output = RepositoryResult<Option<Entity>>> + Send;

    /// Remove every entity, returning how many there were
    fn delete_all(&self) -> impl Future<Output = RepositoryResult<u64>> + Send;
}
