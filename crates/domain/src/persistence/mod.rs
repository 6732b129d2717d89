//! Persistence gateway used by handlers.
//!
//! Writes go through a [`ChangeSet`] committed atomically by
//! [`Repository::save_changes`]. Committing drains the pending domain events
//! of every aggregate in the change set and publishes them exactly once.

mod memory;

pub use memory::InMemoryRepository;

use async_trait::async_trait;
use common::{AggregateId, RequestContext};
use event_log::EventLogError;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::aggregate::Aggregate;

/// Errors raised by a repository.
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// Update or removal of an entity that is not stored.
    #[error("{entity} with id {id} was not found")]
    NotFound { entity: &'static str, id: AggregateId },

    /// Addition of an entity whose id is already stored.
    #[error("{entity} with id {id} already exists")]
    Duplicate { entity: &'static str, id: AggregateId },

    #[error("Operation cancelled")]
    Cancelled,

    /// Publishing the committed events failed; nothing was applied.
    #[error("Event publication failed: {0}")]
    EventLog(#[from] EventLogError),
}

impl PersistenceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, PersistenceError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, PersistenceError>;

/// Filter applied to stored entities.
pub type Predicate<'a, E> = &'a (dyn Fn(&E) -> bool + Send + Sync);

/// One staged mutation.
#[derive(Debug, Clone)]
pub enum Change<E> {
    Add(E),
    Update(E),
    Remove(E),
}

impl<E: Aggregate> Change<E> {
    pub fn entity(&self) -> &E {
        match self {
            Change::Add(e) | Change::Update(e) | Change::Remove(e) => e,
        }
    }

    pub(crate) fn entity_mut(&mut self) -> &mut E {
        match self {
            Change::Add(e) | Change::Update(e) | Change::Remove(e) => e,
        }
    }
}

/// Mutations committed together or not at all.
#[derive(Debug, Clone)]
pub struct ChangeSet<E> {
    changes: Vec<Change<E>>,
}

impl<E: Aggregate> ChangeSet<E> {
    pub fn new() -> Self {
        Self {
            changes: Vec::new(),
        }
    }

    pub fn add(mut self, entity: E) -> Self {
        self.changes.push(Change::Add(entity));
        self
    }

    pub fn update(mut self, entity: E) -> Self {
        self.changes.push(Change::Update(entity));
        self
    }

    pub fn remove(mut self, entity: E) -> Self {
        self.changes.push(Change::Remove(entity));
        self
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn into_changes(self) -> Vec<Change<E>> {
        self.changes
    }
}

impl<E: Aggregate> Default for ChangeSet<E> {
    fn default() -> Self {
        Self::new()
    }
}

/// Data access for one aggregate type.
///
/// Every call honors the supplied cancellation token.
#[async_trait]
pub trait Repository<E: Aggregate>: Send + Sync {
    async fn find(&self, id: AggregateId, cancel: &CancellationToken) -> Result<Option<E>>;

    async fn any(&self, predicate: Predicate<'_, E>, cancel: &CancellationToken) -> Result<bool>;

    /// Matching entities in a stable order.
    async fn list(
        &self,
        predicate: Predicate<'_, E>,
        cancel: &CancellationToken,
    ) -> Result<Vec<E>>;

    async fn count(&self, cancel: &CancellationToken) -> Result<usize>;

    /// Commits the change set atomically and publishes its events.
    ///
    /// Returns the number of entities written.
    async fn save_changes(&self, changes: ChangeSet<E>, ctx: &RequestContext) -> Result<usize>;
}

pub(crate) fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(PersistenceError::Cancelled)
    } else {
        Ok(())
    }
}
