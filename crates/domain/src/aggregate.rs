//! Core aggregate and domain event traits.

use cache::CacheKey;
use chrono::{DateTime, Utc};
use common::{AggregateId, RequestContext};
use event_log::{EventLogError, EventRecord};
use serde::{Deserialize, Serialize};

/// Descriptive metadata carried by every domain event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventMeta {
    pub aggregate_id: AggregateId,
    pub related_entities: Vec<String>,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

impl EventMeta {
    pub fn new(
        aggregate_id: AggregateId,
        related_entities: &[&str],
        description: impl Into<String>,
    ) -> Self {
        Self {
            aggregate_id,
            related_entities: related_entities.iter().map(|e| e.to_string()).collect(),
            description: description.into(),
            occurred_at: Utc::now(),
        }
    }
}

/// Trait for domain events.
///
/// Domain events represent facts that have happened in the domain.
/// They are immutable and should be named in past tense.
pub trait DomainEvent: Serialize + Send + Sync + Clone + std::fmt::Debug {
    /// Returns the event type name.
    ///
    /// This is used for serialization and event log filtering.
    fn event_type(&self) -> &'static str;

    fn meta(&self) -> &EventMeta;

    /// Converts the event into a log record stamped with the caller's identity.
    fn to_record(
        &self,
        aggregate_type: &str,
        ctx: &RequestContext,
    ) -> Result<EventRecord, EventLogError> {
        let meta = self.meta();
        let mut builder = EventRecord::builder()
            .event_type(self.event_type())
            .aggregate_id(meta.aggregate_id)
            .aggregate_type(aggregate_type)
            .related_entities(meta.related_entities.iter().cloned())
            .description(meta.description.clone())
            .occurred_at(meta.occurred_at)
            .payload(self)?
            .metadata("request_id", ctx.request_id().to_string().into())
            .metadata("user", ctx.user().email_or_anonymous().into());
        if let Some(user_id) = ctx.user().user_id() {
            builder = builder.metadata("user_id", user_id.to_string().into());
        }
        builder.build()
    }
}

/// Events raised by an aggregate and not yet published.
///
/// Never persisted with the aggregate itself; the persistence boundary drains
/// the list when the change set commits.
#[derive(Debug, Clone)]
pub struct PendingEvents<E> {
    events: Vec<E>,
}

impl<E> PendingEvents<E> {
    pub fn push(&mut self, event: E) {
        self.events.push(event);
    }

    /// Removes and returns every pending event.
    pub fn take(&mut self) -> Vec<E> {
        std::mem::take(&mut self.events)
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}

impl<E> Default for PendingEvents<E> {
    fn default() -> Self {
        Self { events: Vec::new() }
    }
}

/// Trait for aggregates persisted through a repository.
///
/// An aggregate is a cluster of domain objects that can be treated as a single
/// unit. State changes raise events that are published once the change is
/// committed.
pub trait Aggregate: Clone + Send + Sync + 'static {
    /// The type of events this aggregate raises.
    type Event: DomainEvent;

    /// Returns the entity type name.
    ///
    /// Used for cache keys, event records and not-found messages.
    fn entity_type() -> &'static str;

    /// Returns the aggregate's unique identifier.
    fn id(&self) -> AggregateId;

    fn pending_events(&self) -> &PendingEvents<Self::Event>;

    fn pending_events_mut(&mut self) -> &mut PendingEvents<Self::Event>;

    /// Records an event for publication at commit time.
    fn raise(&mut self, event: Self::Event) {
        self.pending_events_mut().push(event);
    }

    /// Drains the pending events.
    fn take_events(&mut self) -> Vec<Self::Event> {
        self.pending_events_mut().take()
    }

    /// Cache key of the single-entity read model.
    fn cache_key(&self) -> CacheKey {
        CacheKey::entity(Self::entity_type(), self.id())
    }
}
