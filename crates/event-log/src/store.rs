use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use futures_core::Stream;

use crate::{AggregateId, EventQuery, EventRecord, Result};

/// A stream of published events.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<EventRecord>> + Send>>;

/// Core trait for event log implementations.
///
/// The log is append-only. All implementations must be thread-safe
/// (Send + Sync) since one log is shared by every in-flight request.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Publishes records to the log.
    ///
    /// Records are appended atomically - either all land or none do.
    /// Publishing an empty batch is a no-op.
    async fn publish(&self, records: Vec<EventRecord>) -> Result<()>;

    /// Retrieves all records for a specific aggregate, oldest first.
    async fn events_for_aggregate(&self, aggregate_id: AggregateId) -> Result<Vec<EventRecord>>;

    /// Retrieves records by event type, oldest first.
    async fn events_by_type(&self, event_type: &str) -> Result<Vec<EventRecord>>;

    /// Retrieves records matching a query.
    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventRecord>>;

    /// Streams every record in publication order.
    async fn stream_all(&self) -> Result<EventStream>;

    /// Number of records published so far.
    async fn count(&self) -> Result<usize>;
}

/// Extension trait providing convenience methods for event logs.
#[async_trait]
pub trait EventLogExt: EventLog {
    /// Publishes a single record.
    async fn publish_one(&self, record: EventRecord) -> Result<()> {
        self.publish(vec![record]).await
    }

    /// Checks if any record exists for the aggregate.
    async fn has_events(&self, aggregate_id: AggregateId) -> Result<bool> {
        Ok(!self.events_for_aggregate(aggregate_id).await?.is_empty())
    }
}

// Blanket implementation for all EventLog implementations
impl<T: EventLog + ?Sized> EventLogExt for T {}

#[async_trait]
impl<T: EventLog + ?Sized> EventLog for Arc<T> {
    async fn publish(&self, records: Vec<EventRecord>) -> Result<()> {
        (**self).publish(records).await
    }

    async fn events_for_aggregate(&self, aggregate_id: AggregateId) -> Result<Vec<EventRecord>> {
        (**self).events_for_aggregate(aggregate_id).await
    }

    async fn events_by_type(&self, event_type: &str) -> Result<Vec<EventRecord>> {
        (**self).events_by_type(event_type).await
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventRecord>> {
        (**self).query_events(query).await
    }

    async fn stream_all(&self) -> Result<EventStream> {
        (**self).stream_all().await
    }

    async fn count(&self) -> Result<usize> {
        (**self).count().await
    }
}
