use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    AggregateId, EventQuery, EventRecord, Result,
    store::{EventLog, EventStream},
};

/// In-memory event log.
///
/// Keeps records in publication order and provides the same interface as
/// the PostgreSQL implementation.
#[derive(Clone, Default)]
pub struct InMemoryEventLog {
    records: Arc<RwLock<Vec<EventRecord>>>,
}

impl InMemoryEventLog {
    /// Creates a new empty in-memory event log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of every record, in publication order.
    pub async fn snapshot(&self) -> Vec<EventRecord> {
        self.records.read().await.clone()
    }

    /// Clears all records.
    pub async fn clear(&self) {
        self.records.write().await.clear();
    }
}

#[async_trait]
impl EventLog for InMemoryEventLog {
    async fn publish(&self, records: Vec<EventRecord>) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let mut log = self.records.write().await;
        for record in &records {
            tracing::debug!(
                event_type = %record.event_type,
                aggregate_id = %record.aggregate_id,
                "domain event published"
            );
            metrics::counter!("domain_events_published_total", "event_type" => record.event_type.clone())
                .increment(1);
        }
        log.extend(records);
        Ok(())
    }

    async fn events_for_aggregate(&self, aggregate_id: AggregateId) -> Result<Vec<EventRecord>> {
        let log = self.records.read().await;
        Ok(log
            .iter()
            .filter(|r| r.aggregate_id == aggregate_id)
            .cloned()
            .collect())
    }

    async fn events_by_type(&self, event_type: &str) -> Result<Vec<EventRecord>> {
        let log = self.records.read().await;
        Ok(log
            .iter()
            .filter(|r| r.event_type == event_type)
            .cloned()
            .collect())
    }

    async fn query_events(&self, query: EventQuery) -> Result<Vec<EventRecord>> {
        let log = self.records.read().await;
        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(usize::MAX);

        Ok(log
            .iter()
            .filter(|r| query.matches(r))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn stream_all(&self) -> Result<EventStream> {
        use futures_util::stream;

        let records = self.records.read().await.clone();
        let stream = stream::iter(records.into_iter().map(Ok));
        Ok(Box::pin(stream))
    }

    async fn count(&self) -> Result<usize> {
        Ok(self.records.read().await.len())
    }
}
