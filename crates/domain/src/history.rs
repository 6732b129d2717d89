//! Read access to the domain event log.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::{AggregateId, Envelope, PageRequest, RequestContext};
use event_log::{EventId, EventLog, EventQuery, EventRecord};
use serde::Serialize;

use crate::Services;
use crate::error::Failure;
use crate::mediator::{MediatorBuilder, Request, RequestHandler};

/// Events recorded for one entity, oldest first.
#[derive(Debug, Clone, Default)]
pub struct GetEntityHistory {
    pub aggregate_id: AggregateId,
    pub event_type: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: PageRequest,
}

impl Request for GetEntityHistory {
    type Response = Envelope<Vec<HistoryEntry>>;
}

impl GetEntityHistory {
    fn to_query(&self) -> EventQuery {
        let page = self.page.normalized();
        let mut query = EventQuery::for_aggregate(self.aggregate_id)
            .limit(page.page_size)
            .offset(page.offset());
        if let Some(event_type) = &self.event_type {
            query = query.event_type(event_type.clone());
        }
        if let Some(from) = self.from {
            query = query.from_timestamp(from);
        }
        if let Some(to) = self.to {
            query = query.to_timestamp(to);
        }
        query
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub event_id: EventId,
    pub event_type: String,
    pub aggregate_type: String,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
    pub payload: serde_json::Value,
}

impl From<EventRecord> for HistoryEntry {
    fn from(record: EventRecord) -> Self {
        Self {
            event_id: record.event_id,
            event_type: record.event_type,
            aggregate_type: record.aggregate_type,
            description: record.description,
            occurred_at: record.occurred_at,
            payload: record.payload,
        }
    }
}

pub struct HistoryQueryHandler {
    events: Arc<dyn EventLog>,
}

impl HistoryQueryHandler {
    pub fn new(events: Arc<dyn EventLog>) -> Self {
        Self { events }
    }
}

#[async_trait]
impl RequestHandler<GetEntityHistory> for HistoryQueryHandler {
    #[tracing::instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: GetEntityHistory,
        ctx: &RequestContext,
    ) -> Result<Envelope<Vec<HistoryEntry>>, Failure> {
        let records = self.events.query_events(request.to_query()).await?;
        tracing::debug!(
            aggregate_id = %request.aggregate_id,
            found = records.len(),
            request_id = %ctx.request_id(),
            "entity history read"
        );
        Ok(Envelope::success(
            records.into_iter().map(HistoryEntry::from).collect(),
        ))
    }
}

/// Registers the history handler.
pub fn register(builder: MediatorBuilder, services: &Services) -> MediatorBuilder {
    builder.register::<GetEntityHistory, _>(Arc::new(HistoryQueryHandler::new(Arc::clone(
        &services.events,
    ))))
}
