use chrono::{DateTime, Utc};

use crate::{AggregateId, EventRecord};

/// Builder for constructing event log queries.
///
/// Allows filtering records by aggregate, aggregate type, event type,
/// related entity and time range.
#[derive(Debug, Clone, Default)]
pub struct EventQuery {
    /// Filter by aggregate ID.
    pub aggregate_id: Option<AggregateId>,

    /// Filter by aggregate type.
    pub aggregate_type: Option<String>,

    /// Filter by event types (any of these types).
    pub event_types: Option<Vec<String>>,

    /// Filter by a related entity type.
    pub related_entity: Option<String>,

    /// Filter by events at or after this timestamp.
    pub from_timestamp: Option<DateTime<Utc>>,

    /// Filter by events at or before this timestamp.
    pub to_timestamp: Option<DateTime<Utc>>,

    /// Maximum number of events to return.
    pub limit: Option<usize>,

    /// Number of events to skip.
    pub offset: Option<usize>,
}

impl EventQuery {
    /// Creates a new empty query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a query for a specific aggregate.
    pub fn for_aggregate(aggregate_id: AggregateId) -> Self {
        Self {
            aggregate_id: Some(aggregate_id),
            ..Default::default()
        }
    }

    /// Creates a query for events of a specific type.
    pub fn for_event_type(event_type: impl Into<String>) -> Self {
        Self {
            event_types: Some(vec![event_type.into()]),
            ..Default::default()
        }
    }

    pub fn aggregate_id(mut self, id: AggregateId) -> Self {
        self.aggregate_id = Some(id);
        self
    }

    pub fn aggregate_type(mut self, aggregate_type: impl Into<String>) -> Self {
        self.aggregate_type = Some(aggregate_type.into());
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_types = Some(vec![event_type.into()]);
        self
    }

    pub fn event_types(mut self, event_types: Vec<String>) -> Self {
        self.event_types = Some(event_types);
        self
    }

    pub fn related_entity(mut self, entity_type: impl Into<String>) -> Self {
        self.related_entity = Some(entity_type.into());
        self
    }

    pub fn from_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.from_timestamp = Some(timestamp);
        self
    }

    pub fn to_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.to_timestamp = Some(timestamp);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns true if `record` passes every filter of this query.
    ///
    /// Paging (`limit`/`offset`) is not considered here.
    pub fn matches(&self, record: &EventRecord) -> bool {
        if let Some(id) = self.aggregate_id
            && record.aggregate_id != id
        {
            return false;
        }
        if let Some(ref agg_type) = self.aggregate_type
            && &record.aggregate_type != agg_type
        {
            return false;
        }
        if let Some(ref types) = self.event_types
            && !types.contains(&record.event_type)
        {
            return false;
        }
        if let Some(ref entity) = self.related_entity
            && !record.relates_to(entity)
        {
            return false;
        }
        if let Some(from) = self.from_timestamp
            && record.occurred_at < from
        {
            return false;
        }
        if let Some(to) = self.to_timestamp
            && record.occurred_at > to
        {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(aggregate_id: AggregateId, event_type: &str) -> EventRecord {
        EventRecord::builder()
            .aggregate_id(aggregate_id)
            .aggregate_type("Property")
            .event_type(event_type)
            .related_entities(["Property"])
            .build()
            .unwrap()
    }

    #[test]
    fn query_for_aggregate() {
        let id = AggregateId::new();
        let query = EventQuery::for_aggregate(id);

        assert_eq!(query.aggregate_id, Some(id));
        assert!(query.event_types.is_none());
        assert!(query.matches(&record(id, "PropertyRegistered")));
        assert!(!query.matches(&record(AggregateId::new(), "PropertyRegistered")));
    }

    #[test]
    fn query_for_event_type() {
        let query = EventQuery::for_event_type("PropertyRemoved");

        assert!(query.aggregate_id.is_none());
        assert!(query.matches(&record(AggregateId::new(), "PropertyRemoved")));
        assert!(!query.matches(&record(AggregateId::new(), "PropertyUpdated")));
    }

    #[test]
    fn query_related_entity_filter() {
        let id = AggregateId::new();
        assert!(EventQuery::new()
            .related_entity("Property")
            .matches(&record(id, "PropertyRegistered")));
        assert!(!EventQuery::new()
            .related_entity("Cart")
            .matches(&record(id, "PropertyRegistered")));
    }

    #[test]
    fn query_builder_chain() {
        let id = AggregateId::new();
        let query = EventQuery::new()
            .aggregate_id(id)
            .aggregate_type("Property")
            .event_type("PropertyRegistered")
            .limit(100)
            .offset(0);

        assert_eq!(query.aggregate_id, Some(id));
        assert_eq!(query.aggregate_type.as_deref(), Some("Property"));
        assert_eq!(
            query.event_types,
            Some(vec!["PropertyRegistered".to_string()])
        );
        assert_eq!(query.limit, Some(100));
        assert_eq!(query.offset, Some(0));
    }
}
