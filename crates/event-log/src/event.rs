use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AggregateId, EventLogError};

/// Unique identifier for a published event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    /// Creates a new random event ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an event ID from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A published domain event with its metadata.
///
/// Produced by the persistence boundary when it drains an aggregate's
/// pending events after commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Unique identifier for this event.
    pub event_id: EventId,

    /// The type of the event (e.g., "PropertyRegistered").
    pub event_type: String,

    /// The aggregate this event belongs to.
    pub aggregate_id: AggregateId,

    /// The type of aggregate (e.g., "Property", "Customer").
    pub aggregate_type: String,

    /// Entity types touched by the event, used for routing and audit.
    pub related_entities: Vec<String>,

    /// Human readable summary ("Removed Customer.").
    pub description: String,

    /// When the mutation was decided.
    pub occurred_at: DateTime<Utc>,

    /// The event payload as JSON.
    pub payload: serde_json::Value,

    /// Additional metadata (request id, user id, ...).
    pub metadata: HashMap<String, serde_json::Value>,
}

impl EventRecord {
    /// Creates a new event record builder.
    pub fn builder() -> EventRecordBuilder {
        EventRecordBuilder::default()
    }

    /// Returns true if `entity_type` is among the related entities.
    pub fn relates_to(&self, entity_type: &str) -> bool {
        self.related_entities.iter().any(|e| e == entity_type)
    }
}

/// Builder for constructing event records.
#[derive(Debug, Default)]
pub struct EventRecordBuilder {
    event_id: Option<EventId>,
    event_type: Option<String>,
    aggregate_id: Option<AggregateId>,
    aggregate_type: Option<String>,
    related_entities: Vec<String>,
    description: String,
    occurred_at: Option<DateTime<Utc>>,
    payload: Option<serde_json::Value>,
    metadata: HashMap<String, serde_json::Value>,
}

impl EventRecordBuilder {
    /// Sets the event ID. If not set, a new ID will be generated.
    pub fn event_id(mut self, id: EventId) -> Self {
        self.event_id = Some(id);
        self
    }

    pub fn event_type(mut self, event_type: impl Into<String>) -> Self {
        self.event_type = Some(event_type.into());
        self
    }

    pub fn aggregate_id(mut self, id: AggregateId) -> Self {
        self.aggregate_id = Some(id);
        self
    }

    pub fn aggregate_type(mut self, aggregate_type: impl Into<String>) -> Self {
        self.aggregate_type = Some(aggregate_type.into());
        self
    }

    pub fn related_entities<I, S>(mut self, entities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.related_entities = entities.into_iter().map(Into::into).collect();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the occurrence time. If not set, the current time will be used.
    pub fn occurred_at(mut self, occurred_at: DateTime<Utc>) -> Self {
        self.occurred_at = Some(occurred_at);
        self
    }

    /// Sets the payload from a serializable value.
    pub fn payload<T: Serialize>(mut self, payload: &T) -> Result<Self, serde_json::Error> {
        self.payload = Some(serde_json::to_value(payload)?);
        Ok(self)
    }

    /// Sets the payload from a raw JSON value.
    pub fn payload_raw(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Adds a metadata entry.
    pub fn metadata(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Builds the record, failing if a required field was never set.
    pub fn build(self) -> Result<EventRecord, EventLogError> {
        Ok(EventRecord {
            event_id: self.event_id.unwrap_or_default(),
            event_type: self
                .event_type
                .ok_or(EventLogError::IncompleteRecord("event_type"))?,
            aggregate_id: self
                .aggregate_id
                .ok_or(EventLogError::IncompleteRecord("aggregate_id"))?,
            aggregate_type: self
                .aggregate_type
                .ok_or(EventLogError::IncompleteRecord("aggregate_type"))?,
            related_entities: self.related_entities,
            description: self.description,
            occurred_at: self.occurred_at.unwrap_or_else(Utc::now),
            payload: self.payload.unwrap_or(serde_json::Value::Null),
            metadata: self.metadata,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_id_new_creates_unique_ids() {
        assert_ne!(EventId::new(), EventId::new());
    }

    #[test]
    fn event_record_builder() {
        let aggregate_id = AggregateId::new();
        let payload = serde_json::json!({"name": "Casa Azul"});

        let record = EventRecord::builder()
            .event_type("PropertyRegistered")
            .aggregate_id(aggregate_id)
            .aggregate_type("Property")
            .related_entities(["Property"])
            .description("Registered Property.")
            .payload_raw(payload.clone())
            .metadata("request_id", serde_json::json!("123"))
            .build()
            .unwrap();

        assert_eq!(record.event_type, "PropertyRegistered");
        assert_eq!(record.aggregate_id, aggregate_id);
        assert_eq!(record.aggregate_type, "Property");
        assert!(record.relates_to("Property"));
        assert!(!record.relates_to("Customer"));
        assert_eq!(record.payload, payload);
        assert_eq!(
            record.metadata.get("request_id"),
            Some(&serde_json::json!("123"))
        );
    }

    #[test]
    fn build_reports_missing_field() {
        let result = EventRecord::builder()
            .event_type("PropertyRemoved")
            .aggregate_type("Property")
            .build();
        assert!(matches!(
            result,
            Err(EventLogError::IncompleteRecord("aggregate_id"))
        ));
    }
}
