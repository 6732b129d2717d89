//! Property aggregate.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::aggregate::{Aggregate, EventMeta, PendingEvents};

use super::events::{PropertyEvent, PropertyRemovedData, PropertySnapshotData};

/// Editable fields of a property.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDetails {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub property_type: String,
    #[serde(default)]
    pub owner_id: Option<Uuid>,
    pub address: String,
    pub price: f64,
    #[serde(default)]
    pub area: f64,
    #[serde(default)]
    pub rooms: u32,
    #[serde(default)]
    pub bathrooms: u32,
    #[serde(default)]
    pub published: bool,
}

/// A real-estate listing.
#[derive(Debug, Clone)]
pub struct Property {
    id: AggregateId,
    code: String,
    details: PropertyDetails,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    events: PendingEvents<PropertyEvent>,
}

impl Property {
    /// Creates a property with the given internal code and raises
    /// `PropertyRegistered`.
    pub fn register(code: impl Into<String>, details: PropertyDetails) -> Self {
        let mut property = Self {
            id: AggregateId::new(),
            code: code.into(),
            details,
            created_at: Utc::now(),
            updated_at: None,
            events: PendingEvents::default(),
        };
        let data = PropertySnapshotData {
            meta: property.meta("Property registered"),
            property: PropertyResponse::from(&property),
        };
        property.raise(PropertyEvent::PropertyRegistered(data));
        property
    }

    /// Replaces the editable fields and raises `PropertyUpdated`.
    pub fn update(&mut self, details: PropertyDetails) {
        self.details = details;
        self.updated_at = Some(Utc::now());
        let data = PropertySnapshotData {
            meta: self.meta("Property updated"),
            property: PropertyResponse::from(&*self),
        };
        self.raise(PropertyEvent::PropertyUpdated(data));
    }

    /// Raises `PropertyRemoved`; the repository performs the deletion.
    pub fn mark_removed(&mut self) {
        let data = PropertyRemovedData {
            meta: self.meta("Property removed"),
        };
        self.raise(PropertyEvent::PropertyRemoved(data));
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn details(&self) -> &PropertyDetails {
        &self.details
    }

    /// Case-insensitive match of `needle` (already lowercased) against the
    /// searchable fields.
    pub fn matches(&self, needle: &str) -> bool {
        [
            self.details.name.as_str(),
            self.details.description.as_str(),
            self.details.address.as_str(),
            self.details.property_type.as_str(),
            self.code.as_str(),
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }

    fn meta(&self, description: &str) -> EventMeta {
        EventMeta::new(self.id, &["Property"], description)
    }
}

impl Aggregate for Property {
    type Event = PropertyEvent;

    fn entity_type() -> &'static str {
        "Property"
    }

    fn id(&self) -> AggregateId {
        self.id
    }

    fn pending_events(&self) -> &PendingEvents<PropertyEvent> {
        &self.events
    }

    fn pending_events_mut(&mut self) -> &mut PendingEvents<PropertyEvent> {
        &mut self.events
    }
}

/// Read model returned by property queries and cached by id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyResponse {
    pub id: AggregateId,
    pub code: String,
    #[serde(flatten)]
    pub details: PropertyDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Property> for PropertyResponse {
    fn from(property: &Property) -> Self {
        Self {
            id: property.id,
            code: property.code.clone(),
            details: property.details.clone(),
            created_at: property.created_at,
            updated_at: property.updated_at,
        }
    }
}
