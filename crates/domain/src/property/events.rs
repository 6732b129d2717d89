//! Property domain events.

use serde::Serialize;

use crate::aggregate::{DomainEvent, EventMeta};

use super::PropertyResponse;

/// Events raised by the property aggregate.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum PropertyEvent {
    /// A property was registered with a freshly generated code.
    PropertyRegistered(PropertySnapshotData),

    /// A property's details were replaced.
    PropertyUpdated(PropertySnapshotData),

    PropertyRemoved(PropertyRemovedData),
}

impl DomainEvent for PropertyEvent {
    fn event_type(&self) -> &'static str {
        match self {
            PropertyEvent::PropertyRegistered(_) => "PropertyRegistered",
            PropertyEvent::PropertyUpdated(_) => "PropertyUpdated",
            PropertyEvent::PropertyRemoved(_) => "PropertyRemoved",
        }
    }

    fn meta(&self) -> &EventMeta {
        match self {
            PropertyEvent::PropertyRegistered(data) | PropertyEvent::PropertyUpdated(data) => {
                &data.meta
            }
            PropertyEvent::PropertyRemoved(data) => &data.meta,
        }
    }
}

/// Data for events carrying the full property state.
#[derive(Debug, Clone, Serialize)]
pub struct PropertySnapshotData {
    #[serde(flatten)]
    pub meta: EventMeta,

    pub property: PropertyResponse,
}

/// Data for PropertyRemoved event.
#[derive(Debug, Clone, Serialize)]
pub struct PropertyRemovedData {
    #[serde(flatten)]
    pub meta: EventMeta,
}
