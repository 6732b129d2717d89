//! Cart domain events.

use common::AggregateId;
use serde::Serialize;

use crate::aggregate::{DomainEvent, EventMeta};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum CartEvent {
    CartCreated(CartCreatedData),
    CartRemoved(CartRemovedData),
    CartItemAdded(CartItemData),
    CartItemRemoved(CartItemData),
}

impl DomainEvent for CartEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CartEvent::CartCreated(_) => "CartCreated",
            CartEvent::CartRemoved(_) => "CartRemoved",
            CartEvent::CartItemAdded(_) => "CartItemAdded",
            CartEvent::CartItemRemoved(_) => "CartItemRemoved",
        }
    }

    fn meta(&self) -> &EventMeta {
        match self {
            CartEvent::CartCreated(data) => &data.meta,
            CartEvent::CartRemoved(data) => &data.meta,
            CartEvent::CartItemAdded(data) | CartEvent::CartItemRemoved(data) => &data.meta,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CartCreatedData {
    #[serde(flatten)]
    pub meta: EventMeta,

    pub customer_id: AggregateId,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartRemovedData {
    #[serde(flatten)]
    pub meta: EventMeta,
}

/// Data for item events; the property is listed among the related entities.
#[derive(Debug, Clone, Serialize)]
pub struct CartItemData {
    #[serde(flatten)]
    pub meta: EventMeta,

    pub property_id: AggregateId,
}
