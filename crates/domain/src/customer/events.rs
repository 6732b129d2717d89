//! Customer domain events.

use serde::Serialize;

use crate::aggregate::{DomainEvent, EventMeta};

use super::CustomerResponse;

/// Events raised by the customer aggregate.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum CustomerEvent {
    CustomerRegistered(CustomerSnapshotData),
    CustomerUpdated(CustomerSnapshotData),
    CustomerRemoved(CustomerRemovedData),
}

impl DomainEvent for CustomerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CustomerEvent::CustomerRegistered(_) => "CustomerRegistered",
            CustomerEvent::CustomerUpdated(_) => "CustomerUpdated",
            CustomerEvent::CustomerRemoved(_) => "CustomerRemoved",
        }
    }

    fn meta(&self) -> &EventMeta {
        match self {
            CustomerEvent::CustomerRegistered(data) | CustomerEvent::CustomerUpdated(data) => {
                &data.meta
            }
            CustomerEvent::CustomerRemoved(data) => &data.meta,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerSnapshotData {
    #[serde(flatten)]
    pub meta: EventMeta,

    pub customer: CustomerResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerRemovedData {
    #[serde(flatten)]
    pub meta: EventMeta,
}
