use serde::Serialize;

use crate::aggregate::{DomainEvent, EventMeta};

use super::OwnerResponse;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum OwnerEvent {
    OwnerRegistered(OwnerSnapshotData),
    OwnerUpdated(OwnerSnapshotData),
    OwnerRemoved(OwnerRemovedData),
}

impl DomainEvent for OwnerEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OwnerEvent::OwnerRegistered(_) => "OwnerRegistered",
            OwnerEvent::OwnerUpdated(_) => "OwnerUpdated",
            OwnerEvent::OwnerRemoved(_) => "OwnerRemoved",
        }
    }

    fn meta(&self) -> &EventMeta {
        match self {
            OwnerEvent::OwnerRegistered(data) | OwnerEvent::OwnerUpdated(data) => &data.meta,
            OwnerEvent::OwnerRemoved(data) => &data.meta,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerSnapshotData {
    #[serde(flatten)]
    pub meta: EventMeta,

    pub owner: OwnerResponse,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnerRemovedData {
    #[serde(flatten)]
    pub meta: EventMeta,
}
