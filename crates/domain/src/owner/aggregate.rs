//! Owner aggregate.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, EventMeta, PendingEvents};

use super::events::{OwnerEvent, OwnerRemovedData, OwnerSnapshotData};

/// Editable fields of an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerDetails {
    pub name: String,
    pub surname: String,
    pub email: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub birthday: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub group: String,
}

#[derive(Debug, Clone)]
pub struct Owner {
    id: AggregateId,
    details: OwnerDetails,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    events: PendingEvents<OwnerEvent>,
}

impl Owner {
    pub fn register(details: OwnerDetails) -> Self {
        let mut owner = Self {
            id: AggregateId::new(),
            details,
            created_at: Utc::now(),
            updated_at: None,
            events: PendingEvents::default(),
        };
        let data = OwnerSnapshotData {
            meta: owner.meta("Owner registered"),
            owner: OwnerResponse::from(&owner),
        };
        owner.raise(OwnerEvent::OwnerRegistered(data));
        owner
    }

    pub fn update(&mut self, details: OwnerDetails) {
        self.details = details;
        self.updated_at = Some(Utc::now());
        let data = OwnerSnapshotData {
            meta: self.meta("Owner updated"),
            owner: OwnerResponse::from(&*self),
        };
        self.raise(OwnerEvent::OwnerUpdated(data));
    }

    pub fn mark_removed(&mut self) {
        let data = OwnerRemovedData {
            meta: self.meta("Owner removed"),
        };
        self.raise(OwnerEvent::OwnerRemoved(data));
    }

    pub fn details(&self) -> &OwnerDetails {
        &self.details
    }

    pub fn has_email(&self, email: &str) -> bool {
        self.details.email.eq_ignore_ascii_case(email.trim())
    }

    /// Whether name, surname, email or phone contains `needle` (already
    /// lowercased). No needle matches every owner.
    pub fn matches(&self, needle: Option<&str>) -> bool {
        let Some(needle) = needle else {
            return true;
        };
        [
            &self.details.name,
            &self.details.surname,
            &self.details.email,
            &self.details.phone_number,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }

    fn meta(&self, description: &str) -> EventMeta {
        EventMeta::new(self.id, &["Owner"], description)
    }
}

impl Aggregate for Owner {
    type Event = OwnerEvent;

    fn entity_type() -> &'static str {
        "Owner"
    }

    fn id(&self) -> AggregateId {
        self.id
    }

    fn pending_events(&self) -> &PendingEvents<OwnerEvent> {
        &self.events
    }

    fn pending_events_mut(&mut self) -> &mut PendingEvents<OwnerEvent> {
        &mut self.events
    }
}

/// Read model returned by owner queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerResponse {
    pub id: AggregateId,
    #[serde(flatten)]
    pub details: OwnerDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Owner> for OwnerResponse {
    fn from(owner: &Owner) -> Self {
        Self {
            id: owner.id,
            details: owner.details.clone(),
            created_at: owner.created_at,
            updated_at: owner.updated_at,
        }
    }
}
