//! Customer aggregate.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, EventMeta, PendingEvents};

use super::events::{CustomerEvent, CustomerRemovedData, CustomerSnapshotData};

/// Editable fields of a customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    pub name: String,
    pub surname: String,
    pub email: String,
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub gender: String,
    #[serde(default)]
    pub group: String,
}

#[derive(Debug, Clone)]
pub struct Customer {
    id: AggregateId,
    details: CustomerDetails,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    events: PendingEvents<CustomerEvent>,
}

impl Customer {
    pub fn register(details: CustomerDetails) -> Self {
        let mut customer = Self {
            id: AggregateId::new(),
            details,
            created_at: Utc::now(),
            updated_at: None,
            events: PendingEvents::default(),
        };
        let data = CustomerSnapshotData {
            meta: customer.meta("Customer registered"),
            customer: CustomerResponse::from(&customer),
        };
        customer.raise(CustomerEvent::CustomerRegistered(data));
        customer
    }

    pub fn update(&mut self, details: CustomerDetails) {
        self.details = details;
        self.updated_at = Some(Utc::now());
        let data = CustomerSnapshotData {
            meta: self.meta("Customer updated"),
            customer: CustomerResponse::from(&*self),
        };
        self.raise(CustomerEvent::CustomerUpdated(data));
    }

    pub fn mark_removed(&mut self) {
        let data = CustomerRemovedData {
            meta: self.meta("Customer removed"),
        };
        self.raise(CustomerEvent::CustomerRemoved(data));
    }

    pub fn details(&self) -> &CustomerDetails {
        &self.details
    }

    pub fn email(&self) -> &str {
        &self.details.email
    }

    pub fn has_email(&self, email: &str) -> bool {
        self.details.email.eq_ignore_ascii_case(email.trim())
    }

    /// Listing filter: the customer has an email and, when `needle` (already
    /// lowercased) is given, one of name, surname, phone, gender or group
    /// contains it.
    pub fn matches(&self, needle: Option<&str>) -> bool {
        if self.details.email.trim().is_empty() {
            return false;
        }
        let Some(needle) = needle else {
            return true;
        };
        [
            &self.details.name,
            &self.details.surname,
            &self.details.phone_number,
            &self.details.gender,
            &self.details.group,
        ]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
    }

    fn meta(&self, description: &str) -> EventMeta {
        EventMeta::new(self.id, &["Customer"], description)
    }
}

impl Aggregate for Customer {
    type Event = CustomerEvent;

    fn entity_type() -> &'static str {
        "Customer"
    }

    fn id(&self) -> AggregateId {
        self.id
    }

    fn pending_events(&self) -> &PendingEvents<CustomerEvent> {
        &self.events
    }

    fn pending_events_mut(&mut self) -> &mut PendingEvents<CustomerEvent> {
        &mut self.events
    }
}

/// Read model returned by customer queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerResponse {
    pub id: AggregateId,
    #[serde(flatten)]
    pub details: CustomerDetails,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Customer> for CustomerResponse {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            details: customer.details.clone(),
            created_at: customer.created_at,
            updated_at: customer.updated_at,
        }
    }
}
