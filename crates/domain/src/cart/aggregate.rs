//! Cart aggregate.

use chrono::{DateTime, Utc};
use common::AggregateId;
use serde::{Deserialize, Serialize};

use crate::aggregate::{Aggregate, EventMeta, PendingEvents};
use crate::error::AppError;

use super::events::{CartCreatedData, CartEvent, CartItemData, CartRemovedData};

/// A property placed in a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub property_id: AggregateId,
    pub added_at: DateTime<Utc>,
}

/// A customer's shortlist of properties. A customer owns at most one cart.
#[derive(Debug, Clone)]
pub struct Cart {
    id: AggregateId,
    customer_id: AggregateId,
    items: Vec<CartItem>,
    created_at: DateTime<Utc>,
    events: PendingEvents<CartEvent>,
}

impl Cart {
    pub fn create(customer_id: AggregateId) -> Self {
        let mut cart = Self {
            id: AggregateId::new(),
            customer_id,
            items: Vec::new(),
            created_at: Utc::now(),
            events: PendingEvents::default(),
        };
        let data = CartCreatedData {
            meta: EventMeta::new(cart.id, &["Cart", "Customer"], "Cart created"),
            customer_id,
        };
        cart.raise(CartEvent::CartCreated(data));
        cart
    }

    /// Adds `property_id`; a property appears in a cart at most once.
    pub fn add_item(&mut self, property_id: AggregateId) -> Result<(), AppError> {
        if self.contains(property_id) {
            return Err(AppError::conflict("Property is already in the cart."));
        }
        self.items.push(CartItem {
            property_id,
            added_at: Utc::now(),
        });
        let data = CartItemData {
            meta: EventMeta::new(self.id, &["Cart", "Property"], "Cart item added"),
            property_id,
        };
        self.raise(CartEvent::CartItemAdded(data));
        Ok(())
    }

    pub fn remove_item(&mut self, property_id: AggregateId) -> Result<(), AppError> {
        if !self.contains(property_id) {
            return Err(AppError::not_found("CartItem"));
        }
        self.items.retain(|item| item.property_id != property_id);
        let data = CartItemData {
            meta: EventMeta::new(self.id, &["Cart", "Property"], "Cart item removed"),
            property_id,
        };
        self.raise(CartEvent::CartItemRemoved(data));
        Ok(())
    }

    pub fn mark_removed(&mut self) {
        let data = CartRemovedData {
            meta: EventMeta::new(self.id, &["Cart"], "Cart removed"),
        };
        self.raise(CartEvent::CartRemoved(data));
    }

    pub fn contains(&self, property_id: AggregateId) -> bool {
        self.items.iter().any(|item| item.property_id == property_id)
    }

    pub fn customer_id(&self) -> AggregateId {
        self.customer_id
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }
}

impl Aggregate for Cart {
    type Event = CartEvent;

    fn entity_type() -> &'static str {
        "Cart"
    }

    fn id(&self) -> AggregateId {
        self.id
    }

    fn pending_events(&self) -> &PendingEvents<CartEvent> {
        &self.events
    }

    fn pending_events_mut(&mut self) -> &mut PendingEvents<CartEvent> {
        &mut self.events
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartResponse {
    pub id: AggregateId,
    pub customer_id: AggregateId,
    pub items: Vec<CartItem>,
    pub created_at: DateTime<Utc>,
}

impl From<&Cart> for CartResponse {
    fn from(cart: &Cart) -> Self {
        Self {
            id: cart.id,
            customer_id: cart.customer_id,
            items: cart.items.clone(),
            created_at: cart.created_at,
        }
    }
}
