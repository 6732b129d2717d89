//! Cart commands and their handler.
//!
//! Every cart operation requires an identified caller.

use std::sync::Arc;

use async_trait::async_trait;
use cache::{Cache, CacheKey};
use common::{AggregateId, Envelope, Localizer, RequestContext};

use crate::aggregate::Aggregate;
use crate::customer::Customer;
use crate::error::{AppError, Failure};
use crate::invalidation::{InvalidatesCache, invalidate_after_commit};
use crate::mediator::{Request, RequestHandler};
use crate::persistence::{ChangeSet, Repository};
use crate::property::Property;

use super::{Cart, MODULE, ensure_identified};

#[derive(Debug, Clone)]
pub struct CreateCart {
    pub customer_id: AggregateId,
}

impl Request for CreateCart {
    type Response = Envelope<AggregateId>;
}

#[derive(Debug, Clone)]
pub struct RemoveCart {
    pub id: AggregateId,
}

impl Request for RemoveCart {
    type Response = Envelope<AggregateId>;
}

impl InvalidatesCache for RemoveCart {
    fn cache_keys(&self) -> Vec<CacheKey> {
        vec![CacheKey::entity(Cart::entity_type(), self.id)]
    }
}

#[derive(Debug, Clone)]
pub struct AddCartItem {
    pub cart_id: AggregateId,
    pub property_id: AggregateId,
}

impl Request for AddCartItem {
    type Response = Envelope<AggregateId>;
}

impl InvalidatesCache for AddCartItem {
    fn cache_keys(&self) -> Vec<CacheKey> {
        vec![CacheKey::entity(Cart::entity_type(), self.cart_id)]
    }
}

#[derive(Debug, Clone)]
pub struct RemoveCartItem {
    pub cart_id: AggregateId,
    pub property_id: AggregateId,
}

impl Request for RemoveCartItem {
    type Response = Envelope<AggregateId>;
}

impl InvalidatesCache for RemoveCartItem {
    fn cache_keys(&self) -> Vec<CacheKey> {
        vec![CacheKey::entity(Cart::entity_type(), self.cart_id)]
    }
}

pub struct CartCommandHandler {
    carts: Arc<dyn Repository<Cart>>,
    customers: Arc<dyn Repository<Customer>>,
    properties: Arc<dyn Repository<Property>>,
    cache: Arc<dyn Cache>,
    localizer: Arc<dyn Localizer>,
}

impl CartCommandHandler {
    pub fn new(
        carts: Arc<dyn Repository<Cart>>,
        customers: Arc<dyn Repository<Customer>>,
        properties: Arc<dyn Repository<Property>>,
        cache: Arc<dyn Cache>,
        localizer: Arc<dyn Localizer>,
    ) -> Self {
        Self {
            carts,
            customers,
            properties,
            cache,
            localizer,
        }
    }

    async fn load_cart(&self, id: AggregateId, ctx: &RequestContext) -> Result<Cart, Failure> {
        self.carts
            .find(id, ctx.cancellation())
            .await?
            .ok_or_else(|| AppError::not_found(Cart::entity_type()).into())
    }

    /// Persists an item change, then drops the cached cart.
    async fn save_items(
        &self,
        cart: Cart,
        keys: &[CacheKey],
        ctx: &RequestContext,
    ) -> Result<AggregateId, Failure> {
        let id = cart.id();
        self.carts
            .save_changes(ChangeSet::new().update(cart), ctx)
            .await
            .map_err(|e| AppError::generic(MODULE, e))?;
        invalidate_after_commit(self.cache.as_ref(), keys, ctx).await;
        Ok(id)
    }
}

#[async_trait]
impl RequestHandler<CreateCart> for CartCommandHandler {
    #[tracing::instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: CreateCart,
        ctx: &RequestContext,
    ) -> Result<Envelope<AggregateId>, Failure> {
        ensure_identified(ctx)?;
        let cancel = ctx.cancellation();

        if self.customers.find(request.customer_id, cancel).await?.is_none() {
            return Err(AppError::not_found(Customer::entity_type()).into());
        }
        let customer_id = request.customer_id;
        let owns_cart = self
            .carts
            .any(&|c: &Cart| c.customer_id() == customer_id, cancel)
            .await?;
        if owns_cart {
            return Err(AppError::conflict("Customer already has a cart.").into());
        }

        let cart = Cart::create(customer_id);
        let id = cart.id();
        self.carts
            .save_changes(ChangeSet::new().add(cart), ctx)
            .await
            .map_err(|e| AppError::generic(MODULE, e))?;

        tracing::info!(%id, %customer_id, "cart created");
        Ok(Envelope::success_with(id, self.localizer.text("Cart Saved")))
    }
}

#[async_trait]
impl RequestHandler<RemoveCart> for CartCommandHandler {
    #[tracing::instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: RemoveCart,
        ctx: &RequestContext,
    ) -> Result<Envelope<AggregateId>, Failure> {
        ensure_identified(ctx)?;
        let mut cart = self.load_cart(request.id, ctx).await?;

        cart.mark_removed();
        self.carts
            .save_changes(ChangeSet::new().remove(cart), ctx)
            .await
            .map_err(|e| AppError::generic(MODULE, e))?;
        invalidate_after_commit(self.cache.as_ref(), &request.cache_keys(), ctx).await;

        tracing::info!(id = %request.id, "cart removed");
        Ok(Envelope::success_with(
            request.id,
            self.localizer.text("Cart Deleted"),
        ))
    }
}

#[async_trait]
impl RequestHandler<AddCartItem> for CartCommandHandler {
    #[tracing::instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: AddCartItem,
        ctx: &RequestContext,
    ) -> Result<Envelope<AggregateId>, Failure> {
        ensure_identified(ctx)?;
        let mut cart = self.load_cart(request.cart_id, ctx).await?;
        if self
            .properties
            .find(request.property_id, ctx.cancellation())
            .await?
            .is_none()
        {
            return Err(AppError::not_found(Property::entity_type()).into());
        }

        cart.add_item(request.property_id)?;
        let id = self.save_items(cart, &request.cache_keys(), ctx).await?;

        tracing::info!(%id, property_id = %request.property_id, "cart item added");
        Ok(Envelope::success_with(
            id,
            self.localizer.text("Cart Item Added"),
        ))
    }
}

#[async_trait]
impl RequestHandler<RemoveCartItem> for CartCommandHandler {
    #[tracing::instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: RemoveCartItem,
        ctx: &RequestContext,
    ) -> Result<Envelope<AggregateId>, Failure> {
        ensure_identified(ctx)?;
        let mut cart = self.load_cart(request.cart_id, ctx).await?;

        cart.remove_item(request.property_id)?;
        let id = self.save_items(cart, &request.cache_keys(), ctx).await?;

        tracing::info!(%id, property_id = %request.property_id, "cart item removed");
        Ok(Envelope::success_with(
            id,
            self.localizer.text("Cart Item Removed"),
        ))
    }
}
