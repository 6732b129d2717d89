//! Customer commands and their handler.

use std::sync::Arc;

use async_trait::async_trait;
use cache::{Cache, CacheKey};
use common::{AggregateId, Envelope, Localizer, RequestContext};

use crate::aggregate::Aggregate;
use crate::error::{AppError, Failure};
use crate::invalidation::{InvalidatesCache, invalidate_after_commit};
use crate::mediator::{Request, RequestHandler};
use crate::persistence::{ChangeSet, Repository};

use super::{Customer, CustomerDetails, MODULE};

/// Registers a customer. Emails are unique, ignoring case.
#[derive(Debug, Clone)]
pub struct RegisterCustomer {
    pub details: CustomerDetails,
}

impl Request for RegisterCustomer {
    type Response = Envelope<AggregateId>;
}

#[derive(Debug, Clone)]
pub struct UpdateCustomer {
    pub id: AggregateId,
    pub details: CustomerDetails,
}

impl Request for UpdateCustomer {
    type Response = Envelope<AggregateId>;
}

impl InvalidatesCache for UpdateCustomer {
    fn cache_keys(&self) -> Vec<CacheKey> {
        vec![CacheKey::entity(Customer::entity_type(), self.id)]
    }
}

#[derive(Debug, Clone)]
pub struct RemoveCustomer {
    pub id: AggregateId,
}

impl Request for RemoveCustomer {
    type Response = Envelope<AggregateId>;
}

impl InvalidatesCache for RemoveCustomer {
    fn cache_keys(&self) -> Vec<CacheKey> {
        vec![CacheKey::entity(Customer::entity_type(), self.id)]
    }
}

pub struct CustomerCommandHandler {
    customers: Arc<dyn Repository<Customer>>,
    cache: Arc<dyn Cache>,
    localizer: Arc<dyn Localizer>,
}

impl CustomerCommandHandler {
    pub fn new(
        customers: Arc<dyn Repository<Customer>>,
        cache: Arc<dyn Cache>,
        localizer: Arc<dyn Localizer>,
    ) -> Self {
        Self {
            customers,
            cache,
            localizer,
        }
    }
}

#[async_trait]
impl RequestHandler<RegisterCustomer> for CustomerCommandHandler {
    #[tracing::instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: RegisterCustomer,
        ctx: &RequestContext,
    ) -> Result<Envelope<AggregateId>, Failure> {
        let email = request.details.email.clone();
        let taken = self
            .customers
            .any(&|c: &Customer| c.has_email(&email), ctx.cancellation())
            .await?;
        if taken {
            return Err(AppError::already_exists(Customer::entity_type()).into());
        }

        let customer = Customer::register(request.details);
        let id = customer.id();
        self.customers
            .save_changes(ChangeSet::new().add(customer), ctx)
            .await
            .map_err(|e| AppError::generic(MODULE, e))?;

        tracing::info!(%id, "customer registered");
        Ok(Envelope::success_with(
            id,
            self.localizer.text("Customer Saved"),
        ))
    }
}

#[async_trait]
impl RequestHandler<UpdateCustomer> for CustomerCommandHandler {
    #[tracing::instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: UpdateCustomer,
        ctx: &RequestContext,
    ) -> Result<Envelope<AggregateId>, Failure> {
        let keys = request.cache_keys();
        let id = request.id;
        let email = request.details.email.clone();
        let taken = self
            .customers
            .any(
                &|c: &Customer| c.id() != id && c.has_email(&email),
                ctx.cancellation(),
            )
            .await?;
        if taken {
            return Err(AppError::already_exists(Customer::entity_type()).into());
        }

        let Some(mut customer) = self.customers.find(id, ctx.cancellation()).await? else {
            return Err(AppError::not_found(Customer::entity_type()).into());
        };

        customer.update(request.details);
        self.customers
            .save_changes(ChangeSet::new().update(customer), ctx)
            .await
            .map_err(|e| AppError::generic(MODULE, e))?;
        invalidate_after_commit(self.cache.as_ref(), &keys, ctx).await;

        tracing::info!(%id, "customer updated");
        Ok(Envelope::success_with(
            id,
            self.localizer.text("Customer Updated"),
        ))
    }
}

#[async_trait]
impl RequestHandler<RemoveCustomer> for CustomerCommandHandler {
    #[tracing::instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: RemoveCustomer,
        ctx: &RequestContext,
    ) -> Result<Envelope<AggregateId>, Failure> {
        let Some(mut customer) = self.customers.find(request.id, ctx.cancellation()).await?
        else {
            return Err(AppError::not_found(Customer::entity_type()).into());
        };

        customer.mark_removed();
        self.customers
            .save_changes(ChangeSet::new().remove(customer), ctx)
            .await
            .map_err(|e| AppError::generic(MODULE, e))?;
        invalidate_after_commit(self.cache.as_ref(), &request.cache_keys(), ctx).await;

        tracing::info!(id = %request.id, "customer removed");
        Ok(Envelope::success_with(
            request.id,
            self.localizer.text("Customer Deleted"),
        ))
    }
}
