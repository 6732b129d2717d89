//! Customer queries and their handler.

use std::sync::Arc;

use async_trait::async_trait;
use cache::{Cache, CacheExt, CacheKey, EntryOptions};
use common::{AggregateId, Envelope, PageRequest, PaginatedEnvelope, RequestContext};

use crate::aggregate::Aggregate;
use crate::error::{AppError, Failure};
use crate::mediator::{Request, RequestHandler};
use crate::persistence::Repository;

use super::{Customer, CustomerResponse};

#[derive(Debug, Clone)]
pub struct GetCustomerById {
    pub id: AggregateId,
}

impl Request for GetCustomerById {
    type Response = Envelope<CustomerResponse>;
}

/// Customers with an email, optionally narrowed by a search string.
#[derive(Debug, Clone, Default)]
pub struct GetAllCustomers {
    pub search: Option<String>,
    pub page: PageRequest,
}

impl Request for GetAllCustomers {
    type Response = PaginatedEnvelope<CustomerResponse>;
}

pub struct CustomerQueryHandler {
    customers: Arc<dyn Repository<Customer>>,
    cache: Arc<dyn Cache>,
    cache_options: EntryOptions,
}

impl CustomerQueryHandler {
    pub fn new(
        customers: Arc<dyn Repository<Customer>>,
        cache: Arc<dyn Cache>,
        cache_options: EntryOptions,
    ) -> Self {
        Self {
            customers,
            cache,
            cache_options,
        }
    }
}

#[async_trait]
impl RequestHandler<GetCustomerById> for CustomerQueryHandler {
    #[tracing::instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: GetCustomerById,
        ctx: &RequestContext,
    ) -> Result<Envelope<CustomerResponse>, Failure> {
        let key = CacheKey::entity(Customer::entity_type(), request.id);
        let customers = Arc::clone(&self.customers);
        let cancel = ctx.cancellation().clone();

        let load = || async move {
            let found = customers
                .find(request.id, &cancel)
                .await
                .map_err(Failure::from)?;
            found
                .map(|customer| CustomerResponse::from(&customer))
                .ok_or_else(|| Failure::from(AppError::not_found(Customer::entity_type())))
        };

        let response = self
            .cache
            .get_or_load(&key, self.cache_options, ctx.cancellation(), load)
            .await?;

        Ok(Envelope::success(response))
    }
}

#[async_trait]
impl RequestHandler<GetAllCustomers> for CustomerQueryHandler {
    #[tracing::instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: GetAllCustomers,
        ctx: &RequestContext,
    ) -> Result<PaginatedEnvelope<CustomerResponse>, Failure> {
        let needle = request
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let customers = self
            .customers
            .list(
                &|c: &Customer| c.matches(needle.as_deref()),
                ctx.cancellation(),
            )
            .await?;

        let items = customers.iter().map(CustomerResponse::from).collect();
        Ok(PaginatedEnvelope::from_items(items, request.page))
    }
}
