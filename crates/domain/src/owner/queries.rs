//! Owner queries and their handler.

use std::sync::Arc;

use async_trait::async_trait;
use cache::{Cache, CacheExt, CacheKey, EntryOptions};
use common::{AggregateId, Envelope, PageRequest, PaginatedEnvelope, RequestContext};

use crate::aggregate::Aggregate;
use crate::error::{AppError, Failure};
use crate::mediator::{Request, RequestHandler};
use crate::persistence::Repository;

use super::{Owner, OwnerResponse};

#[derive(Debug, Clone)]
pub struct GetOwnerById {
    pub id: AggregateId,
}

impl Request for GetOwnerById {
    type Response = Envelope<OwnerResponse>;
}

/// Every owner, optionally narrowed by a search string.
#[derive(Debug, Clone, Default)]
pub struct GetAllOwners {
    pub search: Option<String>,
    pub page: PageRequest,
}

impl Request for GetAllOwners {
    type Response = PaginatedEnvelope<OwnerResponse>;
}

pub struct OwnerQueryHandler {
    owners: Arc<dyn Repository<Owner>>,
    cache: Arc<dyn Cache>,
    cache_options: EntryOptions,
}

impl OwnerQueryHandler {
    pub fn new(
        owners: Arc<dyn Repository<Owner>>,
        cache: Arc<dyn Cache>,
        cache_options: EntryOptions,
    ) -> Self {
        Self {
            owners,
            cache,
            cache_options,
        }
    }
}

#[async_trait]
impl RequestHandler<GetOwnerById> for OwnerQueryHandler {
    #[tracing::instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: GetOwnerById,
        ctx: &RequestContext,
    ) -> Result<Envelope<OwnerResponse>, Failure> {
        let key = CacheKey::entity(Owner::entity_type(), request.id);
        let owners = Arc::clone(&self.owners);
        let cancel = ctx.cancellation().clone();

        let load = || async move {
            let found = owners
                .find(request.id, &cancel)
                .await
                .map_err(Failure::from)?;
            found
                .map(|owner| OwnerResponse::from(&owner))
                .ok_or_else(|| Failure::from(AppError::not_found(Owner::entity_type())))
        };

        let response = self
            .cache
            .get_or_load(&key, self.cache_options, ctx.cancellation(), load)
            .await?;

        Ok(Envelope::success(response))
    }
}

#[async_trait]
impl RequestHandler<GetAllOwners> for OwnerQueryHandler {
    #[tracing::instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: GetAllOwners,
        ctx: &RequestContext,
    ) -> Result<PaginatedEnvelope<OwnerResponse>, Failure> {
        let needle = request
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let owners = self
            .owners
            .list(
                &|c: &Owner| c.matches(needle.as_deref()),
                ctx.cancellation(),
            )
            .await?;

        let items = owners.iter().map(OwnerResponse::from).collect();
        Ok(PaginatedEnvelope::from_items(items, request.page))
    }
}
