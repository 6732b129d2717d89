//! Property queries and their handler.

use std::sync::Arc;

use async_trait::async_trait;
use cache::{Cache, CacheExt, CacheKey, EntryOptions};
use common::{AggregateId, Envelope, PageRequest, PaginatedEnvelope, RequestContext};

use crate::aggregate::Aggregate;
use crate::error::{AppError, Failure};
use crate::mediator::{Request, RequestHandler};
use crate::persistence::Repository;

use super::{Property, PropertyResponse};

#[derive(Debug, Clone)]
pub struct GetPropertyById {
    pub id: AggregateId,
}

impl Request for GetPropertyById {
    type Response = Envelope<PropertyResponse>;
}

/// One page of properties, optionally filtered by a search string.
#[derive(Debug, Clone, Default)]
pub struct GetAllProperties {
    pub search: Option<String>,
    pub page: PageRequest,
}

impl Request for GetAllProperties {
    type Response = PaginatedEnvelope<PropertyResponse>;
}

/// Handles every property query.
pub struct PropertyQueryHandler {
    properties: Arc<dyn Repository<Property>>,
    cache: Arc<dyn Cache>,
    cache_options: EntryOptions,
}

impl PropertyQueryHandler {
    pub fn new(
        properties: Arc<dyn Repository<Property>>,
        cache: Arc<dyn Cache>,
        cache_options: EntryOptions,
    ) -> Self {
        Self {
            properties,
            cache,
            cache_options,
        }
    }
}

#[async_trait]
impl RequestHandler<GetPropertyById> for PropertyQueryHandler {
    #[tracing::instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: GetPropertyById,
        ctx: &RequestContext,
    ) -> Result<Envelope<PropertyResponse>, Failure> {
        let key = CacheKey::entity(Property::entity_type(), request.id);
        let properties = Arc::clone(&self.properties);
        let cancel = ctx.cancellation().clone();

        let load = || async move {
            let found = properties
                .find(request.id, &cancel)
                .await
                .map_err(Failure::from)?;
            found
                .map(|property| PropertyResponse::from(&property))
                .ok_or_else(|| Failure::from(AppError::not_found(Property::entity_type())))
        };

        let response = self
            .cache
            .get_or_load(&key, self.cache_options, ctx.cancellation(), load)
            .await?;

        Ok(Envelope::success(response))
    }
}

#[async_trait]
impl RequestHandler<GetAllProperties> for PropertyQueryHandler {
    #[tracing::instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: GetAllProperties,
        ctx: &RequestContext,
    ) -> Result<PaginatedEnvelope<PropertyResponse>, Failure> {
        let needle = request
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase);

        let properties = self
            .properties
            .list(
                &|p: &Property| needle.as_deref().is_none_or(|n| p.matches(n)),
                ctx.cancellation(),
            )
            .await?;

        let items = properties.iter().map(PropertyResponse::from).collect();
        Ok(PaginatedEnvelope::from_items(items, request.page))
    }
}
