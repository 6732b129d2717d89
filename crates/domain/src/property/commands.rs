//! Property commands and their handler.

use std::sync::Arc;

use async_trait::async_trait;
use cache::{Cache, CacheKey};
use common::{AggregateId, Envelope, Localizer, RequestContext};

use crate::aggregate::Aggregate;
use crate::code::CodeGenerator;
use crate::error::{AppError, Failure};
use crate::invalidation::{InvalidatesCache, invalidate_after_commit};
use crate::mediator::{Request, RequestHandler};
use crate::persistence::{ChangeSet, Repository};

use super::{MODULE, Property, PropertyDetails};

/// Registers a new property under a generated internal code.
#[derive(Debug, Clone)]
pub struct RegisterProperty {
    pub details: PropertyDetails,
}

impl Request for RegisterProperty {
    type Response = Envelope<AggregateId>;
}

/// Replaces the details of an existing property.
#[derive(Debug, Clone)]
pub struct UpdateProperty {
    pub id: AggregateId,
    pub details: PropertyDetails,
}

impl Request for UpdateProperty {
    type Response = Envelope<AggregateId>;
}

impl InvalidatesCache for UpdateProperty {
    fn cache_keys(&self) -> Vec<CacheKey> {
        vec![CacheKey::entity(Property::entity_type(), self.id)]
    }
}

#[derive(Debug, Clone)]
pub struct RemoveProperty {
    pub id: AggregateId,
}

impl Request for RemoveProperty {
    type Response = Envelope<AggregateId>;
}

impl InvalidatesCache for RemoveProperty {
    fn cache_keys(&self) -> Vec<CacheKey> {
        vec![CacheKey::entity(Property::entity_type(), self.id)]
    }
}

/// Handles every property command.
pub struct PropertyCommandHandler {
    properties: Arc<dyn Repository<Property>>,
    cache: Arc<dyn Cache>,
    localizer: Arc<dyn Localizer>,
    codes: Arc<dyn CodeGenerator>,
}

impl PropertyCommandHandler {
    pub fn new(
        properties: Arc<dyn Repository<Property>>,
        cache: Arc<dyn Cache>,
        localizer: Arc<dyn Localizer>,
        codes: Arc<dyn CodeGenerator>,
    ) -> Self {
        Self {
            properties,
            cache,
            localizer,
            codes,
        }
    }
}

#[async_trait]
impl RequestHandler<RegisterProperty> for PropertyCommandHandler {
    #[tracing::instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: RegisterProperty,
        ctx: &RequestContext,
    ) -> Result<Envelope<AggregateId>, Failure> {
        let code = self.codes.generate();
        let taken = self
            .properties
            .any(&|p: &Property| p.code() == code, ctx.cancellation())
            .await?;
        if taken {
            return Err(AppError::already_exists(Property::entity_type()).into());
        }

        let property = Property::register(code, request.details);
        let id = property.id();
        self.properties
            .save_changes(ChangeSet::new().add(property), ctx)
            .await
            .map_err(|e| AppError::generic(MODULE, e))?;

        tracing::info!(%id, "property registered");
        Ok(Envelope::success_with(
            id,
            self.localizer.text("Property Saved"),
        ))
    }
}

#[async_trait]
impl RequestHandler<UpdateProperty> for PropertyCommandHandler {
    #[tracing::instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: UpdateProperty,
        ctx: &RequestContext,
    ) -> Result<Envelope<AggregateId>, Failure> {
        let keys = request.cache_keys();
        let Some(mut property) = self.properties.find(request.id, ctx.cancellation()).await?
        else {
            return Err(AppError::not_found(Property::entity_type()).into());
        };

        property.update(request.details);
        self.properties
            .save_changes(ChangeSet::new().update(property), ctx)
            .await
            .map_err(|e| AppError::generic(MODULE, e))?;
        invalidate_after_commit(self.cache.as_ref(), &keys, ctx).await;

        tracing::info!(id = %request.id, "property updated");
        Ok(Envelope::success_with(
            request.id,
            self.localizer.text("Property Updated"),
        ))
    }
}

#[async_trait]
impl RequestHandler<RemoveProperty> for PropertyCommandHandler {
    #[tracing::instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: RemoveProperty,
        ctx: &RequestContext,
    ) -> Result<Envelope<AggregateId>, Failure> {
        let Some(mut property) = self.properties.find(request.id, ctx.cancellation()).await?
        else {
            return Err(AppError::not_found(Property::entity_type()).into());
        };

        property.mark_removed();
        self.properties
            .save_changes(ChangeSet::new().remove(property), ctx)
            .await
            .map_err(|e| AppError::generic(MODULE, e))?;
        invalidate_after_commit(self.cache.as_ref(), &request.cache_keys(), ctx).await;

        tracing::info!(id = %request.id, "property removed");
        Ok(Envelope::success_with(
            request.id,
            self.localizer.text("Property Deleted"),
        ))
    }
}
