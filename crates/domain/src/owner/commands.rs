//! Owner commands and their handler.

use std::sync::Arc;

use async_trait::async_trait;
use cache::{Cache, CacheKey};
use common::{AggregateId, Envelope, Localizer, RequestContext};

use crate::aggregate::Aggregate;
use crate::error::{AppError, Failure};
use crate::invalidation::{InvalidatesCache, invalidate_after_commit};
use crate::mediator::{Request, RequestHandler};
use crate::persistence::{ChangeSet, Repository};

use super::{MODULE, Owner, OwnerDetails};

/// Registers an owner. Emails are unique, ignoring case.
#[derive(Debug, Clone)]
pub struct RegisterOwner {
    pub details: OwnerDetails,
}

impl Request for RegisterOwner {
    type Response = Envelope<AggregateId>;
}

#[derive(Debug, Clone)]
pub struct UpdateOwner {
    pub id: AggregateId,
    pub details: OwnerDetails,
}

impl Request for UpdateOwner {
    type Response = Envelope<AggregateId>;
}

impl InvalidatesCache for UpdateOwner {
    fn cache_keys(&self) -> Vec<CacheKey> {
        vec![CacheKey::entity(Owner::entity_type(), self.id)]
    }
}

#[derive(Debug, Clone)]
pub struct RemoveOwner {
    pub id: AggregateId,
}

impl Request for RemoveOwner {
    type Response = Envelope<AggregateId>;
}

impl InvalidatesCache for RemoveOwner {
    fn cache_keys(&self) -> Vec<CacheKey> {
        vec![CacheKey::entity(Owner::entity_type(), self.id)]
    }
}

pub struct OwnerCommandHandler {
    owners: Arc<dyn Repository<Owner>>,
    cache: Arc<dyn Cache>,
    localizer: Arc<dyn Localizer>,
}

impl OwnerCommandHandler {
    pub fn new(
        owners: Arc<dyn Repository<Owner>>,
        cache: Arc<dyn Cache>,
        localizer: Arc<dyn Localizer>,
    ) -> Self {
        Self {
            owners,
            cache,
            localizer,
        }
    }

    async fn ensure_email_free(
        &self,
        email: &str,
        except: Option<AggregateId>,
        ctx: &RequestContext,
    ) -> Result<(), Failure> {
        let taken = self
            .owners
            .any(
                &|o: &Owner| Some(o.id()) != except && o.has_email(email),
                ctx.cancellation(),
            )
            .await?;
        if taken {
            return Err(AppError::already_exists(Owner::entity_type()).into());
        }
        Ok(())
    }
}

#[async_trait]
impl RequestHandler<RegisterOwner> for OwnerCommandHandler {
    #[tracing::instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: RegisterOwner,
        ctx: &RequestContext,
    ) -> Result<Envelope<AggregateId>, Failure> {
        self.ensure_email_free(&request.details.email, None, ctx)
            .await?;

        let owner = Owner::register(request.details);
        let id = owner.id();
        self.owners
            .save_changes(ChangeSet::new().add(owner), ctx)
            .await
            .map_err(|e| AppError::generic(MODULE, e))?;

        tracing::info!(%id, "owner registered");
        Ok(Envelope::success_with(id, self.localizer.text("Owner Saved")))
    }
}

#[async_trait]
impl RequestHandler<UpdateOwner> for OwnerCommandHandler {
    #[tracing::instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: UpdateOwner,
        ctx: &RequestContext,
    ) -> Result<Envelope<AggregateId>, Failure> {
        let keys = request.cache_keys();
        let id = request.id;
        self.ensure_email_free(&request.details.email, Some(id), ctx)
            .await?;

        let Some(mut owner) = self.owners.find(id, ctx.cancellation()).await? else {
            return Err(AppError::not_found(Owner::entity_type()).into());
        };

        owner.update(request.details);
        self.owners
            .save_changes(ChangeSet::new().update(owner), ctx)
            .await
            .map_err(|e| AppError::generic(MODULE, e))?;
        invalidate_after_commit(self.cache.as_ref(), &keys, ctx).await;

        tracing::info!(%id, "owner updated");
        Ok(Envelope::success_with(id, self.localizer.text("Owner Updated")))
    }
}

#[async_trait]
impl RequestHandler<RemoveOwner> for OwnerCommandHandler {
    #[tracing::instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: RemoveOwner,
        ctx: &RequestContext,
    ) -> Result<Envelope<AggregateId>, Failure> {
        let Some(mut owner) = self.owners.find(request.id, ctx.cancellation()).await? else {
            return Err(AppError::not_found(Owner::entity_type()).into());
        };

        owner.mark_removed();
        self.owners
            .save_changes(ChangeSet::new().remove(owner), ctx)
            .await
            .map_err(|e| AppError::generic(MODULE, e))?;
        invalidate_after_commit(self.cache.as_ref(), &request.cache_keys(), ctx).await;

        tracing::info!(id = %request.id, "owner removed");
        Ok(Envelope::success_with(
            request.id,
            self.localizer.text("Owner Deleted"),
        ))
    }
}
