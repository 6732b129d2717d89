//! Cart queries.

use std::sync::Arc;

use async_trait::async_trait;
use cache::{Cache, CacheExt, CacheKey, EntryOptions};
use common::{AggregateId, Envelope, RequestContext};

use crate::aggregate::Aggregate;
use crate::error::{AppError, Failure};
use crate::mediator::{Request, RequestHandler};
use crate::persistence::Repository;

use super::{Cart, CartResponse, ensure_identified};

#[derive(Debug, Clone)]
pub struct GetCartById {
    pub id: AggregateId,
}

impl Request for GetCartById {
    type Response = Envelope<CartResponse>;
}

pub struct CartQueryHandler {
    carts: Arc<dyn Repository<Cart>>,
    cache: Arc<dyn Cache>,
    cache_options: EntryOptions,
}

impl CartQueryHandler {
    pub fn new(
        carts: Arc<dyn Repository<Cart>>,
        cache: Arc<dyn Cache>,
        cache_options: EntryOptions,
    ) -> Self {
        Self {
            carts,
            cache,
            cache_options,
        }
    }
}

#[async_trait]
impl RequestHandler<GetCartById> for CartQueryHandler {
    #[tracing::instrument(skip(self, ctx))]
    async fn handle(
        &self,
        request: GetCartById,
        ctx: &RequestContext,
    ) -> Result<Envelope<CartResponse>, Failure> {
        ensure_identified(ctx)?;
        let key = CacheKey::entity(Cart::entity_type(), request.id);
        let carts = Arc::clone(&self.carts);
        let cancel = ctx.cancellation().clone();

        let load = || async move {
            let found = carts
                .find(request.id, &cancel)
                .await
                .map_err(Failure::from)?;
            found
                .map(|cart| CartResponse::from(&cart))
                .ok_or_else(|| Failure::from(AppError::not_found(Cart::entity_type())))
        };

        let response = self
            .cache
            .get_or_load(&key, self.cache_options, ctx.cancellation(), load)
            .await?;

        Ok(Envelope::success(response))
    }
}
