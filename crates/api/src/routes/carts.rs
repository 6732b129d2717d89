//! Cart endpoints. Every cart request needs an identified caller.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::{AggregateId, Envelope};
use domain::MediatorBuilder;
use domain::cart::{AddCartItem, CartResponse, CreateCart, GetCartById, RemoveCart, RemoveCartItem};
use serde::Deserialize;

use crate::error::HandlerFailure;
use crate::middleware::Caller;
use crate::state::AppState;
use crate::validation::{body_rejection, parse_id};

pub(crate) fn require(builder: MediatorBuilder) -> MediatorBuilder {
    builder
        .require::<CreateCart>()
        .require::<RemoveCart>()
        .require::<AddCartItem>()
        .require::<RemoveCartItem>()
        .require::<GetCartById>()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCartBody {
    pub customer_id: AggregateId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemBody {
    pub property_id: AggregateId,
}

/// POST /api/v1/carts
#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    body: Result<Json<CreateCartBody>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<AggregateId>>), HandlerFailure> {
    let Json(body) = body.map_err(|e| body_rejection(e, state.localizer()))?;

    let envelope = state
        .mediator
        .send(
            CreateCart {
                customer_id: body.customer_id,
            },
            &ctx,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(envelope)))
}

/// GET /api/v1/carts/{id}
#[tracing::instrument(skip(state, ctx))]
pub async fn get(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(id): Path<String>,
) -> Result<Json<Envelope<CartResponse>>, HandlerFailure> {
    let id = parse_id("id", &id, state.localizer())?;
    Ok(Json(state.mediator.send(GetCartById { id }, &ctx).await?))
}

/// DELETE /api/v1/carts/{id}
#[tracing::instrument(skip(state, ctx))]
pub async fn remove(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(id): Path<String>,
) -> Result<Json<Envelope<AggregateId>>, HandlerFailure> {
    let id = parse_id("id", &id, state.localizer())?;
    Ok(Json(state.mediator.send(RemoveCart { id }, &ctx).await?))
}

/// POST /api/v1/carts/{id}/items
#[tracing::instrument(skip(state, ctx, body))]
pub async fn add_item(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(id): Path<String>,
    body: Result<Json<AddItemBody>, JsonRejection>,
) -> Result<Json<Envelope<AggregateId>>, HandlerFailure> {
    let cart_id = parse_id("id", &id, state.localizer())?;
    let Json(body) = body.map_err(|e| body_rejection(e, state.localizer()))?;

    let request = AddCartItem {
        cart_id,
        property_id: body.property_id,
    };
    Ok(Json(state.mediator.send(request, &ctx).await?))
}

/// DELETE /api/v1/carts/{id}/items/{property_id}
#[tracing::instrument(skip(state, ctx))]
pub async fn remove_item(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path((id, property_id)): Path<(String, String)>,
) -> Result<Json<Envelope<AggregateId>>, HandlerFailure> {
    let request = RemoveCartItem {
        cart_id: parse_id("id", &id, state.localizer())?,
        property_id: parse_id("propertyId", &property_id, state.localizer())?,
    };
    Ok(Json(state.mediator.send(request, &ctx).await?))
}
