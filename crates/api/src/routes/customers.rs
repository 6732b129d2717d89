//! Customer endpoints.

use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use common::{AggregateId, Envelope, PaginatedEnvelope};
use domain::MediatorBuilder;
use domain::customer::{
    CustomerDetails, CustomerResponse, GetAllCustomers, GetCustomerById, RegisterCustomer,
    RemoveCustomer, UpdateCustomer,
};

use super::ListParams;
use crate::error::HandlerFailure;
use crate::middleware::Caller;
use crate::state::AppState;
use crate::validation::{body_rejection, parse_id, query_rejection, validate};

pub(crate) fn require(builder: MediatorBuilder) -> MediatorBuilder {
    builder
        .require::<RegisterCustomer>()
        .require::<UpdateCustomer>()
        .require::<RemoveCustomer>()
        .require::<GetCustomerById>()
        .require::<GetAllCustomers>()
}

/// POST /api/v1/customers
#[tracing::instrument(skip_all)]
pub async fn create(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    body: Result<Json<CustomerDetails>, JsonRejection>,
) -> Result<(StatusCode, Json<Envelope<AggregateId>>), HandlerFailure> {
    let Json(details) = body.map_err(|e| body_rejection(e, state.localizer()))?;
    validate(&details, state.localizer())?;

    let envelope = state
        .mediator
        .send(RegisterCustomer { details }, &ctx)
        .await?;
    Ok((StatusCode::CREATED, Json(envelope)))
}

/// GET /api/v1/customers
#[tracing::instrument(skip_all)]
pub async fn list(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<PaginatedEnvelope<CustomerResponse>>, HandlerFailure> {
    let Query(params) = params.map_err(|e| query_rejection(e, state.localizer()))?;

    let request = GetAllCustomers {
        page: params.page(),
        search: params.search,
    };
    Ok(Json(state.mediator.send(request, &ctx).await?))
}

/// GET /api/v1/customers/{id}
#[tracing::instrument(skip(state, ctx))]
pub async fn get(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(id): Path<String>,
) -> Result<Json<Envelope<CustomerResponse>>, HandlerFailure> {
    let id = parse_id("id", &id, state.localizer())?;
    Ok(Json(state.mediator.send(GetCustomerById { id }, &ctx).await?))
}

/// PUT /api/v1/customers/{id}
#[tracing::instrument(skip(state, ctx, body))]
pub async fn update(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(id): Path<String>,
    body: Result<Json<CustomerDetails>, JsonRejection>,
) -> Result<Json<Envelope<AggregateId>>, HandlerFailure> {
    let id = parse_id("id", &id, state.localizer())?;
    let Json(details) = body.map_err(|e| body_rejection(e, state.localizer()))?;
    validate(&details, state.localizer())?;

    Ok(Json(
        state
            .mediator
            .send(UpdateCustomer { id, details }, &ctx)
            .await?,
    ))
}

/// DELETE /api/v1/customers/{id}
#[tracing::instrument(skip(state, ctx))]
pub async fn remove(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(id): Path<String>,
) -> Result<Json<Envelope<AggregateId>>, HandlerFailure> {
    let id = parse_id("id", &id, state.localizer())?;
    Ok(Json(state.mediator.send(RemoveCustomer { id }, &ctx).await?))
}
