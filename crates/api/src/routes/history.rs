//! Entity history endpoint.

use axum::Json;
use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use chrono::{DateTime, Utc};
use common::{Envelope, PageRequest};
use domain::MediatorBuilder;
use domain::history::{GetEntityHistory, HistoryEntry};
use serde::Deserialize;

use crate::error::HandlerFailure;
use crate::middleware::Caller;
use crate::state::AppState;
use crate::validation::{Rules, Validate, parse_id, query_rejection, validate};

pub(crate) fn require(builder: MediatorBuilder) -> MediatorBuilder {
    builder.require::<GetEntityHistory>()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryParams {
    pub event_type: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page_number: Option<usize>,
    pub page_size: Option<usize>,
}

impl Validate for HistoryParams {
    fn validate(&self, rules: &mut Rules<'_>) {
        rules.ordered("from", self.from.as_ref(), "to", self.to.as_ref());
    }
}

/// GET /api/v1/history/{id}
#[tracing::instrument(skip(state, ctx, params))]
pub async fn get(
    State(state): State<AppState>,
    Caller(ctx): Caller,
    Path(id): Path<String>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> Result<Json<Envelope<Vec<HistoryEntry>>>, HandlerFailure> {
    let aggregate_id = parse_id("id", &id, state.localizer())?;
    let Query(params) = params.map_err(|e| query_rejection(e, state.localizer()))?;
    validate(&params, state.localizer())?;

    let request = GetEntityHistory {
        aggregate_id,
        event_type: params.event_type.filter(|t| !t.trim().is_empty()),
        from: params.from,
        to: params.to,
        page: PageRequest::new(
            params.page_number.unwrap_or(1),
            params.page_size.unwrap_or(PageRequest::DEFAULT_PAGE_SIZE),
        ),
    };
    Ok(Json(state.mediator.send(request, &ctx).await?))
}
