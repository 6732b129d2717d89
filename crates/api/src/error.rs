//! Route failures.
//!
//! Route functions return [`HandlerFailure`]. Its response carries no body:
//! the failure is parked in the response extensions and the error-translation
//! middleware turns it into the client-facing envelope.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use domain::{AppError, Failure};

/// Failure escaping a route function.
#[derive(Debug)]
pub struct HandlerFailure(pub Failure);

/// Failure waiting for translation, stored in response extensions.
#[derive(Debug, Clone)]
pub(crate) struct ParkedFailure(pub Arc<Failure>);

impl IntoResponse for HandlerFailure {
    fn into_response(self) -> Response {
        let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
        response
            .extensions_mut()
            .insert(ParkedFailure(Arc::new(self.0)));
        response
    }
}

impl From<Failure> for HandlerFailure {
    fn from(failure: Failure) -> Self {
        HandlerFailure(failure)
    }
}

impl From<AppError> for HandlerFailure {
    fn from(error: AppError) -> Self {
        HandlerFailure(Failure::Typed(error))
    }
}
