//! Current-user resolution.
//!
//! The gateway in front of the service authenticates callers and forwards
//! their identity in trusted headers.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::request::Parts;
use common::{CurrentUser, RequestContext};
use uuid::Uuid;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Reads the caller from the identity headers.
///
/// A malformed user id is treated as absent.
pub fn resolve(headers: &HeaderMap) -> CurrentUser {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
    };

    let user_id = header(USER_ID_HEADER).and_then(|raw| match Uuid::parse_str(raw) {
        Ok(id) => Some(id),
        Err(error) => {
            tracing::debug!(%error, "ignoring malformed user id header");
            None
        }
    });

    CurrentUser::new(user_id, header(USER_EMAIL_HEADER).map(str::to_string))
}

/// Per-request context extracted from the identity headers.
#[derive(Debug, Clone)]
pub struct Caller(pub RequestContext);

impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Caller(RequestContext::new(resolve(&parts.headers))))
    }
}
