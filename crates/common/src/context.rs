//! Explicit per-request context threaded through dispatch.

use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Marker used for audit correlation when no user is identified.
pub const ANONYMOUS: &str = "Anonymous";

/// Identity of the caller, resolved once at the transport edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CurrentUser {
    user_id: Option<Uuid>,
    email: Option<String>,
}

impl CurrentUser {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn new(user_id: Option<Uuid>, email: Option<String>) -> Self {
        Self {
            user_id,
            email: email.filter(|e| !e.trim().is_empty()),
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        self.user_id
    }

    pub fn user_email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn email_or_anonymous(&self) -> &str {
        self.user_email().unwrap_or(ANONYMOUS)
    }

    pub fn is_authenticated(&self) -> bool {
        self.user_id.is_some()
    }
}

/// Context for one inbound request.
///
/// Carries the request id, the caller, and the externally supplied
/// cancellation signal that persistence and cache calls honor.
#[derive(Debug, Clone)]
pub struct RequestContext {
    request_id: Uuid,
    user: CurrentUser,
    cancellation: CancellationToken,
}

impl RequestContext {
    pub fn new(user: CurrentUser) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            user,
            cancellation: CancellationToken::new(),
        }
    }

    /// Context for background work and tests: anonymous, never cancelled.
    pub fn anonymous() -> Self {
        Self::new(CurrentUser::anonymous())
    }

    pub fn with_cancellation(mut self, cancellation: CancellationToken) -> Self {
        self.cancellation = cancellation;
        self
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn user(&self) -> &CurrentUser {
        &self.user
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancellation
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}
