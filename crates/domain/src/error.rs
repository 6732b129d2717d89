//! Failure taxonomy shared by every handler.
//!
//! A handler either succeeds with an envelope or fails with a [`Failure`].
//! [`AppError`] is the closed set of classified outcomes, each bound to an
//! HTTP status and to localized user-facing text. Anything else travels as
//! [`Failure::Unhandled`] and is classified by the transport boundary.

use cache::CacheError;
use common::Localizer;
use event_log::EventLogError;
use thiserror::Error;

use crate::persistence::PersistenceError;

/// Boxed error used for wrapped causes.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Classified application failures.
#[derive(Debug, Error)]
pub enum AppError {
    /// A single-entity lookup by identifier found nothing.
    #[error("{entity} Not Found!")]
    NotFound { entity: &'static str },

    /// Creation collided with an existing unique key.
    #[error("{entity} already exists.")]
    AlreadyExists { entity: &'static str },

    /// The requested change contradicts the current state.
    #[error("{reason}")]
    Conflict { reason: &'static str },

    /// Input rejected before reaching a handler.
    #[error("Validation failed for '{field}'")]
    ValidationFailed { field: String, messages: Vec<String> },

    #[error("Unauthorized")]
    Unauthorized,

    /// Unexpected failure inside a module's handler, wrapping the cause.
    #[error("An error occurred while processing the {module}.")]
    Generic {
        module: &'static str,
        #[source]
        source: Option<BoxError>,
    },
}

impl AppError {
    pub fn not_found(entity: &'static str) -> Self {
        Self::NotFound { entity }
    }

    pub fn already_exists(entity: &'static str) -> Self {
        Self::AlreadyExists { entity }
    }

    pub fn conflict(reason: &'static str) -> Self {
        Self::Conflict { reason }
    }

    pub fn validation(field: impl Into<String>, messages: Vec<String>) -> Self {
        Self::ValidationFailed {
            field: field.into(),
            messages,
        }
    }

    /// Wraps an unexpected cause raised while `module` was handling a request.
    pub fn generic(module: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Generic {
            module,
            source: Some(source.into()),
        }
    }

    /// HTTP status bound to the failure kind.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::NotFound { .. } => 404,
            AppError::AlreadyExists { .. } | AppError::Conflict { .. } => 409,
            AppError::ValidationFailed { .. } => 400,
            AppError::Unauthorized => 401,
            AppError::Generic { .. } => 500,
        }
    }

    /// Short kind name written to logs and the `Exception` field.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound { .. } => "NotFound",
            AppError::AlreadyExists { .. } => "AlreadyExists",
            AppError::Conflict { .. } => "Conflict",
            AppError::ValidationFailed { .. } => "ValidationFailed",
            AppError::Unauthorized => "Unauthorized",
            AppError::Generic { .. } => "Generic",
        }
    }

    /// Localized user-facing messages.
    pub fn messages(&self, localizer: &dyn Localizer) -> Vec<String> {
        match self {
            AppError::NotFound { entity } => vec![localizer.text(&format!("{entity} Not Found!"))],
            AppError::AlreadyExists { entity } => {
                vec![localizer.text(&format!("{entity} already exists."))]
            }
            AppError::Conflict { reason } => vec![localizer.text(reason)],
            AppError::ValidationFailed { messages, .. } => messages.clone(),
            AppError::Unauthorized => vec![localizer.text("Unauthorized")],
            AppError::Generic { module, .. } => {
                let module = localizer.text(module);
                vec![localizer.translate(
                    "An error occurred while processing the {0}.",
                    &[module.as_str()],
                )]
            }
        }
    }
}

/// Outcome of a failed dispatch.
#[derive(Debug, Error)]
pub enum Failure {
    #[error(transparent)]
    Typed(#[from] AppError),

    /// Infrastructure or programming fault outside the taxonomy.
    #[error("{0}")]
    Unhandled(BoxError),
}

impl Failure {
    pub fn unhandled(error: impl Into<BoxError>) -> Self {
        Failure::Unhandled(error.into())
    }

    pub fn as_typed(&self) -> Option<&AppError> {
        match self {
            Failure::Typed(e) => Some(e),
            Failure::Unhandled(_) => None,
        }
    }

    /// The failure viewed as a plain error, for cause-chain walks.
    pub fn as_error(&self) -> &(dyn std::error::Error + 'static) {
        match self {
            Failure::Typed(e) => e,
            Failure::Unhandled(e) => e.as_ref(),
        }
    }
}

impl From<PersistenceError> for Failure {
    fn from(e: PersistenceError) -> Self {
        Failure::Unhandled(Box::new(e))
    }
}

impl From<CacheError> for Failure {
    fn from(e: CacheError) -> Self {
        Failure::Unhandled(Box::new(e))
    }
}

impl From<EventLogError> for Failure {
    fn from(e: EventLogError) -> Self {
        Failure::Unhandled(Box::new(e))
    }
}
