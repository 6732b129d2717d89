//! Shared types used across the workspace.
//!
//! - Identifiers ([`AggregateId`], [`ErrorId`])
//! - The uniform success/failure envelopes returned by every handler
//! - The explicit per-request context threaded through dispatch
//! - The localizer every user-facing message passes through

pub mod context;
pub mod localizer;
pub mod types;
pub mod wrapper;

pub use context::{CurrentUser, RequestContext};
pub use localizer::{Localizer, LocalizerError, ResourceLocalizer};
pub use types::{AggregateId, ErrorId};
pub use wrapper::{Envelope, ErrorEnvelope, PageRequest, PaginatedEnvelope};
