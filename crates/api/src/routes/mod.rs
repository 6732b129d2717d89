//! HTTP routes.
//!
//! Every route parses and validates its input, dispatches one request through
//! the mediator and returns the handler's envelope. Failures are left to the
//! error-translation middleware.

pub mod carts;
pub mod customers;
pub mod health;
pub mod history;
pub mod metrics;
pub mod owners;
pub mod properties;

use common::PageRequest;
use domain::MediatorBuilder;
use serde::Deserialize;

/// Declares every request the routes dispatch, so a missing handler fails
/// the mediator build instead of a request.
pub fn required_requests(builder: MediatorBuilder) -> MediatorBuilder {
    let builder = properties::require(builder);
    let builder = owners::require(builder);
    let builder = customers::require(builder);
    let builder = carts::require(builder);
    history::require(builder)
}

/// Query string of the paginated listings.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub search: Option<String>,
    pub page_number: Option<usize>,
    pub page_size: Option<usize>,
}

impl ListParams {
    pub fn page(&self) -> PageRequest {
        PageRequest::new(
            self.page_number.unwrap_or(1),
            self.page_size.unwrap_or(PageRequest::DEFAULT_PAGE_SIZE),
        )
    }
}
