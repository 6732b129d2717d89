//! Customer management.

mod aggregate;
mod commands;
mod events;
mod queries;

pub use aggregate::{Customer, CustomerDetails, CustomerResponse};
pub use commands::{CustomerCommandHandler, RegisterCustomer, RemoveCustomer, UpdateCustomer};
pub use events::{CustomerEvent, CustomerRemovedData, CustomerSnapshotData};
pub use queries::{CustomerQueryHandler, GetAllCustomers, GetCustomerById};

use std::sync::Arc;

use crate::Services;
use crate::mediator::MediatorBuilder;

pub const MODULE: &str = "customer";

/// Registers the customer handlers.
pub fn register(builder: MediatorBuilder, services: &Services) -> MediatorBuilder {
    let commands = Arc::new(CustomerCommandHandler::new(
        Arc::clone(&services.customers),
        Arc::clone(&services.cache),
        Arc::clone(&services.localizer),
    ));
    let queries = Arc::new(CustomerQueryHandler::new(
        Arc::clone(&services.customers),
        Arc::clone(&services.cache),
        services.cache_options,
    ));

    builder
        .register::<RegisterCustomer, _>(Arc::clone(&commands))
        .register::<UpdateCustomer, _>(Arc::clone(&commands))
        .register::<RemoveCustomer, _>(commands)
        .register::<GetCustomerById, _>(Arc::clone(&queries))
        .register::<GetAllCustomers, _>(queries)
}
