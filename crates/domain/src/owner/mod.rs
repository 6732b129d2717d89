//! Property owners.

mod aggregate;
mod commands;
mod events;
mod queries;

pub use aggregate::{Owner, OwnerDetails, OwnerResponse};
pub use commands::{OwnerCommandHandler, RegisterOwner, RemoveOwner, UpdateOwner};
pub use events::{OwnerEvent, OwnerRemovedData, OwnerSnapshotData};
pub use queries::{GetAllOwners, GetOwnerById, OwnerQueryHandler};

use std::sync::Arc;

use crate::Services;
use crate::mediator::MediatorBuilder;

pub const MODULE: &str = "owner";

/// Registers the owner handlers.
pub fn register(builder: MediatorBuilder, services: &Services) -> MediatorBuilder {
    let commands = Arc::new(OwnerCommandHandler::new(
        Arc::clone(&services.owners),
        Arc::clone(&services.cache),
        Arc::clone(&services.localizer),
    ));
    let queries = Arc::new(OwnerQueryHandler::new(
        Arc::clone(&services.owners),
        Arc::clone(&services.cache),
        services.cache_options,
    ));

    builder
        .register::<RegisterOwner, _>(Arc::clone(&commands))
        .register::<UpdateOwner, _>(Arc::clone(&commands))
        .register::<RemoveOwner, _>(commands)
        .register::<GetOwnerById, _>(Arc::clone(&queries))
        .register::<GetAllOwners, _>(queries)
}
