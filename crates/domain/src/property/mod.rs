//! Real-estate listings.

mod aggregate;
mod commands;
mod events;
mod queries;

pub use aggregate::{Property, PropertyDetails, PropertyResponse};
pub use commands::{PropertyCommandHandler, RegisterProperty, RemoveProperty, UpdateProperty};
pub use events::{PropertyEvent, PropertyRemovedData, PropertySnapshotData};
pub use queries::{GetAllProperties, GetPropertyById, PropertyQueryHandler};

use std::sync::Arc;

use crate::Services;
use crate::mediator::MediatorBuilder;

/// Module name used in generic failure messages.
pub const MODULE: &str = "property";

/// Registers the property handlers.
pub fn register(builder: MediatorBuilder, services: &Services) -> MediatorBuilder {
    let commands = Arc::new(PropertyCommandHandler::new(
        Arc::clone(&services.properties),
        Arc::clone(&services.cache),
        Arc::clone(&services.localizer),
        Arc::clone(&services.codes),
    ));
    let queries = Arc::new(PropertyQueryHandler::new(
        Arc::clone(&services.properties),
        Arc::clone(&services.cache),
        services.cache_options,
    ));

    builder
        .register::<RegisterProperty, _>(Arc::clone(&commands))
        .register::<UpdateProperty, _>(Arc::clone(&commands))
        .register::<RemoveProperty, _>(commands)
        .register::<GetPropertyById, _>(Arc::clone(&queries))
        .register::<GetAllProperties, _>(queries)
}
