//! Customer carts of shortlisted properties.

mod aggregate;
mod commands;
mod events;
mod queries;

pub use aggregate::{Cart, CartItem, CartResponse};
pub use commands::{AddCartItem, CartCommandHandler, CreateCart, RemoveCart, RemoveCartItem};
pub use events::{CartCreatedData, CartEvent, CartItemData, CartRemovedData};
pub use queries::{CartQueryHandler, GetCartById};

use std::sync::Arc;

use common::RequestContext;

use crate::Services;
use crate::error::AppError;
use crate::mediator::MediatorBuilder;

pub const MODULE: &str = "cart";

fn ensure_identified(ctx: &RequestContext) -> Result<(), AppError> {
    if ctx.user().is_authenticated() {
        Ok(())
    } else {
        Err(AppError::Unauthorized)
    }
}

/// Registers the cart handlers.
pub fn register(builder: MediatorBuilder, services: &Services) -> MediatorBuilder {
    let commands = Arc::new(CartCommandHandler::new(
        Arc::clone(&services.carts),
        Arc::clone(&services.customers),
        Arc::clone(&services.properties),
        Arc::clone(&services.cache),
        Arc::clone(&services.localizer),
    ));
    let queries = Arc::new(CartQueryHandler::new(
        Arc::clone(&services.carts),
        Arc::clone(&services.cache),
        services.cache_options,
    ));

    builder
        .register::<CreateCart, _>(Arc::clone(&commands))
        .register::<RemoveCart, _>(Arc::clone(&commands))
        .register::<AddCartItem, _>(Arc::clone(&commands))
        .register::<RemoveCartItem, _>(commands)
        .register::<GetCartById, _>(queries)
}
