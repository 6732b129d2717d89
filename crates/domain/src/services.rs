//! Collaborators shared by every handler, and the handler registry.

use std::sync::Arc;

use cache::{Cache, EntryOptions};
use common::Localizer;
use event_log::EventLog;

use crate::cart::{self, Cart};
use crate::code::{CodeGenerator, RandomCode};
use crate::customer::{self, Customer};
use crate::history;
use crate::mediator::{Mediator, MediatorBuilder, RegistrationError};
use crate::owner::{self, Owner};
use crate::persistence::{InMemoryRepository, Repository};
use crate::property::{self, Property};

/// Collaborators injected into the handlers.
#[derive(Clone)]
pub struct Services {
    pub properties: Arc<dyn Repository<Property>>,
    pub customers: Arc<dyn Repository<Customer>>,
    pub carts: Arc<dyn Repository<Cart>>,
    pub owners: Arc<dyn Repository<Owner>>,
    /// Domain event log, read back for entity history.
    pub events: Arc<dyn EventLog>,
    pub cache: Arc<dyn Cache>,
    pub localizer: Arc<dyn Localizer>,
    pub codes: Arc<dyn CodeGenerator>,
    /// Options for entries written by cache-aside reads.
    pub cache_options: EntryOptions,
}

impl Services {
    /// In-memory repositories publishing to `events`.
    pub fn in_memory(
        events: Arc<dyn EventLog>,
        cache: Arc<dyn Cache>,
        localizer: Arc<dyn Localizer>,
    ) -> Self {
        Self {
            properties: Arc::new(InMemoryRepository::<Property>::new(Arc::clone(&events))),
            customers: Arc::new(InMemoryRepository::<Customer>::new(Arc::clone(&events))),
            carts: Arc::new(InMemoryRepository::<Cart>::new(Arc::clone(&events))),
            owners: Arc::new(InMemoryRepository::<Owner>::new(Arc::clone(&events))),
            events,
            cache,
            localizer,
            codes: Arc::new(RandomCode::default()),
            cache_options: EntryOptions::default(),
        }
    }

    pub fn with_cache_options(mut self, options: EntryOptions) -> Self {
        self.cache_options = options;
        self
    }

    pub fn with_code_generator(mut self, codes: Arc<dyn CodeGenerator>) -> Self {
        self.codes = codes;
        self
    }
}

/// Registers every feature module's handlers.
pub fn register_handlers(builder: MediatorBuilder, services: &Services) -> MediatorBuilder {
    let builder = property::register(builder, services);
    let builder = customer::register(builder, services);
    let builder = owner::register(builder, services);
    let builder = cart::register(builder, services);
    history::register(builder, services)
}

/// Builds a mediator with every handler registered.
pub fn build_mediator(services: &Services) -> Result<Mediator, RegistrationError> {
    register_handlers(Mediator::builder(), services).build()
}
