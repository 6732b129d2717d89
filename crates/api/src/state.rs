//! Shared application state.

use std::sync::Arc;

use cache::InMemoryCache;
use common::{Localizer, ResourceLocalizer};
use domain::{Mediator, RegistrationError, Services, register_handlers};
use event_log::EventLog;

use crate::config::Config;
use crate::middleware::ErrorTranslation;
use crate::routes::required_requests;

/// State shared by every route.
#[derive(Clone)]
pub struct AppState {
    pub mediator: Arc<Mediator>,
    localizer: Arc<dyn Localizer>,
    translation: ErrorTranslation,
}

impl AppState {
    /// Builds the mediator for `services` and checks that every request the
    /// routes dispatch has exactly one handler.
    pub fn new(services: &Services, config: &Config) -> Result<Self, RegistrationError> {
        let mediator =
            required_requests(register_handlers(Mediator::builder(), services)).build()?;

        Ok(Self {
            mediator: Arc::new(mediator),
            localizer: Arc::clone(&services.localizer),
            translation: ErrorTranslation::new(config, Arc::clone(&services.localizer)),
        })
    }

    pub fn localizer(&self) -> &dyn Localizer {
        self.localizer.as_ref()
    }

    pub fn translation(&self) -> &ErrorTranslation {
        &self.translation
    }
}

/// In-memory collaborators publishing domain events to `events`.
pub fn default_services(config: &Config, events: Arc<dyn EventLog>) -> Services {
    Services::in_memory(
        events,
        Arc::new(InMemoryCache::new()),
        Arc::new(ResourceLocalizer::new(config.culture.clone())),
    )
    .with_cache_options(config.cache_options())
}
