//! Request mediation.
//!
//! Every command and query is a [`Request`] type routed to exactly one
//! [`RequestHandler`]. Handlers are registered once at startup through a
//! [`MediatorBuilder`]; duplicate or missing registrations fail the build, so
//! a running [`Mediator`] never discovers a wiring problem per request.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use common::RequestContext;
use thiserror::Error;
use tracing::{Instrument, debug, error, info_span};

use crate::error::{AppError, Failure};

/// A typed operation. Commands mutate state, queries only read it.
pub trait Request: Send + Sync + 'static {
    /// Value returned on success.
    type Response: Send + 'static;

    /// Short type name used in spans, metrics and registration errors.
    fn name() -> &'static str {
        let full = std::any::type_name::<Self>();
        full.rsplit("::").next().unwrap_or(full)
    }
}

/// Handles one request type.
#[async_trait]
pub trait RequestHandler<R: Request>: Send + Sync + 'static {
    async fn handle(&self, request: R, ctx: &RequestContext) -> Result<R::Response, Failure>;
}

/// Invalid handler wiring detected at startup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    #[error("More than one handler registered for {request}")]
    Duplicate { request: &'static str },

    #[error("No handler registered for {request}")]
    Missing { request: &'static str },
}

type Erased = Box<dyn Any + Send + Sync>;

/// Collects handler registrations and validates them.
#[derive(Default)]
pub struct MediatorBuilder {
    handlers: HashMap<TypeId, (&'static str, Erased)>,
    required: Vec<(TypeId, &'static str)>,
    errors: Vec<RegistrationError>,
}

impl MediatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` as the single handler for `R`.
    pub fn register<R, H>(mut self, handler: Arc<H>) -> Self
    where
        R: Request,
        H: RequestHandler<R>,
    {
        let handler: Arc<dyn RequestHandler<R>> = handler;
        let key = TypeId::of::<R>();
        if self.handlers.contains_key(&key) {
            self.errors
                .push(RegistrationError::Duplicate { request: R::name() });
        } else {
            self.handlers.insert(key, (R::name(), Box::new(handler)));
        }
        self
    }

    /// Declares that callers will dispatch `R`, so a handler must exist.
    pub fn require<R: Request>(mut self) -> Self {
        self.required.push((TypeId::of::<R>(), R::name()));
        self
    }

    pub fn is_registered<R: Request>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<R>())
    }

    /// Validates the registry and produces the mediator.
    ///
    /// Fails on the first duplicate registration, then on the first required
    /// request type without a handler.
    pub fn build(self) -> Result<Mediator, RegistrationError> {
        if let Some(error) = self.errors.into_iter().next() {
            return Err(error);
        }
        if let Some((_, request)) = self
            .required
            .iter()
            .find(|(key, _)| !self.handlers.contains_key(key))
        {
            return Err(RegistrationError::Missing { request: *request });
        }

        let handlers = self
            .handlers
            .into_iter()
            .map(|(key, (_, handler))| (key, handler))
            .collect();
        Ok(Mediator { handlers })
    }
}

/// Routes requests to their registered handler.
///
/// Holds no per-request state and is shared across concurrent requests.
pub struct Mediator {
    handlers: HashMap<TypeId, Erased>,
}

impl Mediator {
    pub fn builder() -> MediatorBuilder {
        MediatorBuilder::new()
    }

    /// Dispatches `request` to its handler and awaits the result.
    pub async fn send<R: Request>(
        &self,
        request: R,
        ctx: &RequestContext,
    ) -> Result<R::Response, Failure> {
        let name = R::name();
        let Some(handler) = self
            .handlers
            .get(&TypeId::of::<R>())
            .and_then(|h| h.downcast_ref::<Arc<dyn RequestHandler<R>>>())
        else {
            error!(request = name, "Dispatch without a registered handler");
            return Err(AppError::generic(
                "request",
                RegistrationError::Missing { request: name },
            )
            .into());
        };

        let span = info_span!("dispatch", request = name, request_id = %ctx.request_id());
        let started = Instant::now();
        let result = handler.handle(request, ctx).instrument(span).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(Failure::Typed(_)) => "failure",
            Err(Failure::Unhandled(_)) => "error",
        };
        metrics::counter!("mediator_requests_total", "request" => name, "outcome" => outcome)
            .increment(1);
        metrics::histogram!("mediator_request_duration_seconds", "request" => name)
            .record(started.elapsed().as_secs_f64());
        debug!(request = name, outcome, "Request dispatched");

        result
    }

    pub fn handles<R: Request>(&self) -> bool {
        self.handlers.contains_key(&TypeId::of::<R>())
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
