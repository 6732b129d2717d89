//! Domain layer.
//!
//! This crate provides:
//! - The Typed Failure taxonomy ([`AppError`]) and the [`Failure`] crossing the mediator
//! - The request [`Mediator`] with startup-validated handler registration
//! - Aggregate and domain event traits, drained and published on commit
//! - The persistence gateway ([`Repository`], [`ChangeSet`])
//! - Cache invalidation bound to mutating commands
//! - Feature modules: properties, owners, customers and carts
//! - Entity history read from the domain event log

pub mod aggregate;
pub mod cart;
pub mod code;
pub mod customer;
pub mod error;
pub mod history;
pub mod invalidation;
pub mod mediator;
pub mod owner;
pub mod persistence;
pub mod property;
pub mod services;

pub use aggregate::{Aggregate, DomainEvent, EventMeta, PendingEvents};
pub use code::{CodeGenerator, RandomCode, generate_code};
pub use error::{AppError, BoxError, Failure};
pub use invalidation::{InvalidatesCache, invalidate_after_commit};
pub use mediator::{Mediator, MediatorBuilder, RegistrationError, Request, RequestHandler};
pub use persistence::{ChangeSet, InMemoryRepository, PersistenceError, Repository};
pub use services::{Services, build_mediator, register_handlers};
