//! Cache collaborator.
//!
//! Keys are derived deterministically from an entity's identity or from a
//! query's shape and parameters, so every writer can compute the exact keys
//! it must invalidate.

pub mod error;
pub mod key;
pub mod memory;
pub mod store;

pub use error::{CacheError, Result};
pub use key::CacheKey;
pub use memory::InMemoryCache;
pub use store::{Cache, CacheExt, EntryOptions};
