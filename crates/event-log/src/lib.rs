//! Domain Event Log.
//!
//! Records of semantic events produced by aggregate mutations land here once
//! the persistence boundary has committed the owning write. The log is
//! append-only and never part of the entity's own row.

pub mod error;
pub mod event;
pub mod memory;
pub mod postgres;
pub mod query;
pub mod store;

pub use common::AggregateId;
pub use error::{EventLogError, Result};
pub use event::{EventId, EventRecord, EventRecordBuilder};
pub use memory::InMemoryEventLog;
pub use postgres::PostgresEventLog;
pub use query::EventQuery;
pub use store::{EventLog, EventLogExt, EventStream};
