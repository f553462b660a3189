//! Concrete `planner_core::store::PlanStore` implementations: a SQLite
//! store for durable deployments and an in-memory store for tests and
//! non-durable callers.

mod error;
mod memory;
mod sqlite;

pub use error::StoreError;
pub use memory::InMemoryPlanStore;
pub use sqlite::SqlitePlanStore;
