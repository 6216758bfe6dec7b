//! Destination datastores and the dedup/upsert engine.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod postgrest;
pub mod upsert;

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::PostgresStore;
pub use postgrest::PostgrestStore;
pub use upsert::{DedupUpsertEngine, Disposition, PersistReport};
