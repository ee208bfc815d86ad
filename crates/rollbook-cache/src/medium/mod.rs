//! Key/value media the cache can sit on.

mod memory;
mod sqlite;

pub use memory::MemoryMedium;
pub use sqlite::SqliteMedium;
