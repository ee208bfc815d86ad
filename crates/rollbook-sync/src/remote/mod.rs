//! Remote document store back-ends.

#[cfg(feature = "cloud")]
mod http;
mod memory;
mod merge;

#[cfg(feature = "cloud")]
pub use http::HttpDocumentStore;
pub use memory::MemoryDocumentStore;
pub use merge::merge_fields;
