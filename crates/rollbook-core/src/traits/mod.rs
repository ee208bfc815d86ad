mod clock;
mod medium;
mod remote_store;

pub use clock::Clock;
pub use medium::KeyValueMedium;
pub use remote_store::RemoteDocumentStore;
