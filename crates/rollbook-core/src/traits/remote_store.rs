use async_trait::async_trait;

use crate::errors::RemoteFailure;
use crate::models::SetOptions;

/// Remote durable document store, addressed by collection and id.
///
/// Implementations report raw failures; classification into
/// transient/quota/unknown happens in the adapter above them.
#[async_trait]
pub trait RemoteDocumentStore: Send + Sync {
    /// Fetch a document. `Ok(None)` means the document does not exist.
    async fn get(&self, collection: &str, id: &str)
        -> Result<Option<serde_json::Value>, RemoteFailure>;

    /// Upsert a document, replacing it or merging fields per `options`.
    async fn set(
        &self,
        collection: &str,
        id: &str,
        doc: &serde_json::Value,
        options: SetOptions,
    ) -> Result<(), RemoteFailure>;
}
