use crate::bom::domain::ContentHash;
use crate::shared::Result;
use async_trait::async_trait;

/// HashSource port for checksum authorities
///
/// Implemented by the package index and artifact repository clients, for
/// ecosystems whose manifests do not embed a content hash.
///
/// # Async Support
/// Implementations must be `Send + Sync` so the worker pool can share one
/// instance across workers.
#[async_trait]
pub trait HashSource: Send + Sync {
    /// Fetches the content hash of a (name, version) pair
    ///
    /// # Returns
    /// The canonical hash. The "no hash" state is returned when the
    /// authority knows the package but publishes no digest for it.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The network request fails or returns an error status
    /// - The response cannot be parsed
    /// - A published digest is malformed
    async fn resolve(&self, name: &str, version: &str) -> Result<ContentHash>;
}
