use crate::sbom_generation::domain::{
    ArtifactDescriptor, ArtifactKey, ComponentDescriptor, ComponentId, Requirement,
};
use crate::shared::Result;
use async_trait::async_trait;

/// MetadataRepository port for reading a loaded p2 repository
///
/// This port abstracts how component descriptors and artifacts are obtained
/// (a live p2 repository, a JSON snapshot, test fixtures).
///
/// # Concurrency
/// Enrichment tasks query the repository concurrently, so implementations
/// must be `Send + Sync` and must not mutate shared state in queries.
#[async_trait]
pub trait MetadataRepository: Send + Sync {
    /// All component descriptors, in repository order.
    fn components(&self) -> &[ComponentDescriptor];

    /// Components satisfying a requirement.
    fn query_matches(&self, requirement: &Requirement) -> Vec<ComponentId>;

    /// Every descriptor of an artifact, canonical or processed.
    fn artifact_descriptors(&self, key: &ArtifactKey) -> Vec<ArtifactDescriptor>;

    /// Location of the metadata repository that contains a component.
    fn metadata_location(&self, id: &ComponentId) -> Option<String>;

    /// Raw bytes of an artifact.
    ///
    /// # Errors
    /// Returns an error if the artifact content cannot be obtained.
    async fn artifact_bytes(&self, descriptor: &ArtifactDescriptor) -> Result<Vec<u8>>;
}
