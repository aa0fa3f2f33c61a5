use async_trait::async_trait;
use p2_sbom::prelude::*;
use p2_sbom::sbom_generation::domain::Properties;
use std::collections::HashMap;

pub const REPOSITORY: &str = "https://download.example.org/releases";

/// Mock MetadataRepository holding descriptors and artifact bytes in memory
///
/// Requirements match every component whose id equals the requirement name.
#[derive(Default)]
pub struct MockMetadataRepository {
    components: Vec<ComponentDescriptor>,
    artifacts: HashMap<ArtifactKey, Vec<ArtifactDescriptor>>,
    bytes: HashMap<String, Vec<u8>>,
}

impl MockMetadataRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a metadata-only component.
    pub fn with_component(mut self, descriptor: ComponentDescriptor) -> Self {
        self.components.push(descriptor);
        self
    }

    /// Adds a bundle stored at `plugins/<id>_<version>.jar`.
    pub fn with_bundle(self, descriptor: ComponentDescriptor, bytes: &[u8]) -> Self {
        self.with_bundle_properties(descriptor, Properties::new(), bytes)
    }

    pub fn with_bundle_properties(
        self,
        descriptor: ComponentDescriptor,
        properties: Properties,
        bytes: &[u8],
    ) -> Self {
        let key = ArtifactKey::new("osgi.bundle", descriptor.id(), descriptor.version());
        let path = format!("plugins/{}_{}.jar", descriptor.id(), descriptor.version());
        self.with_artifact(descriptor.with_artifact(key.clone()), key, &path, properties, bytes)
    }

    pub fn with_artifact(
        mut self,
        descriptor: ComponentDescriptor,
        key: ArtifactKey,
        path: &str,
        properties: Properties,
        bytes: &[u8],
    ) -> Self {
        let artifact =
            ArtifactDescriptor::new(key.clone(), REPOSITORY.to_string(), path.to_string(), properties);
        self.artifacts.entry(key).or_default().push(artifact);
        self.bytes.insert(path.to_string(), bytes.to_vec());
        if !self.components.contains(&descriptor) {
            self.components.push(descriptor);
        }
        self
    }

    /// Forgets the bytes stored at `path`, so reading that artifact fails.
    pub fn without_bytes(mut self, path: &str) -> Self {
        self.bytes.remove(path);
        self
    }
}

#[async_trait]
impl MetadataRepository for MockMetadataRepository {
    fn components(&self) -> &[ComponentDescriptor] {
        &self.components
    }

    fn query_matches(&self, requirement: &Requirement) -> Vec<ComponentId> {
        self.components
            .iter()
            .filter(|d| d.id() == requirement.name)
            .map(|d| d.component_id().clone())
            .collect()
    }

    fn artifact_descriptors(&self, key: &ArtifactKey) -> Vec<ArtifactDescriptor> {
        self.artifacts.get(key).cloned().unwrap_or_default()
    }

    fn metadata_location(&self, _id: &ComponentId) -> Option<String> {
        Some(REPOSITORY.to_string())
    }

    async fn artifact_bytes(&self, descriptor: &ArtifactDescriptor) -> Result<Vec<u8>> {
        self.bytes
            .get(descriptor.path())
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No bytes for {}", descriptor.path()))
    }
}
