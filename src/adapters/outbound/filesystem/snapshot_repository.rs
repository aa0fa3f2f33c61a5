use crate::ports::outbound::MetadataRepository;
use crate::sbom_generation::domain::artifact::compare_versions;
use crate::sbom_generation::domain::{
    ArtifactDescriptor, ArtifactKey, ComponentDescriptor, ComponentId, Properties, Requirement,
    RequirementFilter, Touchpoint,
};
use crate::shared::error::SbomError;
use crate::shared::security::{read_validated, MAX_ARTIFACT_SIZE, MAX_SNAPSHOT_SIZE};
use crate::shared::Result;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const IU_NAMESPACE: &str = "org.eclipse.equinox.p2.iu";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotDocument {
    location: String,
    #[serde(default)]
    components: Vec<SnapshotComponent>,
    #[serde(default)]
    artifacts: Vec<SnapshotArtifact>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotComponent {
    id: String,
    version: String,
    #[serde(default)]
    properties: Properties,
    #[serde(default)]
    artifacts: Vec<SnapshotKey>,
    #[serde(default)]
    requirements: Vec<SnapshotRequirement>,
    #[serde(default)]
    provides: Vec<SnapshotCapability>,
    touchpoint: Option<SnapshotTouchpoint>,
    #[serde(default)]
    licenses: Vec<String>,
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SnapshotKey {
    classifier: String,
    id: String,
    version: String,
}

#[derive(Debug, Deserialize)]
struct SnapshotRequirement {
    namespace: String,
    name: String,
    #[serde(default = "default_range")]
    range: String,
    #[serde(default = "default_min")]
    min: u32,
    filter: Option<String>,
    /// Pre-resolved matches; when absent the snapshot resolves the requirement itself.
    matches: Option<Vec<SnapshotComponentId>>,
}

#[derive(Debug, Deserialize)]
struct SnapshotComponentId {
    id: String,
    version: String,
}

#[derive(Debug, Deserialize)]
struct SnapshotCapability {
    namespace: String,
    name: String,
    version: String,
}

#[derive(Debug, Deserialize)]
struct SnapshotTouchpoint {
    id: String,
    version: String,
    #[serde(default)]
    data: Vec<Properties>,
}

#[derive(Debug, Deserialize)]
struct SnapshotArtifact {
    classifier: String,
    id: String,
    version: String,
    repository: Option<String>,
    #[serde(default)]
    path: String,
    #[serde(default)]
    properties: Properties,
    /// Artifact bytes, relative to the snapshot file.
    file: Option<PathBuf>,
}

fn default_range() -> String {
    "0.0.0".to_string()
}

fn default_min() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RequirementKey {
    namespace: String,
    name: String,
    range: String,
    filter: Option<String>,
}

impl RequirementKey {
    fn of(requirement: &Requirement) -> Self {
        Self {
            namespace: requirement.namespace.clone(),
            name: requirement.name.clone(),
            range: requirement.range.clone(),
            filter: requirement.filter.as_ref().map(|f| f.as_str().to_string()),
        }
    }
}

/// SnapshotRepository adapter: a p2 repository captured as a JSON document
///
/// Implements [`MetadataRepository`] over a snapshot file listing component
/// descriptors, artifact descriptors and the location of each artifact's
/// bytes on disk. Requirements may carry pre-resolved matches; otherwise they
/// are resolved against component ids (for the installable-unit namespace)
/// and declared capabilities.
pub struct SnapshotRepository {
    base_dir: PathBuf,
    location: String,
    components: Vec<ComponentDescriptor>,
    component_locations: HashMap<ComponentId, String>,
    capabilities: Vec<(String, String, String, ComponentId)>,
    resolved: HashMap<RequirementKey, Vec<ComponentId>>,
    artifacts: HashMap<ArtifactKey, Vec<(ArtifactDescriptor, Option<PathBuf>)>>,
}

impl SnapshotRepository {
    /// Loads and validates a snapshot file.
    ///
    /// # Errors
    /// Returns `MissingInput` when the file does not exist and
    /// `SnapshotParseError` when it is not a valid snapshot.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SbomError::MissingInput {
                path: path.to_path_buf(),
                suggestion: "Pass an existing repository snapshot with --input".to_string(),
            }
            .into());
        }
        let bytes = read_validated(path, "repository snapshot", MAX_SNAPSHOT_SIZE)?;
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::parse(&bytes, base_dir).map_err(|e| {
            SbomError::SnapshotParseError {
                path: path.to_path_buf(),
                details: format!("{:#}", e),
            }
            .into()
        })
    }

    /// Parses snapshot JSON; artifact files resolve against `base_dir`.
    pub fn parse(bytes: &[u8], base_dir: PathBuf) -> Result<Self> {
        let document: SnapshotDocument = serde_json::from_slice(bytes)?;
        let mut repository = Self {
            base_dir,
            location: document.location,
            components: Vec::new(),
            component_locations: HashMap::new(),
            capabilities: Vec::new(),
            resolved: HashMap::new(),
            artifacts: HashMap::new(),
        };

        for component in document.components {
            let descriptor = repository.add_component(component)?;
            repository.components.push(descriptor);
        }

        for artifact in document.artifacts {
            let key = ArtifactKey::new(artifact.classifier, artifact.id, artifact.version);
            let descriptor = ArtifactDescriptor::new(
                key.clone(),
                artifact
                    .repository
                    .unwrap_or_else(|| repository.location.clone()),
                artifact.path,
                artifact.properties,
            );
            repository
                .artifacts
                .entry(key)
                .or_default()
                .push((descriptor, artifact.file));
        }

        Ok(repository)
    }

    fn add_component(&mut self, component: SnapshotComponent) -> Result<ComponentDescriptor> {
        let mut descriptor = ComponentDescriptor::new(&component.id, &component.version)
            .with_properties(component.properties);
        let component_id = descriptor.component_id().clone();

        for key in component.artifacts {
            descriptor = descriptor.with_artifact(ArtifactKey::new(key.classifier, key.id, key.version));
        }

        for requirement in component.requirements {
            let mut parsed = Requirement::new(requirement.namespace, requirement.name, requirement.range)
                .with_min(requirement.min);
            if let Some(filter) = requirement.filter.as_deref() {
                let filter = RequirementFilter::parse(filter)
                    .with_context(|| format!("Invalid filter on {}", component_id))?;
                parsed = parsed.with_filter(filter);
            }
            if let Some(matches) = requirement.matches {
                self.resolved.insert(
                    RequirementKey::of(&parsed),
                    matches
                        .into_iter()
                        .map(|m| ComponentId::new(m.id, m.version))
                        .collect(),
                );
            }
            descriptor = descriptor.with_requirement(parsed);
        }

        for capability in component.provides {
            self.capabilities.push((
                capability.namespace,
                capability.name,
                capability.version,
                component_id.clone(),
            ));
        }

        if let Some(touchpoint) = component.touchpoint {
            descriptor = descriptor.with_touchpoint(Touchpoint {
                id: touchpoint.id,
                version: touchpoint.version,
                data: touchpoint.data,
            });
        }

        for license in component.licenses {
            descriptor = descriptor.with_license_location(license);
        }

        if let Some(location) = component.location {
            self.component_locations.insert(component_id, location);
        }

        Ok(descriptor)
    }

    pub fn location(&self) -> &str {
        &self.location
    }
}

#[async_trait]
impl MetadataRepository for SnapshotRepository {
    fn components(&self) -> &[ComponentDescriptor] {
        &self.components
    }

    fn query_matches(&self, requirement: &Requirement) -> Vec<ComponentId> {
        if let Some(matches) = self.resolved.get(&RequirementKey::of(requirement)) {
            return matches.clone();
        }

        let mut matches: Vec<ComponentId> = if requirement.namespace == IU_NAMESPACE {
            self.components
                .iter()
                .filter(|c| c.id() == requirement.name && in_range(&requirement.range, c.version()))
                .map(|c| c.component_id().clone())
                .collect()
        } else {
            self.capabilities
                .iter()
                .filter(|(namespace, name, version, _)| {
                    *namespace == requirement.namespace
                        && *name == requirement.name
                        && in_range(&requirement.range, version)
                })
                .map(|(_, _, _, id)| id.clone())
                .collect()
        };
        matches.dedup();
        matches
    }

    fn artifact_descriptors(&self, key: &ArtifactKey) -> Vec<ArtifactDescriptor> {
        self.artifacts
            .get(key)
            .map(|entries| entries.iter().map(|(d, _)| d.clone()).collect())
            .unwrap_or_default()
    }

    fn metadata_location(&self, id: &ComponentId) -> Option<String> {
        Some(
            self.component_locations
                .get(id)
                .cloned()
                .unwrap_or_else(|| self.location.clone()),
        )
    }

    async fn artifact_bytes(&self, descriptor: &ArtifactDescriptor) -> Result<Vec<u8>> {
        let file = self
            .artifacts
            .get(descriptor.key())
            .and_then(|entries| entries.iter().find(|(d, _)| d == descriptor))
            .and_then(|(_, file)| file.as_ref())
            .ok_or_else(|| anyhow::anyhow!("No content recorded for artifact {}", descriptor.key()))?;
        let path = self.base_dir.join(file);
        tokio::task::spawn_blocking(move || read_validated(&path, "artifact", MAX_ARTIFACT_SIZE))
            .await
            .context("Artifact read task failed")?
    }
}

/// OSGi version range check: `[1.0,2.0)`, `(1.0,2.0]`, or a bare minimum version.
fn in_range(range: &str, version: &str) -> bool {
    let range = range.trim();
    let (Some(first), Some(last)) = (range.chars().next(), range.chars().last()) else {
        return true;
    };
    if first != '[' && first != '(' {
        return compare_versions(version, range) != Ordering::Less;
    }
    if range.len() < 2 {
        return false;
    }
    let Some((low, high)) = range[1..range.len() - 1].split_once(',') else {
        return false;
    };
    let lower = compare_versions(version, low.trim());
    let upper = compare_versions(version, high.trim());
    let above = if first == '[' {
        lower != Ordering::Less
    } else {
        lower == Ordering::Greater
    };
    let below = if last == ']' {
        upper != Ordering::Greater
    } else {
        upper == Ordering::Less
    };
    above && below
}
