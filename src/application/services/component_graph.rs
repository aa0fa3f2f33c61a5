use crate::ports::outbound::MetadataRepository;
use crate::sbom_generation::domain::{
    ArtifactDescriptor, ArtifactKey, Component, ComponentDescriptor, ComponentId,
};
use crate::sbom_generation::policies::ExpectedMissingPatterns;
use crate::sbom_generation::services::ComponentFactory;
use crate::shared::Result;
use regex::Regex;
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

static FEATURE_JAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*\.feature)\.jar$").expect("valid feature jar pattern"));

static SOURCE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*)\.source(\.feature\.group|)$").expect("valid source id pattern")
});

/// Two-way association between a feature group and its feature jar.
///
/// Both are the same logical unit; only the jar carries an artifact.
#[derive(Debug, Clone, Default)]
pub struct FeatureAlias {
    jar_by_group: HashMap<ComponentId, ComponentId>,
    group_by_jar: HashMap<ComponentId, ComponentId>,
}

impl FeatureAlias {
    pub fn insert(&mut self, group: ComponentId, jar: ComponentId) {
        self.jar_by_group.insert(group.clone(), jar.clone());
        self.group_by_jar.insert(jar, group);
    }

    pub fn jar_of(&self, group: &ComponentId) -> Option<&ComponentId> {
        self.jar_by_group.get(group)
    }

    pub fn group_of(&self, jar: &ComponentId) -> Option<&ComponentId> {
        self.group_by_jar.get(jar)
    }

    pub fn is_group(&self, id: &ComponentId) -> bool {
        self.jar_by_group.contains_key(id)
    }

    /// The component that stands for `id` in the document.
    pub fn canonical<'a>(&'a self, id: &'a ComponentId) -> &'a ComponentId {
        self.jar_of(id).unwrap_or(id)
    }

    pub fn len(&self) -> usize {
        self.jar_by_group.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jar_by_group.is_empty()
    }
}

/// One document component and the artifact it was created for.
#[derive(Debug, Clone)]
pub struct MappedComponent {
    /// Position of the descriptor in the repository's component list.
    pub descriptor: usize,
    pub artifact: ArtifactDescriptor,
    pub component: Component,
}

/// Read-only lookups shared by enrichment tasks.
#[derive(Debug, Clone, Default)]
pub struct ComponentIndex {
    entries: HashMap<ComponentId, (usize, String)>,
    aliases: FeatureAlias,
}

impl ComponentIndex {
    /// Position in [`ComponentGraph::components`] of the component for `id`.
    pub fn entry(&self, id: &ComponentId) -> Option<usize> {
        self.entries.get(id).map(|(entry, _)| *entry)
    }

    /// bomRef of the document component standing for `id`, following feature aliases.
    pub fn bom_ref(&self, id: &ComponentId) -> Option<&str> {
        self.entries
            .get(self.aliases.canonical(id))
            .map(|(_, bom_ref)| bom_ref.as_str())
    }

    pub fn aliases(&self) -> &FeatureAlias {
        &self.aliases
    }
}

/// Components in creation order plus the index used to resolve edges.
#[derive(Debug, Clone, Default)]
pub struct ComponentGraph {
    pub components: Vec<MappedComponent>,
    pub index: ComponentIndex,
}

impl ComponentGraph {
    /// Maps every artifact key to exactly one component.
    ///
    /// Components are created in artifact key order. Categories and the
    /// execution environment are skipped. A key keeps the first component
    /// that claims it. Components without a canonical artifact get a
    /// synthetic metadata artifact, except feature groups represented by
    /// their feature jar.
    pub fn build<R: MetadataRepository + ?Sized>(
        repository: &R,
        expected_missing: &ExpectedMissingPatterns,
    ) -> Result<Self> {
        let descriptors = repository.components();
        let mut associations: BTreeMap<ArtifactKey, (usize, ArtifactDescriptor)> = BTreeMap::new();
        let mut aliases = FeatureAlias::default();
        let mut unassociated = Vec::new();

        for (position, descriptor) in descriptors.iter().enumerate() {
            if descriptor.is_category() || descriptor.is_execution_environment() {
                continue;
            }

            let mut associated = false;
            for key in descriptor.artifacts() {
                let Some(artifact) = repository
                    .artifact_descriptors(key)
                    .into_iter()
                    .find(ArtifactDescriptor::is_canonical)
                else {
                    continue;
                };
                associated = true;
                associate(&mut associations, position, artifact, descriptor);

                if let Some(captures) = FEATURE_JAR.captures(descriptor.id()) {
                    let group = ComponentId::new(format!("{}.group", &captures[1]), descriptor.version());
                    if descriptors.iter().any(|d| *d.component_id() == group) {
                        aliases.insert(group, descriptor.component_id().clone());
                    } else {
                        tracing::debug!(component = %descriptor.component_id(), "Featureless jar");
                    }
                }
            }

            if !associated {
                unassociated.push(position);
            }
        }

        for position in unassociated {
            let descriptor = &descriptors[position];
            if aliases.is_group(descriptor.component_id()) {
                continue;
            }
            let location = repository
                .metadata_location(descriptor.component_id())
                .ok_or_else(|| {
                    anyhow::anyhow!("No metadata location for {}", descriptor.component_id())
                })?;
            let artifact =
                ArtifactDescriptor::metadata(descriptor.id(), descriptor.version(), &location);
            associate(&mut associations, position, artifact, descriptor);
        }

        let mut graph = ComponentGraph::default();
        for (position, artifact) in associations.into_values() {
            let descriptor = &descriptors[position];
            let mut component = ComponentFactory::create(descriptor);
            component.bom_ref = ComponentFactory::bom_ref(&artifact);

            if artifact.is_metadata() {
                let expected = expected_missing.matches(descriptor);
                if let Some(missing) = ComponentFactory::missing_artifact(descriptor, expected) {
                    component.add_property("missing-artifact", missing);
                }
            }

            graph
                .index
                .entries
                .entry(descriptor.component_id().clone())
                .or_insert_with(|| (graph.components.len(), component.bom_ref.clone()));
            graph.components.push(MappedComponent {
                descriptor: position,
                artifact,
                component,
            });
        }
        graph.index.aliases = aliases;

        tracing::debug!(
            components = graph.components.len(),
            feature_aliases = graph.index.aliases.len(),
            "Built component graph"
        );
        Ok(graph)
    }

    /// Copies licenses and references from binary components to their source
    /// counterparts, e.g. `org.example.source` from `org.example`.
    pub fn transfer_source_details(
        &mut self,
        descriptors: &[ComponentDescriptor],
        expected_missing: &ExpectedMissingPatterns,
    ) {
        for position in 0..self.components.len() {
            let descriptor = &descriptors[self.components[position].descriptor];
            let Some(captures) = SOURCE_ID.captures(descriptor.id()) else {
                continue;
            };
            let binary = ComponentId::new(
                format!("{}{}", &captures[1], &captures[2]),
                descriptor.version(),
            );
            let binary = self.index.aliases.canonical(&binary);
            match self.index.entry(binary) {
                Some(entry) if entry != position => {
                    let binary = self.components[entry].component.clone();
                    ComponentFactory::transfer_from_binary(
                        &mut self.components[position].component,
                        &binary,
                    );
                }
                Some(_) => {}
                None if expected_missing.matches(descriptor) => {}
                None => {
                    tracing::warn!(component = %descriptor.component_id(), "Missing binary")
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

fn associate(
    associations: &mut BTreeMap<ArtifactKey, (usize, ArtifactDescriptor)>,
    position: usize,
    artifact: ArtifactDescriptor,
    descriptor: &ComponentDescriptor,
) {
    match associations.entry(artifact.key().clone()) {
        Entry::Vacant(entry) => {
            entry.insert((position, artifact));
        }
        Entry::Occupied(entry) => {
            tracing::debug!(
                key = %entry.key(),
                component = %descriptor.component_id(),
                "Artifact already claimed"
            );
        }
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{InMemoryRepository, REPOSITORY};
    use super::*;
    use crate::sbom_generation::domain::component_descriptor::property_keys;
    use crate::sbom_generation::domain::{License, Properties};

    fn none_expected() -> ExpectedMissingPatterns {
        ExpectedMissingPatterns::new::<&str>(&[]).unwrap()
    }

    fn bom_refs(graph: &ComponentGraph) -> Vec<&str> {
        graph
            .components
            .iter()
            .map(|c| c.component.bom_ref.as_str())
            .collect()
    }

    #[test]
    fn test_components_follow_artifact_key_order() {
        let repository = InMemoryRepository::default()
            .with_bundle(ComponentDescriptor::new("org.example.b", "1.10.0"), b"b")
            .with_bundle(ComponentDescriptor::new("org.example.a", "1.0.0"), b"a")
            .with_bundle(ComponentDescriptor::new("org.example.b", "1.9.0"), b"b9");

        let graph = ComponentGraph::build(&repository, &none_expected()).unwrap();
        assert_eq!(
            bom_refs(&graph),
            vec![
                "plugins/org.example.a_1.0.0.jar",
                "plugins/org.example.b_1.9.0.jar",
                "plugins/org.example.b_1.10.0.jar"
            ]
        );
    }

    #[test]
    fn test_categories_and_execution_environment_are_skipped() {
        let repository = InMemoryRepository::default()
            .with_component(
                ComponentDescriptor::new("category.tools", "1.0.0")
                    .with_property(property_keys::TYPE_CATEGORY, "true"),
            )
            .with_component(ComponentDescriptor::new("a.jre.javase", "17.0.0"))
            .with_bundle(ComponentDescriptor::new("org.example.a", "1.0.0"), b"a");

        let graph = ComponentGraph::build(&repository, &none_expected()).unwrap();
        assert_eq!(graph.len(), 1);
    }

    #[test]
    fn test_one_component_per_artifact_key() {
        let key = ArtifactKey::new("osgi.bundle", "org.example.shared", "1.0.0");
        let mut processed = Properties::new();
        processed.insert("format".to_string(), "packed".to_string());
        let repository = InMemoryRepository::default()
            .with_artifact(
                ComponentDescriptor::new("org.example.first", "1.0.0").with_artifact(key.clone()),
                key.clone(),
                "plugins/org.example.shared_1.0.0.jar.pack.gz",
                processed,
                b"packed",
            )
            .with_artifact(
                ComponentDescriptor::new("org.example.first", "1.0.0").with_artifact(key.clone()),
                key.clone(),
                "plugins/org.example.shared_1.0.0.jar",
                Properties::new(),
                b"jar",
            )
            .with_component(
                ComponentDescriptor::new("org.example.second", "1.0.0").with_artifact(key.clone()),
            );

        let graph = ComponentGraph::build(&repository, &none_expected()).unwrap();
        assert_eq!(bom_refs(&graph), vec!["plugins/org.example.shared_1.0.0.jar"]);
        assert_eq!(graph.components[0].component.name, "org.example.first");
    }

    #[test]
    fn test_feature_pair_yields_one_component() {
        let group = ComponentDescriptor::new("org.example.feature.group", "1.0.0");
        let key = ArtifactKey::new("org.eclipse.update.feature", "org.example", "1.0.0");
        let jar = ComponentDescriptor::new("org.example.feature.jar", "1.0.0").with_artifact(key.clone());
        let repository = InMemoryRepository::default()
            .with_component(group.clone())
            .with_artifact(jar.clone(), key, "features/org.example_1.0.0.jar", Properties::new(), b"f");

        let graph = ComponentGraph::build(&repository, &none_expected()).unwrap();
        assert_eq!(bom_refs(&graph), vec!["features/org.example_1.0.0.jar"]);
        assert_eq!(
            graph.index.aliases().jar_of(group.component_id()),
            Some(jar.component_id())
        );
        assert_eq!(
            graph.index.bom_ref(group.component_id()),
            Some("features/org.example_1.0.0.jar")
        );
    }

    #[test]
    fn test_metadata_components_and_missing_artifacts() {
        let missing_key = ArtifactKey::new("osgi.bundle", "org.example.gone", "1.0.0");
        let repository = InMemoryRepository::default()
            .with_component(ComponentDescriptor::new("org.example.tools.feature.group", "2.0.0"))
            .with_component(
                ComponentDescriptor::new("org.example.gone", "1.0.0").with_artifact(missing_key),
            )
            .with_component(ComponentDescriptor::new("org.example.expected", "1.0.0").with_artifact(
                ArtifactKey::new("osgi.bundle", "org.example.expected", "1.0.0"),
            ));
        let expected = ExpectedMissingPatterns::new(&["org\\.example\\.expected:.*"]).unwrap();

        let graph = ComponentGraph::build(&repository, &expected).unwrap();
        assert_eq!(
            bom_refs(&graph),
            vec![
                "metadata/org.example.expected_1.0.0",
                "metadata/org.example.gone_1.0.0",
                "metadata/org.example.tools.feature.group_2.0.0"
            ]
        );
        let by_ref = |bom_ref: &str| {
            &graph
                .components
                .iter()
                .find(|c| c.component.bom_ref == bom_ref)
                .unwrap()
                .component
        };
        assert_eq!(
            by_ref("metadata/org.example.tools.feature.group_2.0.0").property("missing-artifact"),
            Some("org.eclipse.update.feature,org.example.tools,2.0.0")
        );
        assert_eq!(
            by_ref("metadata/org.example.gone_1.0.0").property("missing-artifact"),
            Some("osgi.bundle,org.example.gone,1.0.0")
        );
        assert_eq!(
            by_ref("metadata/org.example.expected_1.0.0").property("missing-artifact"),
            None
        );
        assert_eq!(graph.components[0].artifact.location(), REPOSITORY);
    }

    #[test]
    fn test_source_details_come_from_binary() {
        let repository = InMemoryRepository::default()
            .with_bundle(ComponentDescriptor::new("org.example.core", "1.0.0"), b"bin")
            .with_bundle(ComponentDescriptor::new("org.example.core.source", "1.0.0"), b"src")
            .with_bundle(ComponentDescriptor::new("org.example.orphan.source", "1.0.0"), b"o");
        let mut graph = ComponentGraph::build(&repository, &none_expected()).unwrap();
        let binary = graph.index.entry(&ComponentId::new("org.example.core", "1.0.0")).unwrap();
        graph.components[binary].component.licenses =
            vec![License::with_id("EPL-2.0", "https://spdx.org/licenses/EPL-2.0.html")];

        graph.transfer_source_details(repository.components(), &none_expected());

        let source = graph
            .index
            .entry(&ComponentId::new("org.example.core.source", "1.0.0"))
            .unwrap();
        assert_eq!(graph.components[source].component.licenses.len(), 1);
        let orphan = graph
            .index
            .entry(&ComponentId::new("org.example.orphan.source", "1.0.0"))
            .unwrap();
        assert!(graph.components[orphan].component.licenses.is_empty());
    }
}
