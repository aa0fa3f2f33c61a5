use super::component_graph::ComponentIndex;
use crate::ports::outbound::MetadataRepository;
use crate::sbom_generation::domain::component_descriptor::EXECUTION_ENVIRONMENT_ID;
use crate::sbom_generation::domain::{Component, ComponentDescriptor, Properties, Requirement};
use crate::shared::error::SbomError;
use crate::shared::Result;
use std::collections::BTreeSet;

/// Requirements in this namespace describe installation types, not dependencies.
const EXCLUDED_NAMESPACE: &str = "org.eclipse.equinox.p2.eclipse.type";

/// Environments in which conditional requirements are judged.
///
/// An unmatched requirement whose filter rejects every inclusive context,
/// or accepts any exclusive context, is not reported as unsatisfied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementContexts {
    pub inclusive: Vec<Properties>,
    pub exclusive: Vec<Properties>,
}

impl RequirementContexts {
    /// Parses contexts written as `key=value,key=value`.
    pub fn parse<S: AsRef<str>>(inclusive: &[S], exclusive: &[S]) -> Result<Self> {
        Ok(Self {
            inclusive: inclusive
                .iter()
                .map(|c| parse_context(c.as_ref()))
                .collect::<Result<_>>()?,
            exclusive: exclusive
                .iter()
                .map(|c| parse_context(c.as_ref()))
                .collect::<Result<_>>()?,
        })
    }

    fn is_inapplicable(&self, requirement: &Requirement) -> bool {
        let Some(filter) = &requirement.filter else {
            return false;
        };
        (!self.inclusive.is_empty() && !self.inclusive.iter().any(|c| filter.matches(c)))
            || (!self.exclusive.is_empty() && self.exclusive.iter().any(|c| filter.matches(c)))
    }
}

fn parse_context(context: &str) -> Result<Properties> {
    context
        .split(',')
        .filter(|pair| !pair.trim().is_empty())
        .map(|pair| {
            pair.split_once('=')
                .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
                .ok_or_else(|| {
                    anyhow::Error::from(SbomError::InvalidConfig {
                        message: format!("Invalid requirement context '{}': expected key=value", context),
                    })
                })
        })
        .collect()
}

/// Turns a component's requirements into dependency edges.
pub struct DependencyResolver<'a, R: MetadataRepository + ?Sized> {
    repository: &'a R,
    index: &'a ComponentIndex,
    contexts: &'a RequirementContexts,
}

impl<'a, R: MetadataRepository + ?Sized> DependencyResolver<'a, R> {
    pub fn new(repository: &'a R, index: &'a ComponentIndex, contexts: &'a RequirementContexts) -> Self {
        Self {
            repository,
            index,
            contexts,
        }
    }

    /// bomRefs the component depends on.
    ///
    /// A feature jar uses its feature group's requirements. Unsatisfied
    /// mandatory requirements are recorded as `unsatisfied-requirement`
    /// properties on the component.
    pub fn resolve(
        &self,
        descriptor: &ComponentDescriptor,
        component: &mut Component,
    ) -> BTreeSet<String> {
        let source = self
            .index
            .aliases()
            .group_of(descriptor.component_id())
            .and_then(|group| {
                self.repository
                    .components()
                    .iter()
                    .find(|d| d.component_id() == group)
            })
            .unwrap_or(descriptor);

        let mut depends_on = BTreeSet::new();
        for requirement in source.requirements() {
            if requirement.namespace == EXCLUDED_NAMESPACE {
                continue;
            }

            let matches = self.repository.query_matches(requirement);
            if matches.is_empty() {
                if !requirement.is_optional() && !self.contexts.is_inapplicable(requirement) {
                    component.add_property("unsatisfied-requirement", requirement.to_string());
                }
                continue;
            }

            for id in &matches {
                match self.index.bom_ref(id) {
                    Some(bom_ref) if bom_ref != component.bom_ref => {
                        depends_on.insert(bom_ref.to_string());
                    }
                    Some(_) => {}
                    None if id.id.starts_with(EXECUTION_ENVIRONMENT_ID) => {}
                    None => tracing::debug!(
                        component = %descriptor.component_id(),
                        required = %id,
                        "Requirement not mapped to an artifact"
                    ),
                }
            }
        }
        depends_on
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::component_graph::test_support::InMemoryRepository;
    use crate::application::services::component_graph::ComponentGraph;
    use crate::sbom_generation::domain::{ArtifactKey, RequirementFilter};
    use crate::sbom_generation::policies::ExpectedMissingPatterns;

    fn bundle_requirement(name: &str) -> Requirement {
        Requirement::new("osgi.bundle", name, "0.0.0")
    }

    fn resolve(
        repository: &InMemoryRepository,
        contexts: &RequirementContexts,
        id: &str,
    ) -> (BTreeSet<String>, Component) {
        let graph =
            ComponentGraph::build(repository, &ExpectedMissingPatterns::default()).unwrap();
        let mapped = graph
            .components
            .iter()
            .find(|c| c.component.name == id)
            .unwrap();
        let mut component = mapped.component.clone();
        let descriptor = &repository.components()[mapped.descriptor];
        let edges = DependencyResolver::new(repository, &graph.index, contexts)
            .resolve(descriptor, &mut component);
        (edges, component)
    }

    #[test]
    fn test_edges_exclude_self_and_type_namespace() {
        let repository = InMemoryRepository::default()
            .with_bundle(
                ComponentDescriptor::new("org.example.a", "1.0.0")
                    .with_requirement(bundle_requirement("org.example.b"))
                    .with_requirement(bundle_requirement("org.example.a"))
                    .with_requirement(Requirement::new(EXCLUDED_NAMESPACE, "bundle", "0.0.0")),
                b"a",
            )
            .with_bundle(ComponentDescriptor::new("org.example.b", "1.0.0"), b"b");

        let (edges, component) = resolve(&repository, &RequirementContexts::default(), "org.example.a");
        assert_eq!(
            edges.into_iter().collect::<Vec<_>>(),
            vec!["plugins/org.example.b_1.0.0.jar"]
        );
        assert!(component.property("unsatisfied-requirement").is_none());
    }

    #[test]
    fn test_unsatisfied_requirement_is_recorded() {
        let repository = InMemoryRepository::default().with_bundle(
            ComponentDescriptor::new("org.example.c", "1.0.0")
                .with_requirement(bundle_requirement("org.example.absent"))
                .with_requirement(bundle_requirement("org.example.optional").with_min(0)),
            b"c",
        );

        let (edges, component) = resolve(&repository, &RequirementContexts::default(), "org.example.c");
        assert!(edges.is_empty());
        let unsatisfied: Vec<_> = component
            .properties
            .iter()
            .filter(|p| p.name == "unsatisfied-requirement")
            .map(|p| p.value.as_str())
            .collect();
        assert_eq!(unsatisfied, vec!["osgi.bundle; org.example.absent 0.0.0"]);
    }

    #[test]
    fn test_contexts_drop_inapplicable_requirements() {
        let windows_only = bundle_requirement("org.example.win32")
            .with_filter(RequirementFilter::parse("(osgi.os=win32)").unwrap());
        let repository = InMemoryRepository::default().with_bundle(
            ComponentDescriptor::new("org.example.c", "1.0.0").with_requirement(windows_only),
            b"c",
        );

        let linux = RequirementContexts::parse(&["osgi.os=linux,osgi.arch=x86_64"], &[]).unwrap();
        let (_, component) = resolve(&repository, &linux, "org.example.c");
        assert!(component.property("unsatisfied-requirement").is_none());

        let exclude_windows = RequirementContexts::parse(&[], &["osgi.os=win32"]).unwrap();
        let (_, component) = resolve(&repository, &exclude_windows, "org.example.c");
        assert!(component.property("unsatisfied-requirement").is_none());

        let windows = RequirementContexts::parse(&["osgi.os=win32"], &[]).unwrap();
        let (_, component) = resolve(&repository, &windows, "org.example.c");
        assert!(component.property("unsatisfied-requirement").is_some());
    }

    #[test]
    fn test_feature_jar_carries_group_requirements() {
        let group = ComponentDescriptor::new("org.example.feature.group", "1.0.0")
            .with_requirement(bundle_requirement("org.example.a"))
            .with_requirement(bundle_requirement("org.example.other.feature.group"));
        let key = ArtifactKey::new("org.eclipse.update.feature", "org.example", "1.0.0");
        let jar = ComponentDescriptor::new("org.example.feature.jar", "1.0.0").with_artifact(key.clone());
        let other_key = ArtifactKey::new("org.eclipse.update.feature", "org.example.other", "1.0.0");
        let other_jar = ComponentDescriptor::new("org.example.other.feature.jar", "1.0.0")
            .with_artifact(other_key.clone());
        let repository = InMemoryRepository::default()
            .with_component(group)
            .with_component(ComponentDescriptor::new("org.example.other.feature.group", "1.0.0"))
            .with_artifact(jar, key, "features/org.example_1.0.0.jar", Properties::new(), b"f")
            .with_artifact(
                other_jar,
                other_key,
                "features/org.example.other_1.0.0.jar",
                Properties::new(),
                b"o",
            )
            .with_bundle(ComponentDescriptor::new("org.example.a", "1.0.0"), b"a");

        let (edges, _) = resolve(&repository, &RequirementContexts::default(), "org.example.feature.jar");
        assert_eq!(
            edges.into_iter().collect::<Vec<_>>(),
            vec![
                "features/org.example.other_1.0.0.jar",
                "plugins/org.example.a_1.0.0.jar"
            ]
        );
    }

    #[test]
    fn test_invalid_context_is_a_configuration_error() {
        let err = RequirementContexts::parse(&["osgi.os"], &[]).unwrap_err();
        assert!(err.to_string().contains("expected key=value"));
    }
}
