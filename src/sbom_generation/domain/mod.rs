pub mod annotation;
pub mod artifact;
pub mod component;
pub mod component_descriptor;
pub mod coordinate;
pub mod dependency_graph;
pub mod requirement_filter;
pub mod sbom_metadata;

pub use annotation::Annotation;
pub use artifact::{ArtifactDescriptor, ArtifactKey, Properties};
pub use component::{
    Component, ComponentData, ComponentType, ExternalReference, ExternalReferenceType,
    ExternalReferences, Hash, HashAlgorithm, License, Pedigree, Property, Scope,
};
pub use component_descriptor::{ComponentDescriptor, ComponentId, Requirement, Touchpoint};
pub use coordinate::MavenCoordinate;
pub use dependency_graph::{Dependency, DependencyGraph};
pub use requirement_filter::RequirementFilter;
pub use sbom_metadata::{SbomMetadata, ToolComponent};
