//! Enrichment services driven by the SBOM use case
//!
//! Each service works on one component at a time through the outbound
//! ports; [`EnrichmentOrchestrator`] runs them concurrently.

pub mod advisory;
pub mod component_graph;
pub mod coordinate_resolver;
pub mod dependency_resolver;
pub mod enrichment;
pub mod evidence_extractor;
pub mod license_registry;
pub mod nested_jars;

#[cfg(test)]
pub(crate) mod test_support;

pub use component_graph::{ComponentGraph, ComponentIndex, FeatureAlias, MappedComponent};
pub use coordinate_resolver::CoordinateResolver;
pub use dependency_resolver::{DependencyResolver, RequirementContexts};
pub use enrichment::{EnrichmentOptions, EnrichmentOrchestrator, EnrichmentReport};
pub use evidence_extractor::{Evidence, EvidenceExtractor};
pub use license_registry::LicenseRegistry;
