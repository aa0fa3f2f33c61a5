use crate::application::read_models::{SbomReadModel, SbomReadModelBuilder};
use crate::sbom_generation::domain::{Annotation, Component, DependencyGraph, SbomMetadata};
use crate::shared::Result;

/// SbomResponse - Internal response DTO from SBOM generation use case
///
/// Holds the assembled document in domain form; formatters consume it
/// through [`SbomResponse::read_model`].
#[derive(Debug, Clone)]
pub struct SbomResponse {
    /// Enriched components in creation order
    pub components: Vec<Component>,
    /// One dependency entry per component
    pub dependency_graph: DependencyGraph,
    /// Whole-document annotations (verbose runs only)
    pub annotations: Vec<Annotation>,
    /// SBOM metadata (timestamp, tool info, serial number)
    pub metadata: SbomMetadata,
}

impl SbomResponse {
    pub fn new(
        components: Vec<Component>,
        dependency_graph: DependencyGraph,
        annotations: Vec<Annotation>,
        metadata: SbomMetadata,
    ) -> Self {
        Self {
            components,
            dependency_graph,
            annotations,
            metadata,
        }
    }

    /// Folds the response into the serialization-ready document.
    ///
    /// # Errors
    /// Returns a validation error when bomRefs or dependency edges are inconsistent.
    pub fn read_model(&self) -> Result<SbomReadModel> {
        SbomReadModelBuilder::build(
            &self.components,
            &self.dependency_graph,
            &self.metadata,
            &self.annotations,
        )
    }
}
