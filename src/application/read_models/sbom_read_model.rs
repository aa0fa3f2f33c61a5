//! SBOM read model for query operations
//!
//! This module provides the main read model struct that aggregates
//! all SBOM data in a serialization-ready format.

use super::component_view::ComponentView;
use super::dependency_view::DependencyView;

/// Main read model for SBOM data
///
/// Both CycloneDX serializations are pure projections of this model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SbomReadModel {
    pub metadata: SbomMetadataView,
    /// Components in creation order
    pub components: Vec<ComponentView>,
    /// One entry per top-level component, in component order
    pub dependencies: Vec<DependencyView>,
    pub annotations: Vec<AnnotationView>,
}

/// View representation of SBOM metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SbomMetadataView {
    /// Timestamp when the SBOM was created
    pub timestamp: String,
    /// CycloneDX component type of the tool
    pub tool_type: String,
    /// Name of the tool that generated the SBOM
    pub tool_name: String,
    /// Version of the tool
    pub tool_version: String,
    /// Serial number of the SBOM
    pub serial_number: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationView {
    pub text: String,
}

impl SbomReadModel {
    /// Every bomRef in the document, nested components included.
    pub fn bom_refs(&self) -> Vec<&str> {
        fn collect<'a>(components: &'a [ComponentView], refs: &mut Vec<&'a str>) {
            for component in components {
                refs.push(&component.bom_ref);
                collect(&component.components, refs);
            }
        }
        let mut refs = Vec::new();
        collect(&self.components, &mut refs);
        refs
    }
}
