//! Builder for constructing SbomReadModel from domain objects
//!
//! This is the document assembler: it folds the enriched components, the
//! dependency graph and the document annotations into one read model and
//! checks the document-level invariants on the way.

use super::component_view::{
    ComponentView, DataView, ExternalReferenceView, HashView, LicenseView, PedigreeView,
    PropertyView,
};
use super::dependency_view::DependencyView;
use super::sbom_read_model::{AnnotationView, SbomMetadataView, SbomReadModel};
use crate::sbom_generation::domain::{
    Annotation, Component, DependencyGraph, SbomMetadata, Scope,
};
use crate::shared::error::SbomError;
use crate::shared::Result;
use std::collections::HashSet;

pub struct SbomReadModelBuilder;

impl SbomReadModelBuilder {
    /// Builds a SbomReadModel from domain objects
    ///
    /// # Errors
    /// Returns a validation error when two components share a bomRef, or when
    /// a dependency edge is a self-edge or points at an unknown bomRef.
    pub fn build(
        components: &[Component],
        graph: &DependencyGraph,
        metadata: &SbomMetadata,
        annotations: &[Annotation],
    ) -> Result<SbomReadModel> {
        let model = SbomReadModel {
            metadata: Self::build_metadata(metadata),
            components: components.iter().map(Self::build_component).collect(),
            dependencies: Self::build_dependencies(graph),
            annotations: annotations
                .iter()
                .map(|a| AnnotationView {
                    text: a.text().to_string(),
                })
                .collect(),
        };
        Self::validate(&model)?;
        Ok(model)
    }

    fn build_metadata(metadata: &SbomMetadata) -> SbomMetadataView {
        SbomMetadataView {
            timestamp: metadata.timestamp(),
            tool_type: metadata.tool().component_type().to_string(),
            tool_name: metadata.tool_name().to_string(),
            tool_version: metadata.tool_version().to_string(),
            serial_number: metadata.serial_number(),
        }
    }

    fn build_component(component: &Component) -> ComponentView {
        ComponentView {
            bom_ref: component.bom_ref.clone(),
            component_type: component.component_type.as_str().to_string(),
            name: component.name.clone(),
            group: component.group.clone(),
            version: component.version.clone(),
            description: component.description.clone(),
            publisher: component.publisher.clone(),
            scope: component.scope.map(|scope| match scope {
                Scope::Required => "required".to_string(),
            }),
            purl: component.purl.clone(),
            hashes: component
                .hashes
                .iter()
                .map(|h| HashView {
                    algorithm: h.algorithm.as_str().to_string(),
                    value: h.value.clone(),
                })
                .collect(),
            licenses: component
                .licenses
                .iter()
                .map(|l| LicenseView {
                    id: l.id.clone(),
                    name: l.name.clone(),
                    url: l.url.clone(),
                })
                .collect(),
            pedigree: component.pedigree.as_ref().map(|p| PedigreeView {
                ancestors: p.ancestors.iter().map(Self::build_component).collect(),
                notes: p.notes.clone(),
            }),
            external_references: component
                .external_references
                .iter()
                .map(|r| ExternalReferenceView {
                    reference_type: r.kind.as_str().to_string(),
                    url: r.url.clone(),
                })
                .collect(),
            properties: component
                .properties
                .iter()
                .map(|p| PropertyView {
                    name: p.name.clone(),
                    value: p.value.clone(),
                })
                .collect(),
            components: component
                .components
                .iter()
                .map(Self::build_component)
                .collect(),
            data: component
                .data
                .iter()
                .map(|d| DataView {
                    name: d.name.clone(),
                    content_type: d.content_type.clone(),
                    text: d.text.clone(),
                })
                .collect(),
        }
    }

    fn build_dependencies(graph: &DependencyGraph) -> Vec<DependencyView> {
        graph
            .dependencies()
            .iter()
            .map(|d| DependencyView {
                bom_ref: d.bom_ref().to_string(),
                depends_on: d.depends_on().iter().cloned().collect(),
            })
            .collect()
    }

    fn validate(model: &SbomReadModel) -> Result<()> {
        let mut known = HashSet::new();
        for bom_ref in model.bom_refs() {
            if !known.insert(bom_ref) {
                return Err(SbomError::Validation {
                    message: format!("Duplicate bomRef {}", bom_ref),
                }
                .into());
            }
        }

        for dependency in &model.dependencies {
            if !known.contains(dependency.bom_ref.as_str()) {
                return Err(SbomError::Validation {
                    message: format!("Dependency entry for unknown bomRef {}", dependency.bom_ref),
                }
                .into());
            }
            for target in &dependency.depends_on {
                if *target == dependency.bom_ref {
                    return Err(SbomError::Validation {
                        message: format!("Self-dependency on {}", target),
                    }
                    .into());
                }
                if !known.contains(target.as_str()) {
                    return Err(SbomError::Validation {
                        message: format!(
                            "{} depends on unknown bomRef {}",
                            dependency.bom_ref, target
                        ),
                    }
                    .into());
                }
            }
        }
        Ok(())
    }
}
