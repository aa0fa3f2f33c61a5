//! Read models for CQRS-lite pattern
//!
//! This module contains view-optimized structs that provide
//! a denormalized representation of the enriched components for output.

pub mod component_view;
pub mod dependency_view;
pub mod sbom_read_model;
pub mod sbom_read_model_builder;

pub use component_view::{
    ComponentView, DataView, ExternalReferenceView, HashView, LicenseView, PedigreeView,
    PropertyView,
};
pub use dependency_view::DependencyView;
pub use sbom_read_model::{AnnotationView, SbomMetadataView, SbomReadModel};
pub use sbom_read_model_builder::SbomReadModelBuilder;
