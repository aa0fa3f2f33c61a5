use crate::sbom_generation::domain::{SbomMetadata, ToolComponent};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// SbomGenerator service for generating document metadata
pub struct SbomGenerator;

impl SbomGenerator {
    /// Generates metadata stamped with the current time and a fresh serial number
    pub fn generate_metadata(tool: ToolComponent) -> SbomMetadata {
        Self::generate_metadata_at(Utc::now(), tool)
    }

    /// Generates metadata for a fixed instant
    pub fn generate_metadata_at(timestamp: DateTime<Utc>, tool: ToolComponent) -> SbomMetadata {
        SbomMetadata::new(tool, timestamp, Uuid::new_v4())
    }

    /// Generates metadata naming this tool, using the compile-time version from Cargo.toml
    pub fn generate_default_metadata() -> SbomMetadata {
        Self::generate_metadata(ToolComponent::current())
    }
}
