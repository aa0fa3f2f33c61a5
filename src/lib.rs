//! p2-sbom - SBOM generation tool for p2 repositories
//!
//! This library generates CycloneDX Software Bills of Materials from the
//! metadata and artifacts of a p2 repository, following hexagonal
//! architecture and Domain-Driven Design principles.
//!
//! # Architecture
//!
//! The library is organized into the following layers:
//!
//! - **Domain Layer** (`sbom_generation`): Pure business logic and domain models
//! - **Application Layer** (`application`): Use cases and application services
//! - **Ports** (`ports`): Interface definitions for infrastructure
//! - **Adapters** (`adapters`): Concrete implementations of ports
//! - **Shared** (`shared`): Common utilities and error types
//!
//! # Example
//!
//! ```no_run
//! use p2_sbom::prelude::*;
//! use std::path::Path;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn run() -> Result<()> {
//! // Create adapters
//! let repository = Arc::new(SnapshotRepository::load(Path::new("repository.json"))?);
//! let content = Arc::new(ContentCache::in_temp_dir(ReqwestTransport::new()?)?);
//! let progress_reporter = StderrProgressReporter::new();
//!
//! // Create use case
//! let use_case = GenerateSbomUseCase::new(repository, content, progress_reporter);
//!
//! // Execute
//! let request = SbomRequest::builder()
//!     .snapshot_path("repository.json")
//!     .build()?;
//! let response = use_case.execute(request, &CancellationToken::new()).await?;
//!
//! // Format output
//! let output = CycloneDxXmlFormatter::new().format(&response.read_model()?)?;
//! println!("{}", output);
//! # Ok(())
//! # }
//! ```

pub mod adapters;
pub mod application;
pub mod ports;
pub mod sbom_generation;
pub mod shared;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::adapters::outbound::console::StderrProgressReporter;
    pub use crate::adapters::outbound::filesystem::{
        FileSystemWriter, SnapshotRepository, StdoutPresenter,
    };
    pub use crate::adapters::outbound::formatters::{
        CycloneDxJsonFormatter, CycloneDxXmlFormatter,
    };
    pub use crate::adapters::outbound::network::{ContentCache, ReqwestTransport};
    pub use crate::application::dto::{OutputFormat, SbomRequest, SbomResponse};
    pub use crate::application::read_models::SbomReadModel;
    pub use crate::application::use_cases::GenerateSbomUseCase;
    pub use crate::ports::outbound::{
        ContentSource, HttpRequest, HttpResponse, HttpTransport, MetadataRepository,
        OutputPresenter, ProgressReporter, SbomFormatter,
    };
    pub use crate::sbom_generation::domain::{
        Annotation, ArtifactDescriptor, ArtifactKey, Component, ComponentDescriptor,
        ComponentId, DependencyGraph, MavenCoordinate, Requirement, SbomMetadata,
    };
    pub use crate::sbom_generation::services::SbomGenerator;
    pub use crate::shared::error::{ExitCode, FetchError, SbomError};
    pub use crate::shared::Result;
}
