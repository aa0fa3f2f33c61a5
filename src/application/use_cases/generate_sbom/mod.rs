use crate::application::dto::{SbomRequest, SbomResponse};
use crate::application::services::{
    ComponentGraph, EnrichmentOptions, EnrichmentOrchestrator, EnrichmentReport, LicenseRegistry,
    RequirementContexts,
};
use crate::ports::outbound::{ContentSource, MetadataRepository, ProgressReporter};
use crate::sbom_generation::domain::Annotation;
use crate::sbom_generation::policies::{ExpectedMissingPatterns, UriRedirections};
use crate::sbom_generation::services::SbomGenerator;
use crate::shared::Result;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// GenerateSbomUseCase - Core use case for SBOM generation
///
/// This use case orchestrates the SBOM generation workflow: one
/// single-threaded mapping pass, a concurrent enrichment fan-out, then
/// assembly of the document.
///
/// # Type Parameters
/// * `R` - MetadataRepository implementation
/// * `C` - ContentSource implementation (usually the disk-backed cache)
/// * `PR` - ProgressReporter implementation
pub struct GenerateSbomUseCase<R: ?Sized, C: ?Sized, PR> {
    repository: Arc<R>,
    content: Arc<C>,
    progress_reporter: PR,
}

/// Settings parsed from the request before any work starts.
struct GeneratorSettings {
    expected_missing: ExpectedMissingPatterns,
    options: EnrichmentOptions,
}

impl<R, C, PR> GenerateSbomUseCase<R, C, PR>
where
    R: MetadataRepository + ?Sized + 'static,
    C: ContentSource + ?Sized + 'static,
    PR: ProgressReporter,
{
    /// Creates a new GenerateSbomUseCase with injected dependencies
    pub fn new(repository: Arc<R>, content: Arc<C>, progress_reporter: PR) -> Self {
        Self {
            repository,
            content,
            progress_reporter,
        }
    }

    /// Executes the SBOM generation use case
    ///
    /// # Arguments
    /// * `request` - Generator settings
    /// * `cancel` - Operator abort; observed at every fetch
    ///
    /// # Returns
    /// SbomResponse containing the enriched components, their dependencies,
    /// the document annotations and metadata
    pub async fn execute(
        &self,
        request: SbomRequest,
        cancel: &CancellationToken,
    ) -> Result<SbomResponse> {
        // Step 1: Parse settings (fails before any network access)
        let settings = Self::parse_settings(&request)?;

        // Step 2: Load the SPDX license registry
        let registry = self.load_license_registry(cancel).await?;

        // Step 3: Map artifacts to components
        let mut graph = self.build_component_graph(&settings.expected_missing)?;

        // Step 4: Enrich components concurrently
        let report = self
            .enrich_components(&mut graph, registry, settings.options, cancel)
            .await?;

        // Step 5: Share binary details with source components
        graph.transfer_source_details(self.repository.components(), &settings.expected_missing);

        // Step 6: Build and return response
        let annotations = Self::build_annotations(&request, &report);
        Ok(SbomResponse::new(
            graph.components.into_iter().map(|c| c.component).collect(),
            report.dependencies,
            annotations,
            SbomGenerator::generate_default_metadata(),
        ))
    }

    fn parse_settings(request: &SbomRequest) -> Result<GeneratorSettings> {
        let expected_missing =
            ExpectedMissingPatterns::new(&request.expected_missing_artifact_patterns)?;
        let contexts = RequirementContexts::parse(
            &request.requirement_inclusions,
            &request.requirement_exclusions,
        )?;
        let redirections = UriRedirections::parse(&request.redirections)?;

        Ok(GeneratorSettings {
            expected_missing,
            options: EnrichmentOptions {
                central_search: request.central_search,
                fetch_advisory: request.fetch_advisory,
                fetch_clearly_defined: request.fetch_clearly_defined,
                process_bundle_classpath: request.process_bundle_classpath,
                redirections,
                contexts,
                ..EnrichmentOptions::default()
            },
        })
    }

    async fn load_license_registry(&self, cancel: &CancellationToken) -> Result<LicenseRegistry> {
        self.progress_reporter
            .report("📖 Loading SPDX license registry...");

        let registry = LicenseRegistry::load(self.content.as_ref(), cancel).await?;

        self.progress_reporter.report(&format!(
            "✅ Loaded {} license identifier(s)",
            registry.len()
        ));
        Ok(registry)
    }

    fn build_component_graph(
        &self,
        expected_missing: &ExpectedMissingPatterns,
    ) -> Result<ComponentGraph> {
        self.progress_reporter
            .report("🔗 Mapping artifacts to components...");

        let graph = ComponentGraph::build(self.repository.as_ref(), expected_missing)?;

        self.progress_reporter.report(&format!(
            "✅ Mapped {} component(s) from {} unit(s)",
            graph.len(),
            self.repository.components().len()
        ));
        Ok(graph)
    }

    async fn enrich_components(
        &self,
        graph: &mut ComponentGraph,
        registry: LicenseRegistry,
        options: EnrichmentOptions,
        cancel: &CancellationToken,
    ) -> Result<EnrichmentReport> {
        self.progress_reporter.report(&format!(
            "🔍 Enriching {} component(s) with {} worker(s)...",
            graph.len(),
            options.workers
        ));

        let orchestrator = EnrichmentOrchestrator::new(
            Arc::clone(&self.repository),
            Arc::clone(&self.content),
            Arc::new(registry),
            options,
        );
        match orchestrator
            .enrich(graph, &self.progress_reporter, cancel)
            .await
        {
            Ok(report) => {
                self.progress_reporter.report_completion(&format!(
                    "✅ Enrichment complete: {} component(s), {} dependency edge(s)",
                    graph.len(),
                    report.dependencies.edge_count()
                ));
                Ok(report)
            }
            Err(e) => {
                self.progress_reporter
                    .report_error("❌ Enrichment did not complete");
                Err(e)
            }
        }
    }

    fn build_annotations(request: &SbomRequest, report: &EnrichmentReport) -> Vec<Annotation> {
        if !request.verbose {
            return Vec::new();
        }
        vec![
            Annotation::new("licenses", &report.accepted_urls),
            Annotation::new("rejected-urls", &report.rejected_urls),
        ]
    }
}
