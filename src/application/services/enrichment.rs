use super::advisory::attach_advisories;
use super::component_graph::{ComponentGraph, ComponentIndex, MappedComponent};
use super::coordinate_resolver::CoordinateResolver;
use super::dependency_resolver::{DependencyResolver, RequirementContexts};
use super::evidence_extractor::EvidenceExtractor;
use super::license_registry::LicenseRegistry;
use super::nested_jars::add_nested_jars;
use crate::ports::outbound::{ContentSource, MetadataRepository, ProgressReporter};
use crate::sbom_generation::domain::{ComponentType, Dependency, DependencyGraph};
use crate::sbom_generation::policies::UriRedirections;
use crate::sbom_generation::services::{ComponentFactory, DigestCalculator};
use crate::shared::error::{is_cancellation, EnrichmentFailure, SbomError};
use crate::shared::Result;
use anyhow::Context;
use futures::FutureExt;
use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Upper bound on the wait for all enrichment tasks.
pub const ENRICHMENT_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Switches and lookups applied by every enrichment task.
#[derive(Debug, Clone)]
pub struct EnrichmentOptions {
    pub central_search: bool,
    pub fetch_advisory: bool,
    pub fetch_clearly_defined: bool,
    pub process_bundle_classpath: bool,
    pub redirections: UriRedirections,
    pub contexts: RequirementContexts,
    /// Maximum number of components enriched at once.
    pub workers: usize,
    pub timeout: Duration,
}

impl Default for EnrichmentOptions {
    fn default() -> Self {
        Self {
            central_search: false,
            fetch_advisory: false,
            fetch_clearly_defined: false,
            process_bundle_classpath: false,
            redirections: UriRedirections::default(),
            contexts: RequirementContexts::default(),
            workers: default_workers(),
            timeout: ENRICHMENT_TIMEOUT,
        }
    }
}

/// Four workers per available core.
pub fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        * 4
}

/// Result of enriching every component of a graph.
#[derive(Debug, Clone, Default)]
pub struct EnrichmentReport {
    /// One entry per component, in component order.
    pub dependencies: DependencyGraph,
    pub accepted_urls: BTreeSet<String>,
    pub rejected_urls: BTreeSet<String>,
}

struct TaskContext<R: ?Sized, C: ?Sized> {
    repository: Arc<R>,
    content: Arc<C>,
    registry: Arc<LicenseRegistry>,
    index: ComponentIndex,
    options: EnrichmentOptions,
}

/// What one task learned besides the component's own fields.
#[derive(Default)]
struct TaskFindings {
    depends_on: BTreeSet<String>,
    accepted_urls: Vec<String>,
    rejected_urls: Vec<String>,
}

struct TaskOutcome {
    position: usize,
    mapped: MappedComponent,
    findings: Result<TaskFindings>,
}

/// Runs the per-component enrichment steps over a bounded set of tokio tasks.
///
/// Every task owns exactly one component. A failing task does not stop its
/// siblings; failures are reported together once all tasks have finished.
/// Cancellation ends collection immediately.
pub struct EnrichmentOrchestrator<R: ?Sized, C: ?Sized> {
    repository: Arc<R>,
    content: Arc<C>,
    registry: Arc<LicenseRegistry>,
    options: EnrichmentOptions,
}

impl<R, C> EnrichmentOrchestrator<R, C>
where
    R: MetadataRepository + ?Sized + 'static,
    C: ContentSource + ?Sized + 'static,
{
    pub fn new(
        repository: Arc<R>,
        content: Arc<C>,
        registry: Arc<LicenseRegistry>,
        options: EnrichmentOptions,
    ) -> Self {
        Self {
            repository,
            content,
            registry,
            options,
        }
    }

    /// Enriches the graph's components in place.
    ///
    /// The components are always back in the graph in their original order,
    /// even if some tasks failed. After a cancellation or timeout, components
    /// whose task did not finish are restored as they were before enrichment.
    ///
    /// # Errors
    /// - [`SbomError::Canceled`] when cancellation was observed
    /// - [`SbomError::EnrichmentTimeout`] when the tasks outlive the timeout
    /// - [`SbomError::EnrichmentFailed`] listing every failed component
    pub async fn enrich(
        &self,
        graph: &mut ComponentGraph,
        progress: &dyn ProgressReporter,
        cancel: &CancellationToken,
    ) -> Result<EnrichmentReport> {
        let context = Arc::new(TaskContext {
            repository: Arc::clone(&self.repository),
            content: Arc::clone(&self.content),
            registry: Arc::clone(&self.registry),
            index: graph.index.clone(),
            options: self.options.clone(),
        });
        let semaphore = Arc::new(Semaphore::new(self.options.workers.max(1)));
        let mapped_components = std::mem::take(&mut graph.components);
        let originals = mapped_components.clone();
        let total = mapped_components.len();

        let mut tasks = JoinSet::new();
        for (position, mapped) in mapped_components.into_iter().enumerate() {
            let context = Arc::clone(&context);
            let semaphore = Arc::clone(&semaphore);
            let cancel = cancel.clone();
            tasks.spawn(async move {
                let mut mapped = mapped;
                let findings = match semaphore.acquire_owned().await {
                    Ok(_permit) => {
                        AssertUnwindSafe(enrich_component(&context, &mut mapped, &cancel))
                            .catch_unwind()
                            .await
                            .unwrap_or_else(|panic| Err(panic_error(panic)))
                    }
                    Err(e) => Err(anyhow::anyhow!("Worker pool closed: {}", e)),
                };
                TaskOutcome {
                    position,
                    mapped,
                    findings,
                }
            });
        }

        let mut outcomes: Vec<Option<(MappedComponent, TaskFindings)>> =
            (0..total).map(|_| None).collect();
        let mut failures = Vec::new();
        let mut completed = 0;

        let collection = tokio::time::timeout(self.options.timeout, async {
            while let Some(joined) = tasks.join_next().await {
                let outcome = match joined {
                    Ok(outcome) => outcome,
                    Err(e) if e.is_cancelled() => return Err(SbomError::Canceled),
                    Err(e) => {
                        failures.push(EnrichmentFailure {
                            bom_ref: "unknown".to_string(),
                            message: e.to_string(),
                        });
                        continue;
                    }
                };
                completed += 1;

                match outcome.findings {
                    Ok(findings) => {
                        outcomes[outcome.position] = Some((outcome.mapped, findings));
                    }
                    Err(e) if is_cancellation(&e) => return Err(SbomError::Canceled),
                    Err(e) => {
                        tracing::debug!(bom_ref = %outcome.mapped.component.bom_ref, error = %e, "Enrichment failed");
                        failures.push(EnrichmentFailure {
                            bom_ref: outcome.mapped.component.bom_ref.clone(),
                            message: format!("{:#}", e),
                        });
                        outcomes[outcome.position] = Some((outcome.mapped, TaskFindings::default()));
                    }
                }
                progress.report_progress(
                    completed,
                    total,
                    Some(&format!("{} remaining", tasks.len())),
                );
            }
            Ok(())
        })
        .await;

        let interrupted = match collection {
            Err(_) => Some(SbomError::EnrichmentTimeout {
                minutes: self.options.timeout.as_secs() / 60,
            }),
            Ok(Err(e)) => Some(e),
            Ok(Ok(())) => None,
        };
        if let Some(e) = interrupted {
            tasks.abort_all();
            graph.components = outcomes
                .into_iter()
                .zip(originals)
                .map(|(outcome, original)| outcome.map_or(original, |(mapped, _)| mapped))
                .collect();
            return Err(e.into());
        }

        let mut report = EnrichmentReport::default();
        let mut dependencies = Vec::with_capacity(total);
        for (mapped, findings) in outcomes.into_iter().flatten() {
            report.accepted_urls.extend(findings.accepted_urls);
            report.rejected_urls.extend(findings.rejected_urls);
            dependencies.push(Dependency::new(
                mapped.component.bom_ref.clone(),
                findings.depends_on,
            ));
            graph.components.push(mapped);
        }
        report.dependencies = DependencyGraph::new(dependencies);

        if !failures.is_empty() {
            failures.sort_by(|a, b| a.bom_ref.cmp(&b.bom_ref));
            return Err(SbomError::EnrichmentFailed { failures }.into());
        }
        Ok(report)
    }
}

/// Bytes, digests, identity, evidence, nested jars, advisories, then edges.
async fn enrich_component<R, C>(
    context: &TaskContext<R, C>,
    mapped: &mut MappedComponent,
    cancel: &CancellationToken,
) -> Result<TaskFindings>
where
    R: MetadataRepository + ?Sized,
    C: ContentSource + ?Sized,
{
    if cancel.is_cancelled() {
        return Err(SbomError::Canceled.into());
    }
    let options = &context.options;
    let descriptor = &context.repository.components()[mapped.descriptor];
    let artifact = &mapped.artifact;
    let component = &mut mapped.component;

    let bytes = if artifact.is_metadata() {
        component.component_type = ComponentType::Data;
        Vec::new()
    } else {
        component.data.clear();
        let bytes = context
            .repository
            .artifact_bytes(artifact)
            .await
            .with_context(|| format!("Failed to read artifact {}", artifact.key()))?;
        component.hashes = DigestCalculator::compute_all(&bytes);
        bytes
    };

    let content = context.content.as_ref();
    let resolver = CoordinateResolver::new(content, cancel)
        .with_central_search(options.central_search)
        .with_clearly_defined(options.fetch_clearly_defined);
    let coordinate = resolver.resolve(descriptor, artifact, &bytes).await?;
    let verified = match coordinate.as_ref().filter(|c| !c.is_snapshot()) {
        Some(coordinate) => resolver.verify(component, coordinate, &bytes).await?,
        None => false,
    };
    if !verified {
        let location = options.redirections.redirect(artifact.location());
        component.purl = Some(ComponentFactory::p2_purl(artifact.key(), &location));
    }

    let mut evidence = EvidenceExtractor::new(content, cancel, &context.registry)
        .extract(descriptor, coordinate.as_ref(), &bytes)
        .await?;
    evidence.apply(component, &context.registry);

    if options.process_bundle_classpath {
        add_nested_jars(&resolver, component, artifact, &bytes).await?;
    }
    if options.fetch_advisory {
        attach_advisories(content, component, cancel).await?;
    }

    let depends_on =
        DependencyResolver::new(context.repository.as_ref(), &context.index, &options.contexts)
            .resolve(descriptor, component);

    Ok(TaskFindings {
        depends_on,
        accepted_urls: std::mem::take(&mut evidence.accepted_urls),
        rejected_urls: std::mem::take(&mut evidence.rejected_urls),
    })
}

fn panic_error(panic: Box<dyn std::any::Any + Send>) -> anyhow::Error {
    let message = panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    anyhow::anyhow!("Enrichment task panicked: {}", message)
}
