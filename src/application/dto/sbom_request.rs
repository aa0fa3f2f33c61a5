use super::OutputFormat;
use crate::shared::error::SbomError;
use crate::shared::Result;
use std::path::PathBuf;

/// Where one serialization of the document goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputTarget {
    pub format: OutputFormat,
    /// `None` writes to stdout.
    pub path: Option<PathBuf>,
}

/// SbomRequest - Internal request DTO for SBOM generation use case
///
/// Carries every generator setting. Construct it with [`SbomRequest::builder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SbomRequest {
    /// Repository snapshot to generate the document for
    pub snapshot_path: PathBuf,
    /// Content cache root; a temporary directory when unset
    pub cache_dir: Option<PathBuf>,
    /// Resolve Maven identities through the central search API
    pub central_search: bool,
    /// Attach vulnerability references for each package URL
    pub fetch_advisory: bool,
    /// Record declared licenses from ClearlyDefined
    pub fetch_clearly_defined: bool,
    /// Describe jars embedded through `Bundle-ClassPath`
    pub process_bundle_classpath: bool,
    /// Add accepted/rejected license URL annotations
    pub verbose: bool,
    /// `key=value,...` contexts in which a conditional requirement must apply
    pub requirement_inclusions: Vec<String>,
    /// `key=value,...` contexts in which a conditional requirement is dropped
    pub requirement_exclusions: Vec<String>,
    /// Regular expressions over `id:version` of components known to lack an artifact
    pub expected_missing_artifact_patterns: Vec<String>,
    /// `source->target` location rewrites for package URLs
    pub redirections: Vec<String>,
    pub xml_output: Option<PathBuf>,
    pub json_output: Option<PathBuf>,
    pub xml_stdout: bool,
    pub json_stdout: bool,
}

impl SbomRequest {
    pub fn builder() -> SbomRequestBuilder {
        SbomRequestBuilder::default()
    }

    /// Requested outputs; XML to stdout when nothing was requested.
    pub fn output_targets(&self) -> Vec<OutputTarget> {
        let mut targets = Vec::new();
        if let Some(path) = &self.xml_output {
            targets.push(OutputTarget {
                format: OutputFormat::Xml,
                path: Some(path.clone()),
            });
        }
        if let Some(path) = &self.json_output {
            targets.push(OutputTarget {
                format: OutputFormat::Json,
                path: Some(path.clone()),
            });
        }
        if self.xml_stdout || (targets.is_empty() && !self.json_stdout) {
            targets.push(OutputTarget {
                format: OutputFormat::Xml,
                path: None,
            });
        }
        if self.json_stdout {
            targets.push(OutputTarget {
                format: OutputFormat::Json,
                path: None,
            });
        }
        targets
    }
}

/// Builder for [`SbomRequest`]
#[derive(Debug, Default)]
pub struct SbomRequestBuilder {
    snapshot_path: Option<PathBuf>,
    cache_dir: Option<PathBuf>,
    central_search: bool,
    fetch_advisory: bool,
    fetch_clearly_defined: bool,
    process_bundle_classpath: bool,
    verbose: bool,
    requirement_inclusions: Vec<String>,
    requirement_exclusions: Vec<String>,
    expected_missing_artifact_patterns: Vec<String>,
    redirections: Vec<String>,
    xml_output: Option<PathBuf>,
    json_output: Option<PathBuf>,
    xml_stdout: bool,
    json_stdout: bool,
}

impl SbomRequestBuilder {
    pub fn snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    pub fn cache_dir(mut self, path: Option<PathBuf>) -> Self {
        self.cache_dir = path;
        self
    }

    pub fn central_search(mut self, enabled: bool) -> Self {
        self.central_search = enabled;
        self
    }

    pub fn fetch_advisory(mut self, enabled: bool) -> Self {
        self.fetch_advisory = enabled;
        self
    }

    pub fn fetch_clearly_defined(mut self, enabled: bool) -> Self {
        self.fetch_clearly_defined = enabled;
        self
    }

    pub fn process_bundle_classpath(mut self, enabled: bool) -> Self {
        self.process_bundle_classpath = enabled;
        self
    }

    pub fn verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }

    pub fn requirement_inclusions(mut self, contexts: Vec<String>) -> Self {
        self.requirement_inclusions = contexts;
        self
    }

    pub fn requirement_exclusions(mut self, contexts: Vec<String>) -> Self {
        self.requirement_exclusions = contexts;
        self
    }

    pub fn expected_missing_artifact_patterns(mut self, patterns: Vec<String>) -> Self {
        self.expected_missing_artifact_patterns = patterns;
        self
    }

    pub fn redirections(mut self, redirections: Vec<String>) -> Self {
        self.redirections = redirections;
        self
    }

    pub fn xml_output(mut self, path: Option<PathBuf>) -> Self {
        self.xml_output = path;
        self
    }

    pub fn json_output(mut self, path: Option<PathBuf>) -> Self {
        self.json_output = path;
        self
    }

    pub fn xml_stdout(mut self, enabled: bool) -> Self {
        self.xml_stdout = enabled;
        self
    }

    pub fn json_stdout(mut self, enabled: bool) -> Self {
        self.json_stdout = enabled;
        self
    }

    /// # Errors
    /// Returns a validation error when no snapshot path was given.
    pub fn build(self) -> Result<SbomRequest> {
        let snapshot_path = self.snapshot_path.ok_or_else(|| SbomError::Validation {
            message: "snapshot_path is required".to_string(),
        })?;
        Ok(SbomRequest {
            snapshot_path,
            cache_dir: self.cache_dir,
            central_search: self.central_search,
            fetch_advisory: self.fetch_advisory,
            fetch_clearly_defined: self.fetch_clearly_defined,
            process_bundle_classpath: self.process_bundle_classpath,
            verbose: self.verbose,
            requirement_inclusions: self.requirement_inclusions,
            requirement_exclusions: self.requirement_exclusions,
            expected_missing_artifact_patterns: self.expected_missing_artifact_patterns,
            redirections: self.redirections,
            xml_output: self.xml_output,
            json_output: self.json_output,
            xml_stdout: self.xml_stdout,
            json_stdout: self.json_stdout,
        })
    }
}
