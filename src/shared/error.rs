use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the CLI application.
///
/// These codes allow CI systems to distinguish between different
/// types of failures and successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Success - the document was produced
    Success = 0,
    /// Invalid command-line arguments or configuration
    InvalidArguments = 2,
    /// Application error (enrichment failure, network error, file I/O error, etc.)
    ApplicationError = 3,
    /// The run was canceled before the document was produced
    Canceled = 4,
}

impl ExitCode {
    /// Convert to i32 for use with std::process::exit
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Maps an error chain to the exit code the CLI reports for it.
    pub fn for_error(error: &anyhow::Error) -> Self {
        match error.downcast_ref::<SbomError>() {
            Some(SbomError::Canceled) => ExitCode::Canceled,
            Some(SbomError::InvalidConfig { .. }) | Some(SbomError::MissingInput { .. }) => {
                ExitCode::InvalidArguments
            }
            _ => match error.downcast_ref::<FetchError>() {
                Some(FetchError::Canceled) => ExitCode::Canceled,
                _ => ExitCode::ApplicationError,
            },
        }
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitCode::Success => write!(f, "Success (0)"),
            ExitCode::InvalidArguments => write!(f, "Invalid Arguments (2)"),
            ExitCode::ApplicationError => write!(f, "Application Error (3)"),
            ExitCode::Canceled => write!(f, "Canceled (4)"),
        }
    }
}

/// Failure of a single content fetch.
///
/// Callers branch on the variant: `NotFound` is a normal outcome for
/// optional evidence, `Canceled` must always propagate.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("Resource not found: {uri}")]
    NotFound { uri: String },

    #[error("Transient HTTP status {status} for {uri} after exhausting retries")]
    Transient { uri: String, status: u16 },

    #[error("HTTP status {status} for {uri}")]
    Http { uri: String, status: u16 },

    #[error("Canceled")]
    Canceled,

    #[error("I/O failure for {uri}: {details}")]
    Io { uri: String, details: String },

    #[error("Transport failure for {uri}: {details}")]
    Transport { uri: String, details: String },
}

impl FetchError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, FetchError::NotFound { .. })
    }

    pub fn is_canceled(&self) -> bool {
        matches!(self, FetchError::Canceled)
    }
}

/// Returns true when any error in the chain is a cancellation.
pub fn is_cancellation(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        matches!(cause.downcast_ref::<FetchError>(), Some(FetchError::Canceled))
            || matches!(cause.downcast_ref::<SbomError>(), Some(SbomError::Canceled))
    })
}

/// Application-specific errors for SBOM generation.
///
/// Uses thiserror to derive Display and Error traits automatically,
/// reducing boilerplate while maintaining user-friendly error messages.
#[derive(Debug, Error)]
pub enum SbomError {
    #[error("Input not found: {path}\n\n💡 Hint: {suggestion}")]
    MissingInput { path: PathBuf, suggestion: String },

    #[error("Failed to parse repository snapshot: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the snapshot file is valid JSON")]
    SnapshotParseError { path: PathBuf, details: String },

    #[error("Failed to write to file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that you have write permissions for the output location")]
    FileWriteError { path: PathBuf, details: String },

    #[error("Invalid configuration: {message}\n\n💡 Hint: Check the command-line flags and the config file")]
    InvalidConfig { message: String },

    /// Validation error for builder patterns
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Failed to read file: {path}\nDetails: {details}\n\n💡 Hint: Please verify that the file exists and you have read permissions")]
    FileReadError { path: PathBuf, details: String },

    #[error("Security violation: {path}\nReason: {reason}\n\n💡 Hint: {hint}")]
    SecurityError {
        path: PathBuf,
        reason: String,
        hint: String,
    },

    #[error("Canceled")]
    Canceled,

    #[error("Enrichment failed for {} component(s):\n{}", failures.len(), format_failures(failures))]
    EnrichmentFailed { failures: Vec<EnrichmentFailure> },

    #[error("Enrichment did not complete within {minutes} minutes\n\n💡 Hint: Re-run to reuse the content cache, or disable remote lookups")]
    EnrichmentTimeout { minutes: u64 },
}

/// One failed enrichment task, identified by the component it was working on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentFailure {
    pub bom_ref: String,
    pub message: String,
}

fn format_failures(failures: &[EnrichmentFailure]) -> String {
    failures
        .iter()
        .map(|failure| format!("  - {}: {}", failure.bom_ref, failure.message))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::InvalidArguments.as_i32(), 2);
        assert_eq!(ExitCode::ApplicationError.as_i32(), 3);
        assert_eq!(ExitCode::Canceled.as_i32(), 4);
    }

    #[test]
    fn test_exit_code_display() {
        assert_eq!(format!("{}", ExitCode::Success), "Success (0)");
        assert_eq!(format!("{}", ExitCode::Canceled), "Canceled (4)");
        assert_eq!(
            format!("{}", ExitCode::ApplicationError),
            "Application Error (3)"
        );
    }

    #[test]
    fn test_exit_code_for_cancellation() {
        let error: anyhow::Error = SbomError::Canceled.into();
        assert_eq!(ExitCode::for_error(&error), ExitCode::Canceled);

        let error: anyhow::Error = FetchError::Canceled.into();
        assert_eq!(ExitCode::for_error(&error), ExitCode::Canceled);
    }

    #[test]
    fn test_exit_code_for_missing_input() {
        let error: anyhow::Error = SbomError::MissingInput {
            path: PathBuf::from("/tmp/none.json"),
            suggestion: "Pass --input".to_string(),
        }
        .into();
        assert_eq!(ExitCode::for_error(&error), ExitCode::InvalidArguments);
    }

    #[test]
    fn test_is_cancellation_through_context() {
        let error = anyhow::Error::from(FetchError::Canceled).context("while fetching pom");
        assert!(is_cancellation(&error));

        let error = anyhow::Error::from(FetchError::NotFound {
            uri: "https://example.org".to_string(),
        });
        assert!(!is_cancellation(&error));
    }

    #[test]
    fn test_fetch_error_predicates() {
        let not_found = FetchError::NotFound {
            uri: "https://example.org/a".to_string(),
        };
        assert!(not_found.is_not_found());
        assert!(!not_found.is_canceled());
        assert!(FetchError::Canceled.is_canceled());
    }

    #[test]
    fn test_enrichment_failed_display_lists_every_failure() {
        let error = SbomError::EnrichmentFailed {
            failures: vec![
                EnrichmentFailure {
                    bom_ref: "plugins/a_1.0.0.jar".to_string(),
                    message: "boom".to_string(),
                },
                EnrichmentFailure {
                    bom_ref: "plugins/b_1.0.0.jar".to_string(),
                    message: "bang".to_string(),
                },
            ],
        };
        let display = format!("{}", error);
        assert!(display.contains("2 component(s)"));
        assert!(display.contains("plugins/a_1.0.0.jar: boom"));
        assert!(display.contains("plugins/b_1.0.0.jar: bang"));
    }

    #[test]
    fn test_missing_input_display() {
        let error = SbomError::MissingInput {
            path: PathBuf::from("/test/snapshot.json"),
            suggestion: "Test suggestion".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Input not found"));
        assert!(display.contains("/test/snapshot.json"));
        assert!(display.contains("💡 Hint:"));
        assert!(display.contains("Test suggestion"));
    }

    #[test]
    fn test_file_write_error_display() {
        let error = SbomError::FileWriteError {
            path: PathBuf::from("/test/output.json"),
            details: "Permission denied".to_string(),
        };
        let display = format!("{}", error);
        assert!(display.contains("Failed to write to file"));
        assert!(display.contains("Permission denied"));
    }
}
