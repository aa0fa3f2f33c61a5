use clap::Parser;
use std::path::PathBuf;

use crate::config::ConfigFile;
use p2_sbom::application::dto::SbomRequest;
use p2_sbom::shared::Result;

/// Generate CycloneDX SBOMs for p2 repositories
#[derive(Parser, Debug)]
#[command(name = "p2-sbom")]
#[command(version)]
#[command(about = "Generate CycloneDX SBOMs for p2 repositories", long_about = None)]
pub struct Args {
    /// Repository snapshot (JSON) to describe
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,

    /// Content cache directory (defaults to a temporary directory)
    #[arg(long, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Resolve Maven identities through the central search API
    #[arg(long)]
    pub central_search: bool,

    /// Attach vulnerability advisories for each package URL
    #[arg(long)]
    pub advisory: bool,

    /// Record declared licenses reported by ClearlyDefined
    #[arg(long)]
    pub clearly_defined: bool,

    /// Describe jars embedded through Bundle-ClassPath
    #[arg(long)]
    pub process_bundle_classpath: bool,

    /// Context in which conditional requirements must apply (key=value,...)
    /// Can be specified multiple times
    #[arg(long = "include-context", value_name = "CONTEXT")]
    pub requirement_inclusions: Vec<String>,

    /// Context in which conditional requirements are dropped (key=value,...)
    #[arg(long = "exclude-context", value_name = "CONTEXT")]
    pub requirement_exclusions: Vec<String>,

    /// Regular expression over id:version of components expected to lack an artifact
    #[arg(long = "expected-missing", value_name = "PATTERN")]
    pub expected_missing_artifact_patterns: Vec<String>,

    /// Location rewrite applied to package URLs (source->target)
    #[arg(long = "redirect", value_name = "MAPPING")]
    pub redirections: Vec<String>,

    /// Write the XML document to this file
    #[arg(long, value_name = "FILE")]
    pub xml_output: Option<PathBuf>,

    /// Write the JSON document to this file
    #[arg(long, value_name = "FILE")]
    pub json_output: Option<PathBuf>,

    /// Write the XML document to stdout
    #[arg(long)]
    pub xml_stdout: bool,

    /// Write the JSON document to stdout
    #[arg(long)]
    pub json_stdout: bool,

    /// Annotate the document with accepted and rejected license URLs; debug logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Configuration file (defaults to p2-sbom.config.yml beside the snapshot)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Merges the arguments over the configuration file values.
    ///
    /// Flags that are set win; unset flags and empty lists fall back to the file.
    pub fn into_request(self, config: ConfigFile) -> Result<SbomRequest> {
        fn list(cli: Vec<String>, file: Option<Vec<String>>) -> Vec<String> {
            if cli.is_empty() {
                file.unwrap_or_default()
            } else {
                cli
            }
        }

        SbomRequest::builder()
            .snapshot_path(self.input)
            .cache_dir(self.cache_dir.or(config.cache_dir))
            .central_search(self.central_search || config.central_search.unwrap_or(false))
            .fetch_advisory(self.advisory || config.fetch_advisory.unwrap_or(false))
            .fetch_clearly_defined(
                self.clearly_defined || config.fetch_clearly_defined.unwrap_or(false),
            )
            .process_bundle_classpath(
                self.process_bundle_classpath || config.process_bundle_classpath.unwrap_or(false),
            )
            .verbose(self.verbose || config.verbose.unwrap_or(false))
            .requirement_inclusions(list(self.requirement_inclusions, config.requirement_inclusions))
            .requirement_exclusions(list(self.requirement_exclusions, config.requirement_exclusions))
            .expected_missing_artifact_patterns(list(
                self.expected_missing_artifact_patterns,
                config.expected_missing_artifact_patterns,
            ))
            .redirections(list(self.redirections, config.redirections))
            .xml_output(self.xml_output.or(config.xml_output))
            .json_output(self.json_output.or(config.json_output))
            .xml_stdout(self.xml_stdout)
            .json_stdout(self.json_stdout)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("p2-sbom").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_input_is_required() {
        let result = Args::try_parse_from(["p2-sbom"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_repeated_options_accumulate() {
        let args = parse(&[
            "-i",
            "repository.json",
            "--include-context",
            "osgi.os=linux",
            "--include-context",
            "osgi.os=win32",
            "--redirect",
            "https://a.example->https://b.example",
        ]);
        assert_eq!(args.input, PathBuf::from("repository.json"));
        assert_eq!(args.requirement_inclusions.len(), 2);
        assert_eq!(args.redirections, vec!["https://a.example->https://b.example"]);
        assert!(!args.central_search);
    }

    #[test]
    fn test_flags_override_config() {
        let args = parse(&[
            "-i",
            "repository.json",
            "--advisory",
            "--expected-missing",
            "cli.*",
            "--json-output",
            "cli.json",
        ]);
        let config = ConfigFile {
            fetch_advisory: Some(false),
            central_search: Some(true),
            expected_missing_artifact_patterns: Some(vec!["file.*".to_string()]),
            requirement_exclusions: Some(vec!["osgi.ws=cocoa".to_string()]),
            json_output: Some(PathBuf::from("file.json")),
            ..ConfigFile::default()
        };

        let request = args.into_request(config).unwrap();
        assert!(request.fetch_advisory);
        assert!(request.central_search);
        assert_eq!(request.expected_missing_artifact_patterns, vec!["cli.*"]);
        assert_eq!(request.requirement_exclusions, vec!["osgi.ws=cocoa"]);
        assert_eq!(request.json_output, Some(PathBuf::from("cli.json")));
    }

    #[test]
    fn test_defaults_without_config() {
        let request = parse(&["-i", "repository.json"])
            .into_request(ConfigFile::default())
            .unwrap();
        assert!(!request.verbose);
        assert!(request.cache_dir.is_none());
        assert!(request.redirections.is_empty());
    }
}
