use crate::sbom_generation::domain::ComponentDescriptor;
use crate::shared::error::SbomError;
use crate::shared::Result;
use regex::Regex;

/// Patterns over `id:version` naming components whose artifact is known to be absent.
#[derive(Debug, Clone, Default)]
pub struct ExpectedMissingPatterns {
    patterns: Vec<Regex>,
}

impl ExpectedMissingPatterns {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|pattern| {
                let pattern = pattern.as_ref();
                Regex::new(&format!("^(?:{})$", pattern)).map_err(|e| {
                    anyhow::Error::from(SbomError::InvalidConfig {
                        message: format!("Invalid expected-missing pattern '{}': {}", pattern, e),
                    })
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { patterns })
    }

    pub fn matches(&self, descriptor: &ComponentDescriptor) -> bool {
        let value = format!("{}:{}", descriptor.id(), descriptor.version());
        self.patterns.iter().any(|pattern| pattern.is_match(&value))
    }
}
