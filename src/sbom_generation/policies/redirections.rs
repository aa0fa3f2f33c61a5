use crate::shared::error::SbomError;
use crate::shared::Result;

/// URI rewrites applied to repository locations, parsed from `source->target` pairs.
///
/// An exact source match wins; otherwise the longest matching source prefix
/// is replaced by its target.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriRedirections {
    mappings: Vec<(String, String)>,
}

impl UriRedirections {
    pub fn parse<S: AsRef<str>>(redirections: &[S]) -> Result<Self> {
        let mut mappings = Vec::new();
        for redirection in redirections {
            let redirection = redirection.as_ref();
            let parts: Vec<&str> = redirection.split("->").collect();
            if parts.len() != 2 {
                return Err(SbomError::InvalidConfig {
                    message: format!("Expected a '->' in the redirection: {}", redirection),
                }
                .into());
            }
            mappings.push((parts[0].trim().to_string(), parts[1].trim().to_string()));
        }
        // Longest source first so prefix lookup finds the most specific mapping.
        mappings.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        Ok(Self { mappings })
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn redirect(&self, uri: &str) -> String {
        if let Some((_, target)) = self.mappings.iter().find(|(source, _)| source == uri) {
            return target.clone();
        }
        for (source, target) in &self.mappings {
            if let Some(rest) = uri.strip_prefix(source.as_str()) {
                return format!("{}{}", target, rest);
            }
        }
        uri.to_string()
    }
}
