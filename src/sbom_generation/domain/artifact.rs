use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Ordered string-keyed property map used throughout the p2 model.
pub type Properties = BTreeMap<String, String>;

/// Classifier of the synthetic artifact representing a component that has
/// no downloadable artifact of its own.
pub const METADATA_CLASSIFIER: &str = "metadata";

/// Classifier of OSGi bundle artifacts.
pub const BUNDLE_CLASSIFIER: &str = "osgi.bundle";

/// Identity of an artifact: (classifier, id, version).
///
/// Keys are ordered by classifier, then id, then version, with versions
/// compared segment by segment so that `1.10.0` sorts after `1.9.0`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactKey {
    classifier: String,
    id: String,
    version: String,
}

impl ArtifactKey {
    pub fn new(
        classifier: impl Into<String>,
        id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            classifier: classifier.into(),
            id: id.into(),
            version: version.into(),
        }
    }

    pub fn classifier(&self) -> &str {
        &self.classifier
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn is_metadata(&self) -> bool {
        self.classifier == METADATA_CLASSIFIER
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.classifier, self.id, self.version)
    }
}

impl Ord for ArtifactKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.classifier
            .cmp(&other.classifier)
            .then_with(|| self.id.cmp(&other.id))
            .then_with(|| compare_versions(&self.version, &other.version))
    }
}

impl PartialOrd for ArtifactKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Compares OSGi-style versions (`major.minor.micro.qualifier`).
///
/// Numeric segments compare numerically, anything else lexically. Falls back
/// to a plain string comparison so the ordering stays total.
pub fn compare_versions(left: &str, right: &str) -> Ordering {
    let mut left_segments = left.split('.');
    let mut right_segments = right.split('.');
    loop {
        match (left_segments.next(), right_segments.next()) {
            (None, None) => return left.cmp(right),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ordering = match (l.parse::<u64>(), r.parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    _ => l.cmp(r),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

/// A physical or synthetic representation of an artifact.
///
/// `repository` is the location of the repository holding the artifact and
/// `path` its location relative to that repository. Synthetic metadata
/// descriptors carry the metadata repository location in the `location`
/// property instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDescriptor {
    key: ArtifactKey,
    repository: String,
    path: String,
    properties: Properties,
}

impl ArtifactDescriptor {
    pub fn new(key: ArtifactKey, repository: String, path: String, properties: Properties) -> Self {
        Self {
            key,
            repository,
            path,
            properties,
        }
    }

    /// Synthesizes the descriptor for a component that only exists as metadata.
    pub fn metadata(id: &str, version: &str, metadata_location: &str) -> Self {
        let mut properties = Properties::new();
        properties.insert("location".to_string(), metadata_location.to_string());
        Self {
            key: ArtifactKey::new(METADATA_CLASSIFIER, id, version),
            repository: metadata_location.to_string(),
            path: String::new(),
            properties,
        }
    }

    pub fn key(&self) -> &ArtifactKey {
        &self.key
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// A canonical descriptor has no processing `format` property.
    pub fn is_canonical(&self) -> bool {
        !self.properties.contains_key("format")
    }

    pub fn is_metadata(&self) -> bool {
        self.key.is_metadata()
    }

    /// Location used for the p2 fallback purl.
    pub fn location(&self) -> &str {
        if self.is_metadata() {
            self.property("location").unwrap_or(&self.repository)
        } else {
            &self.repository
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_order_by_classifier_then_id_then_version() {
        let mut keys = vec![
            ArtifactKey::new("osgi.bundle", "b", "1.0.0"),
            ArtifactKey::new("binary", "z", "1.0.0"),
            ArtifactKey::new("osgi.bundle", "a", "1.10.0"),
            ArtifactKey::new("osgi.bundle", "a", "1.9.0"),
        ];
        keys.sort();
        let rendered: Vec<String> = keys.iter().map(ToString::to_string).collect();
        assert_eq!(
            rendered,
            vec![
                "binary,z,1.0.0",
                "osgi.bundle,a,1.9.0",
                "osgi.bundle,a,1.10.0",
                "osgi.bundle,b,1.0.0",
            ]
        );
    }

    #[test]
    fn test_compare_versions_with_qualifiers() {
        assert_eq!(
            compare_versions("1.0.0.v20240101", "1.0.0.v20230101"),
            Ordering::Greater
        );
        assert_eq!(compare_versions("1.0", "1.0.0"), Ordering::Less);
        assert_eq!(compare_versions("2.0.0", "2.0.0"), Ordering::Equal);
    }

    #[test]
    fn test_metadata_descriptor_carries_location() {
        let descriptor =
            ArtifactDescriptor::metadata("org.example.feature", "1.0.0", "https://example.org/repo");
        assert!(descriptor.is_metadata());
        assert!(descriptor.is_canonical());
        assert_eq!(descriptor.location(), "https://example.org/repo");
        assert_eq!(descriptor.key().classifier(), METADATA_CLASSIFIER);
    }

    #[test]
    fn test_descriptor_with_format_is_not_canonical() {
        let mut properties = Properties::new();
        properties.insert("format".to_string(), "packed".to_string());
        let descriptor = ArtifactDescriptor::new(
            ArtifactKey::new(BUNDLE_CLASSIFIER, "a", "1.0.0"),
            "https://example.org/repo".to_string(),
            "plugins/a_1.0.0.jar.pack.gz".to_string(),
            properties,
        );
        assert!(!descriptor.is_canonical());
        assert_eq!(descriptor.location(), "https://example.org/repo");
    }
}
