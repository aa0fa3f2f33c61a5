use std::fmt;

/// Component classification in the emitted document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentType {
    Library,
    Data,
}

impl ComponentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentType::Library => "library",
            ComponentType::Data => "data",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Required,
}

/// Digest algorithms recorded for every artifact, in emission order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Sha512,
    Sha384,
    Sha3_256,
    Sha3_384,
    Sha3_512,
}

impl HashAlgorithm {
    pub const ALL: [HashAlgorithm; 8] = [
        HashAlgorithm::Md5,
        HashAlgorithm::Sha1,
        HashAlgorithm::Sha256,
        HashAlgorithm::Sha512,
        HashAlgorithm::Sha384,
        HashAlgorithm::Sha3_256,
        HashAlgorithm::Sha3_384,
        HashAlgorithm::Sha3_512,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "MD5",
            HashAlgorithm::Sha1 => "SHA-1",
            HashAlgorithm::Sha256 => "SHA-256",
            HashAlgorithm::Sha512 => "SHA-512",
            HashAlgorithm::Sha384 => "SHA-384",
            HashAlgorithm::Sha3_256 => "SHA3-256",
            HashAlgorithm::Sha3_384 => "SHA3-384",
            HashAlgorithm::Sha3_512 => "SHA3-512",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hash {
    pub algorithm: HashAlgorithm,
    pub value: String,
}

/// Named string property attached to a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    pub name: String,
    pub value: String,
}

impl Property {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A license entry. Exactly one of `id` (a valid SPDX id) or `name` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct License {
    pub id: Option<String>,
    pub name: Option<String>,
    pub url: String,
}

impl License {
    pub fn with_id(id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            name: None,
            url: url.into(),
        }
    }

    pub fn with_name(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            url: url.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExternalReferenceType {
    Vcs,
    IssueTracker,
    Website,
    MailingList,
    Distribution,
    Advisories,
    Other,
}

impl ExternalReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExternalReferenceType::Vcs => "vcs",
            ExternalReferenceType::IssueTracker => "issue-tracker",
            ExternalReferenceType::Website => "website",
            ExternalReferenceType::MailingList => "mailing-list",
            ExternalReferenceType::Distribution => "distribution",
            ExternalReferenceType::Advisories => "advisories",
            ExternalReferenceType::Other => "other",
        }
    }
}

impl fmt::Display for ExternalReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalReference {
    pub kind: ExternalReferenceType,
    pub url: String,
}

/// Ordered collection of external references with same-type deduplication.
///
/// When two URLs of the same type differ only by a query suffix, the more
/// specific one is kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExternalReferences(Vec<ExternalReference>);

impl ExternalReferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, kind: ExternalReferenceType, url: impl Into<String>) {
        let url = url.into();
        for existing in self.0.iter_mut().filter(|r| r.kind == kind) {
            if existing.url == url || is_query_extension(&existing.url, &url) {
                return;
            }
            if is_query_extension(&url, &existing.url) {
                existing.url = url;
                return;
            }
        }
        self.0.push(ExternalReference { kind, url });
    }

    pub fn extend(&mut self, other: ExternalReferences) {
        for reference in other.0 {
            self.add(reference.kind, reference.url);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExternalReference> {
        self.0.iter()
    }

    pub fn urls_of(&self, kind: ExternalReferenceType) -> Vec<&str> {
        self.0
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.url.as_str())
            .collect()
    }
}

/// True when `longer` is `shorter` followed by a query string.
fn is_query_extension(longer: &str, shorter: &str) -> bool {
    longer.len() > shorter.len()
        && longer.starts_with(shorter)
        && longer.as_bytes()[shorter.len()] == b'?'
}

/// Record of the canonical artifact a locally rebuilt artifact derives from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pedigree {
    pub ancestors: Vec<Component>,
    pub notes: String,
}

/// Configuration attachment (touchpoint rendering) carried by a component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentData {
    pub name: String,
    pub content_type: String,
    pub text: String,
}

/// A CycloneDX component under construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    pub bom_ref: String,
    pub component_type: ComponentType,
    pub name: String,
    pub group: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub purl: Option<String>,
    pub scope: Option<Scope>,
    pub properties: Vec<Property>,
    pub hashes: Vec<Hash>,
    pub licenses: Vec<License>,
    pub external_references: ExternalReferences,
    pub pedigree: Option<Pedigree>,
    pub components: Vec<Component>,
    pub data: Vec<ComponentData>,
}

impl Component {
    pub fn new(component_type: ComponentType, name: impl Into<String>) -> Self {
        Self {
            bom_ref: String::new(),
            component_type,
            name: name.into(),
            group: None,
            version: None,
            description: None,
            publisher: None,
            purl: None,
            scope: None,
            properties: Vec::new(),
            hashes: Vec::new(),
            licenses: Vec::new(),
            external_references: ExternalReferences::new(),
            pedigree: None,
            components: Vec::new(),
            data: Vec::new(),
        }
    }

    pub fn add_property(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.properties.push(Property::new(name, value));
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    pub fn add_external_reference(&mut self, kind: ExternalReferenceType, url: impl Into<String>) {
        self.external_references.add(kind, url);
    }
}
