use crate::ports::outbound::ContentSource;
use crate::sbom_generation::domain::{
    ArtifactDescriptor, Component, ComponentDescriptor, ComponentType, HashAlgorithm,
    MavenCoordinate, Pedigree,
};
use crate::sbom_generation::services::{ArchiveInspector, DigestCalculator};
use crate::shared::Result;
use anyhow::Context;
use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;
use tokio_util::sync::CancellationToken;

const CENTRAL_SHA1_SEARCH: &str = "https://central.sonatype.com/solrsearch/select";
const CENTRAL_GAV_SEARCH: &str = "https://search.maven.org/solrsearch/select";

static JAR_ARTIFACT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:.*/)?(?P<artifactId>[^-]+)-(?P<version>(?:[0-9.]+[^-]+)?)(?:-(?P<classifier>[^-0-9]+))?\.jar$",
    )
    .expect("valid jar name pattern")
});

#[derive(Debug, Deserialize)]
struct SearchResult {
    response: Option<SearchResponse>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "numFound")]
    num_found: Option<u64>,
    #[serde(default)]
    docs: Vec<SearchDocument>,
}

#[derive(Debug, Deserialize)]
struct SearchDocument {
    g: String,
    a: String,
    v: String,
    p: Option<String>,
}

impl SearchResult {
    /// The coordinate of the only hit, if there is exactly one.
    fn single_hit(self, classifier: Option<String>) -> Option<MavenCoordinate> {
        let response = self.response?;
        if response.num_found != Some(1) {
            return None;
        }
        let doc = response.docs.into_iter().next()?;
        Some(MavenCoordinate::new(doc.g, doc.a, doc.v, classifier, doc.p))
    }
}

/// Derives Maven coordinates for artifacts and verifies them against Maven Central.
///
/// Borrowed per enrichment task; every network access goes through the
/// shared [`ContentSource`] and observes the task's cancellation token.
pub struct CoordinateResolver<'a, C: ContentSource + ?Sized> {
    content: &'a C,
    cancel: &'a CancellationToken,
    central_search: bool,
    clearly_defined: bool,
}

impl<'a, C: ContentSource + ?Sized> CoordinateResolver<'a, C> {
    pub fn new(content: &'a C, cancel: &'a CancellationToken) -> Self {
        Self {
            content,
            cancel,
            central_search: false,
            clearly_defined: false,
        }
    }

    /// Enables content-hash and file-name lookups against the central search API.
    pub fn with_central_search(mut self, enabled: bool) -> Self {
        self.central_search = enabled;
        self
    }

    /// Enables the declared-license lookup for verified coordinates.
    pub fn with_clearly_defined(mut self, enabled: bool) -> Self {
        self.clearly_defined = enabled;
        self
    }

    /// Resolves the coordinate of an artifact.
    ///
    /// First match wins: artifact properties, component properties, embedded
    /// `pom.properties`, then a SHA-1 search when central search is enabled.
    pub async fn resolve(
        &self,
        component: &ComponentDescriptor,
        artifact: &ArtifactDescriptor,
        bytes: &[u8],
    ) -> Result<Option<MavenCoordinate>> {
        if let Some(coordinate) = MavenCoordinate::from_properties(artifact.properties()) {
            return Ok(Some(coordinate));
        }
        if let Some(coordinate) = MavenCoordinate::from_properties(component.properties()) {
            return Ok(Some(coordinate));
        }
        if bytes.is_empty() {
            return Ok(None);
        }
        self.from_bytes(bytes).await
    }

    /// Embedded `META-INF/maven/**/pom.properties`, else a SHA-1 search.
    pub async fn from_bytes(&self, bytes: &[u8]) -> Result<Option<MavenCoordinate>> {
        if let Some(coordinate) = embedded_coordinate(bytes)? {
            return Ok(Some(coordinate));
        }
        if !self.central_search {
            return Ok(None);
        }
        let sha1 = DigestCalculator::compute(HashAlgorithm::Sha1, bytes);
        let uri = format!("{}?q=1:{}&wt=json", CENTRAL_SHA1_SEARCH, sha1);
        self.search(&uri, None).await
    }

    /// Looks up a nested jar by its file name, e.g. `lib/commons-io-2.16.1.jar`.
    pub async fn from_jar_name(&self, path: &str) -> Result<Option<MavenCoordinate>> {
        if !self.central_search {
            return Ok(None);
        }
        let Some(captures) = JAR_ARTIFACT.captures(path) else {
            return Ok(None);
        };
        let classifier = captures.name("classifier").map(|m| m.as_str().to_string());
        let mut terms = vec![
            format!("a:{}", &captures["artifactId"]),
            format!("v:{}", &captures["version"]),
        ];
        if let Some(classifier) = &classifier {
            terms.push(format!("l:{}", classifier));
        }
        let uri = format!(
            "{}?q={}&rows=20&wt=json",
            CENTRAL_GAV_SEARCH,
            terms.join("%20AND%20")
        );
        self.search(&uri, classifier).await
    }

    async fn search(
        &self,
        uri: &str,
        classifier: Option<String>,
    ) -> Result<Option<MavenCoordinate>> {
        let body = self.content.fetch(uri, self.cancel).await?;
        let result: SearchResult = serde_json::from_slice(&body)
            .with_context(|| format!("Invalid central search response from {}", uri))?;
        Ok(result.single_hit(classifier))
    }

    /// Compares local bytes with the canonical Maven artifact.
    ///
    /// On equivalence the component gets the Maven purl and `true` is
    /// returned. Otherwise the coordinate is recorded as a pedigree ancestor
    /// with the differing entries as notes. A canonical artifact that does
    /// not exist leaves the component untouched.
    pub async fn verify(
        &self,
        component: &mut Component,
        coordinate: &MavenCoordinate,
        bytes: &[u8],
    ) -> Result<bool> {
        let canonical = match self.content.fetch(&coordinate.artifact_uri(), self.cancel).await {
            Ok(canonical) => canonical,
            Err(e) if e.is_not_found() => {
                tracing::debug!(coordinate = %coordinate, "No Maven artifact");
                return Ok(false);
            }
            Err(e) => return Err(e.into()),
        };

        if self.clearly_defined {
            self.record_declared_license(component, coordinate).await?;
        }

        let equivalence = ArchiveInspector::compare(bytes, &canonical)
            .with_context(|| format!("Failed to compare with {}", coordinate))?;
        if equivalence.equivalent {
            component.purl = Some(coordinate.purl());
            return Ok(true);
        }

        component.pedigree = Some(Pedigree {
            ancestors: vec![ancestor(component, coordinate)],
            notes: equivalence.differences.join(", "),
        });
        Ok(false)
    }

    async fn record_declared_license(
        &self,
        component: &mut Component,
        coordinate: &MavenCoordinate,
    ) -> Result<()> {
        if coordinate.is_sources() {
            return Ok(());
        }
        let uri = coordinate.clearly_defined_uri();
        let body = match self.content.fetch(&uri, self.cancel).await {
            Ok(body) => body,
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        match serde_json::from_slice::<serde_json::Value>(&body) {
            Ok(definition) => {
                if let Some(declared) = definition
                    .get("licensed")
                    .and_then(|licensed| licensed.get("declared"))
                    .and_then(|declared| declared.as_str())
                {
                    component.add_property("clearly-defined", declared);
                }
            }
            Err(e) => tracing::warn!(uri = %uri, error = %e, "Bad ClearlyDefined content"),
        }
        Ok(())
    }
}

/// Minimal component naming the Maven artifact a component was derived from.
fn ancestor(component: &Component, coordinate: &MavenCoordinate) -> Component {
    let mut ancestor = Component::new(ComponentType::Library, coordinate.artifact_id());
    ancestor.bom_ref = format!("{}^", component.bom_ref);
    ancestor.group = Some(coordinate.group_id().to_string());
    ancestor.purl = Some(coordinate.purl());
    ancestor
}

/// The first complete `pom.properties` under `META-INF/maven/`.
fn embedded_coordinate(bytes: &[u8]) -> Result<Option<MavenCoordinate>> {
    if !ArchiveInspector::is_zip(bytes) {
        return Ok(None);
    }
    let mut found = None;
    ArchiveInspector::for_each_entry(bytes, |name, content| {
        if found.is_none() && name.starts_with("META-INF/maven/") && name.ends_with("pom.properties")
        {
            found = MavenCoordinate::from_pom_properties(&String::from_utf8_lossy(content));
        }
        Ok(())
    })?;
    Ok(found)
}
