use super::license_registry::LicenseRegistry;
use crate::ports::outbound::ContentSource;
use crate::sbom_generation::domain::{
    Component, ComponentDescriptor, ExternalReferenceType, ExternalReferences, License,
    MavenCoordinate,
};
use crate::sbom_generation::policies::{LicenseEvidencePolicy, LicenseMap, INDETERMINATE};
use crate::sbom_generation::services::{
    encode_query_parameter, parse_header, parse_key_values, ArchiveInspector, Manifest,
};
use crate::shared::Result;
use anyhow::Context;
use regex::Regex;
use std::sync::LazyLock;
use tokio_util::sync::CancellationToken;

static MAVEN_POM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^META-INF/maven/[^/]+/[^/]+/pom\.xml$").expect("valid pom entry pattern")
});

static META_INF_FILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^META-INF/[^/]+$").expect("valid META-INF pattern"));

static BUNDLE_PROPERTIES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*/)?(bundle|plugin)\.properties$").expect("valid properties pattern")
});

static LICENSE_FILE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(.*/)?LICENSE[^/]*(\.txt)?$").expect("valid license file pattern")
});

static GITHUB_REPOSITORY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(scm:)?(git:)?https?://github\.com/(?P<repo>[^/]+/[^/]+?)(\.git)?$")
        .expect("valid forge pattern")
});

/// META-INF entries that never carry license text.
const SIGNATURE_SUFFIXES: [&str; 5] = [".RSA", ".SF", ".inf", ".DSA", "DEPENDENCIES"];

/// Everything learned about one component from its bytes and companion documents.
#[derive(Debug, Default)]
pub struct Evidence {
    pub licenses: LicenseMap,
    pub references: ExternalReferences,
    pub accepted_urls: Vec<String>,
    pub rejected_urls: Vec<String>,
    forge_repositories: Vec<String>,
}

impl Evidence {
    /// License entries ordered by URL; registry identifiers become ids.
    pub fn license_choice(&self, registry: &LicenseRegistry) -> Vec<License> {
        self.licenses
            .iter()
            .map(|(url, name)| match name {
                Some(name) if registry.is_valid_id(name) => License::with_id(name, url),
                Some(name) => License::with_name(name, url),
                None => License::with_name(INDETERMINATE, url),
            })
            .collect()
    }

    /// Moves licenses and references onto the component.
    pub fn apply(&mut self, component: &mut Component, registry: &LicenseRegistry) {
        if !self.licenses.is_empty() {
            component.licenses = self.license_choice(registry);
        }
        component
            .external_references
            .extend(std::mem::take(&mut self.references));
    }

    fn add_forge_candidate(&mut self, url: &str) {
        if let Some(captures) = GITHUB_REPOSITORY.captures(url) {
            let repository = captures["repo"].to_string();
            if !self.forge_repositories.contains(&repository) {
                self.forge_repositories.push(repository);
            }
        }
    }
}

/// Collects license and provenance evidence for a component.
///
/// Layers are applied in order and only fill gaps: the artifact's own
/// entries, then the Maven POM of a resolved coordinate, then the
/// descriptor's license declarations.
pub struct EvidenceExtractor<'a, C: ContentSource + ?Sized> {
    content: &'a C,
    cancel: &'a CancellationToken,
    registry: &'a LicenseRegistry,
}

impl<'a, C: ContentSource + ?Sized> EvidenceExtractor<'a, C> {
    pub fn new(content: &'a C, cancel: &'a CancellationToken, registry: &'a LicenseRegistry) -> Self {
        Self {
            content,
            cancel,
            registry,
        }
    }

    pub async fn extract(
        &self,
        descriptor: &ComponentDescriptor,
        coordinate: Option<&MavenCoordinate>,
        bytes: &[u8],
    ) -> Result<Evidence> {
        let mut evidence = Evidence::default();

        if ArchiveInspector::is_zip(bytes) {
            self.inspect_archive(bytes, &mut evidence)
                .with_context(|| format!("Failed to inspect archive of {}", descriptor.component_id()))?;
            self.add_issue_trackers(&mut evidence).await?;
        }

        if let Some(coordinate) = coordinate.filter(|c| !c.is_snapshot() && !c.is_sources()) {
            self.inspect_remote_pom(coordinate, &mut evidence).await?;
        }

        for location in descriptor.license_locations() {
            if !location.starts_with('%') {
                evidence.licenses.put(location.as_str(), None);
            }
        }

        Ok(evidence)
    }

    /// Walks the archive entries in order.
    pub fn inspect_archive(&self, bytes: &[u8], evidence: &mut Evidence) -> Result<()> {
        ArchiveInspector::for_each_entry(bytes, |name, content| {
            let text = String::from_utf8_lossy(content);
            if name == "META-INF/MANIFEST.MF" {
                self.inspect_manifest(&Manifest::parse(&text), evidence);
            } else if MAVEN_POM.is_match(name) {
                self.inspect_pom(&text, evidence);
            } else if name == "about.html" {
                inspect_about(&text, evidence);
            } else if let Some(license) = LicenseEvidencePolicy::license_for_file_name(name) {
                evidence.licenses.put_known(license);
            } else if META_INF_FILE.is_match(name) {
                if !SIGNATURE_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)) {
                    self.inspect_license_text(&text, evidence);
                }
            } else if BUNDLE_PROPERTIES.is_match(name) || LICENSE_FILE.is_match(name) {
                self.inspect_license_text(&text, evidence);
            }
            Ok(())
        })
    }

    fn inspect_manifest(&self, manifest: &Manifest, evidence: &mut Evidence) {
        if let Some(header) = manifest.get("Bundle-License") {
            self.inspect_bundle_license(header, evidence);
        }

        if let Some(doc_url) = manifest.get("Bundle-DocURL") {
            if doc_url.starts_with("http") {
                evidence.references.add(ExternalReferenceType::Website, doc_url);
            }
        }

        if let Some(header) = manifest.get("Bundle-SCM") {
            let values = parse_key_values(header);
            let value = |key: &str| {
                values
                    .iter()
                    .find(|(k, _)| k == key)
                    .map(|(_, v)| v.replace('"', ""))
                    .filter(|v| !v.is_empty())
            };
            if let Some(connection) = value("connection") {
                let reference = match value("tag") {
                    Some(tag) => format!("{}?tag={}", connection, tag),
                    None => connection.clone(),
                };
                evidence.references.add(ExternalReferenceType::Vcs, reference);
                evidence.add_forge_candidate(&connection);
            }
        }

        if let Some(header) = manifest.get("Eclipse-SourceReferences") {
            for clause in parse_header(header) {
                let query = clause
                    .attributes
                    .iter()
                    .map(|(key, value)| format!("{}={}", key, encode_query_parameter(value)))
                    .collect::<Vec<_>>()
                    .join("&");
                let reference = if query.is_empty() {
                    clause.value.clone()
                } else {
                    format!("{}?{}", clause.value, query)
                };
                evidence.references.add(ExternalReferenceType::Vcs, reference);
                evidence.add_forge_candidate(&clause.value);
            }
        }
    }

    fn inspect_bundle_license(&self, header: &str, evidence: &mut Evidence) {
        if let Some(license) = LicenseEvidencePolicy::bundle_license_shortcut(header) {
            evidence.licenses.put_known(license);
            return;
        }

        let header = LicenseEvidencePolicy::normalize_bundle_license(header);
        for clause in parse_header(header) {
            if let Some(link) = clause.attribute("link") {
                for url in LicenseEvidencePolicy::split_urls(link) {
                    evidence.licenses.put(url, Some(clause.value.clone()));
                }
                continue;
            }

            let value = LicenseEvidencePolicy::normalize_license_location(&clause.value);
            if value.starts_with("http") {
                evidence.licenses.put(value, None);
            } else if let Some(url) = self.registry.lookup(&value) {
                evidence.licenses.put(url, Some(value));
            } else {
                tracing::warn!(license = %value, "Unresolved Bundle-License");
            }
        }
    }

    /// Reads license and provenance references from a POM document.
    ///
    /// Element names match by local name regardless of namespace. A
    /// document that does not parse contributes nothing.
    pub fn inspect_pom(&self, text: &str, evidence: &mut Evidence) {
        let options = roxmltree::ParsingOptions {
            allow_dtd: true,
            ..Default::default()
        };
        let document = match roxmltree::Document::parse_with_options(text, options) {
            Ok(document) => document,
            Err(e) => {
                tracing::warn!(error = %e, "Unparseable POM");
                return;
            }
        };

        for element in elements(&document, "license") {
            let name = descendant_text(element, "name");
            let url = match descendant_text(element, "url") {
                Some(url) => url,
                None => match &name {
                    Some(name) => self
                        .registry
                        .lookup(name)
                        .map(str::to_string)
                        .unwrap_or_else(|| name.clone()),
                    None => continue,
                },
            };
            for part in LicenseEvidencePolicy::split_urls(&url) {
                evidence.licenses.put(part, name.clone());
            }
        }

        for scm in elements(&document, "scm") {
            if let Some(url) = descendant_text(scm, "connection")
                .or_else(|| descendant_text(scm, "developerConnection"))
                .or_else(|| descendant_text(scm, "url"))
            {
                evidence.references.add(ExternalReferenceType::Vcs, url);
            }
        }

        for issues in elements(&document, "issueManagement") {
            if let Some(url) = descendant_text(issues, "url") {
                evidence.references.add(ExternalReferenceType::IssueTracker, url);
            }
        }

        for project in elements(&document, "project") {
            if let Some(url) = child_text(project, "url").filter(|url| url.starts_with("http")) {
                evidence.references.add(ExternalReferenceType::Website, url);
            }
        }

        for list in elements(&document, "mailingList") {
            match descendant_text(list, "archive").or_else(|| descendant_text(list, "post")) {
                Some(url) => evidence.references.add(ExternalReferenceType::MailingList, url),
                None => tracing::debug!("Mailing list without archive or post address"),
            }
        }

        for repository in elements(&document, "repository") {
            let distribution = repository
                .parent_element()
                .is_some_and(|parent| parent.tag_name().name() == "distributionManagement");
            if distribution {
                if let Some(url) = descendant_text(repository, "url") {
                    evidence.references.add(ExternalReferenceType::Distribution, url);
                }
            }
        }
    }

    fn inspect_license_text(&self, text: &str, evidence: &mut Evidence) {
        if let Some(license) = LicenseEvidencePolicy::fingerprint(text) {
            evidence.licenses.put_known(license);
            return;
        }

        for expression in LicenseEvidencePolicy::spdx_expressions(text) {
            if let Some(url) = self.registry.lookup(&expression) {
                evidence.licenses.put(url, Some(expression));
                continue;
            }
            let parts = LicenseEvidencePolicy::split_expression(&expression);
            if parts.len() < 2 {
                tracing::warn!(expression = %expression, "Unresolved SPDX-License-Identifier");
                continue;
            }
            for part in parts {
                match self.registry.lookup(&part) {
                    Some(url) => evidence.licenses.put(url, Some(expression.clone())),
                    None => tracing::warn!(
                        expression = %expression,
                        part = %part,
                        "Unresolved SPDX-License-Identifier part"
                    ),
                }
            }
        }
    }

    async fn inspect_remote_pom(
        &self,
        coordinate: &MavenCoordinate,
        evidence: &mut Evidence,
    ) -> Result<()> {
        match self.content.fetch_text(&coordinate.pom_uri(), self.cancel).await {
            Ok(pom) => {
                self.inspect_pom(&pom, evidence);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                tracing::debug!(coordinate = %coordinate, "No Maven POM");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn add_issue_trackers(&self, evidence: &mut Evidence) -> Result<()> {
        for repository in std::mem::take(&mut evidence.forge_repositories) {
            let issues = format!("https://github.com/{}/issues", repository);
            if self.content.exists(&issues, self.cancel).await? {
                evidence
                    .references
                    .add(ExternalReferenceType::IssueTracker, issues);
            }
        }
        Ok(())
    }
}

fn inspect_about(text: &str, evidence: &mut Evidence) {
    let (accepted, rejected) = LicenseEvidencePolicy::about_references(text);
    for url in &accepted {
        evidence.licenses.put(url.as_str(), None);
    }
    evidence.accepted_urls.extend(accepted);
    evidence.rejected_urls.extend(rejected);
    for (url, name) in LicenseEvidencePolicy::about_markers(text) {
        evidence.licenses.put(url, Some(name.to_string()));
    }
}

fn elements<'a, 'input>(
    document: &'a roxmltree::Document<'input>,
    name: &'a str,
) -> impl Iterator<Item = roxmltree::Node<'a, 'input>> + 'a {
    document
        .descendants()
        .filter(move |node| node.is_element() && node.tag_name().name() == name)
}

/// Trimmed text of the first descendant element named `name`.
fn descendant_text(node: roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    node.descendants()
        .skip(1)
        .find(|n| n.is_element() && n.tag_name().name() == name)
        .map(text_content)
        .filter(|text| !text.is_empty())
}

fn child_text(node: roxmltree::Node<'_, '_>, name: &str) -> Option<String> {
    node.children()
        .find(|n| n.is_element() && n.tag_name().name() == name)
        .map(text_content)
        .filter(|text| !text.is_empty())
}

fn text_content(node: roxmltree::Node<'_, '_>) -> String {
    node.descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect::<String>()
        .trim()
        .to_string()
}
