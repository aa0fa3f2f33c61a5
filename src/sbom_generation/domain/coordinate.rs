use super::artifact::Properties;
use crate::shared::Result;
use std::fmt;

const MAVEN_CENTRAL: &str = "https://repo.maven.apache.org/maven2";
const CLEARLY_DEFINED_DEFINITIONS: &str =
    "https://api.clearlydefined.io/definitions/maven/mavencentral";

/// Maven identity of an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MavenCoordinate {
    group_id: String,
    artifact_id: String,
    version: String,
    classifier: Option<String>,
    packaging: String,
}

impl MavenCoordinate {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
        classifier: Option<String>,
        packaging: Option<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
            classifier: classifier.filter(|c| !c.trim().is_empty()),
            packaging: packaging
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| "jar".to_string()),
        }
    }

    /// Reads `maven-*` properties, falling back to `maven-wrapped-*`.
    pub fn from_properties(properties: &Properties) -> Option<Self> {
        let get = |name: &str| {
            properties
                .get(&format!("maven-{}", name))
                .or_else(|| properties.get(&format!("maven-wrapped-{}", name)))
                .cloned()
        };
        Some(Self::new(
            get("groupId")?,
            get("artifactId")?,
            get("version")?,
            get("classifier"),
            get("type"),
        ))
    }

    /// Reads a `pom.properties` file embedded under `META-INF/maven/`.
    pub fn from_pom_properties(text: &str) -> Option<Self> {
        let properties = parse_java_properties(text);
        Some(Self::new(
            properties.get("groupId")?.clone(),
            properties.get("artifactId")?.clone(),
            properties.get("version")?.clone(),
            None,
            None,
        ))
    }

    /// Reads the coordinate declared by a POM, inheriting the group from the parent.
    pub fn from_pom(text: &str) -> Result<Option<Self>> {
        let document = roxmltree::Document::parse(text)?;
        let project = document.root_element();
        let child_text = |parent: roxmltree::Node, name: &str| {
            parent
                .children()
                .find(|n| n.is_element() && n.tag_name().name() == name)
                .and_then(|n| n.text())
                .map(|t| t.trim().to_string())
        };
        let parent = project
            .children()
            .find(|n| n.is_element() && n.tag_name().name() == "parent");

        let group_id = child_text(project, "groupId")
            .or_else(|| parent.and_then(|p| child_text(p, "groupId")));
        let artifact_id = child_text(project, "artifactId");
        let version = child_text(project, "version");

        Ok(match (group_id, artifact_id, version) {
            (Some(g), Some(a), Some(v)) => Some(Self::new(g, a, v, None, None)),
            _ => None,
        })
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn classifier(&self) -> Option<&str> {
        self.classifier.as_deref()
    }

    pub fn packaging(&self) -> &str {
        &self.packaging
    }

    pub fn is_snapshot(&self) -> bool {
        self.version.ends_with("-SNAPSHOT")
    }

    pub fn is_sources(&self) -> bool {
        self.classifier.as_deref() == Some("sources")
    }

    fn base_uri(&self) -> String {
        format!(
            "{}/{}/{}/{}/{}-{}",
            MAVEN_CENTRAL,
            self.group_id.replace('.', "/"),
            self.artifact_id,
            self.version,
            self.artifact_id,
            self.version
        )
    }

    pub fn pom_uri(&self) -> String {
        format!("{}.pom", self.base_uri())
    }

    pub fn artifact_uri(&self) -> String {
        match &self.classifier {
            Some(classifier) => format!("{}-{}.{}", self.base_uri(), classifier, self.packaging),
            None => format!("{}.{}", self.base_uri(), self.packaging),
        }
    }

    pub fn clearly_defined_uri(&self) -> String {
        format!(
            "{}/{}/{}/{}",
            CLEARLY_DEFINED_DEFINITIONS, self.group_id, self.artifact_id, self.version
        )
    }

    /// Package URL in the Maven namespace.
    pub fn purl(&self) -> String {
        let mut qualifiers = Vec::new();
        if self.packaging != "jar" {
            qualifiers.push(format!("type={}", self.packaging));
        }
        if let Some(classifier) = &self.classifier {
            qualifiers.push(format!("classifier={}", classifier));
        }
        let mut purl = format!(
            "pkg:maven/{}/{}@{}",
            self.group_id, self.artifact_id, self.version
        );
        if !qualifiers.is_empty() {
            purl.push('?');
            purl.push_str(&qualifiers.join("&"));
        }
        purl
    }
}

impl fmt::Display for MavenCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)?;
        if let Some(classifier) = &self.classifier {
            write!(f, ":{}", classifier)?;
        }
        if self.packaging != "jar" {
            write!(f, "@{}", self.packaging)?;
        }
        Ok(())
    }
}

/// Minimal `java.util.Properties` reader: `key=value` or `key: value`, `#`/`!` comments.
pub fn parse_java_properties(text: &str) -> Properties {
    let mut properties = Properties::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let separator = line.find(['=', ':']);
        let (key, value) = match separator {
            Some(index) => (&line[..index], &line[index + 1..]),
            None => (line, ""),
        };
        properties.insert(key.trim().to_string(), value.trim().to_string());
    }
    properties
}
