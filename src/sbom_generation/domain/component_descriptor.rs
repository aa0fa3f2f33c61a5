use super::artifact::{ArtifactKey, Properties};
use super::requirement_filter::RequirementFilter;
use std::fmt;

/// Well-known p2 metadata property names.
pub mod property_keys {
    pub const NAME: &str = "org.eclipse.equinox.p2.name";
    pub const DESCRIPTION: &str = "org.eclipse.equinox.p2.description";
    pub const DESCRIPTION_URL: &str = "org.eclipse.equinox.p2.description.url";
    pub const PROVIDER: &str = "org.eclipse.equinox.p2.provider";
    pub const DOC_URL: &str = "org.eclipse.equinox.p2.doc.url";
    pub const CONTACT: &str = "org.eclipse.equinox.p2.contact";
    pub const BUNDLE_LOCALIZATION: &str = "org.eclipse.equinox.p2.bundle.localization";
    pub const TYPE_CATEGORY: &str = "org.eclipse.equinox.p2.type.category";
    pub const TYPE_GROUP: &str = "org.eclipse.equinox.p2.type.group";
    pub const TYPE_PRODUCT: &str = "org.eclipse.equinox.p2.type.product";
    pub const TYPE_FRAGMENT: &str = "org.eclipse.equinox.p2.type.fragment";
}

/// Identifier of the execution-environment pseudo component.
pub const EXECUTION_ENVIRONMENT_ID: &str = "a.jre.javase";

/// Identity of a component descriptor: (id, version).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId {
    pub id: String,
    pub version: String,
}

impl ComponentId {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.id, self.version)
    }
}

/// A requirement declared by a component descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Requirement {
    pub namespace: String,
    pub name: String,
    pub range: String,
    pub min: u32,
    pub filter: Option<RequirementFilter>,
}

impl Requirement {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>, range: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            range: range.into(),
            min: 1,
            filter: None,
        }
    }

    pub fn with_min(mut self, min: u32) -> Self {
        self.min = min;
        self
    }

    pub fn with_filter(mut self, filter: RequirementFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn is_optional(&self) -> bool {
        self.min == 0
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}; {} {}", self.namespace, self.name, self.range)?;
        if let Some(filter) = &self.filter {
            write!(f, " {}", filter)?;
        }
        Ok(())
    }
}

/// Installation instructions attached to a component.
///
/// Each data entry maps an instruction key (e.g. `configure`) to its body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Touchpoint {
    pub id: String,
    pub version: String,
    pub data: Vec<Properties>,
}

impl Touchpoint {
    pub const NATIVE: &'static str = "org.eclipse.equinox.p2.native";
    pub const OSGI: &'static str = "org.eclipse.equinox.p2.osgi";
    pub const NONE: &'static str = "null";
}

/// Installable-unit metadata read from a p2 repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentDescriptor {
    id: ComponentId,
    properties: Properties,
    requirements: Vec<Requirement>,
    artifacts: Vec<ArtifactKey>,
    touchpoint: Option<Touchpoint>,
    license_locations: Vec<String>,
}

impl ComponentDescriptor {
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            id: ComponentId::new(id, version),
            properties: Properties::new(),
            requirements: Vec::new(),
            artifacts: Vec::new(),
            touchpoint: None,
            license_locations: Vec::new(),
        }
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_properties(mut self, properties: Properties) -> Self {
        self.properties.extend(properties);
        self
    }

    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }

    pub fn with_artifact(mut self, key: ArtifactKey) -> Self {
        self.artifacts.push(key);
        self
    }

    pub fn with_touchpoint(mut self, touchpoint: Touchpoint) -> Self {
        self.touchpoint = Some(touchpoint);
        self
    }

    pub fn with_license_location(mut self, location: impl Into<String>) -> Self {
        self.license_locations.push(location.into());
        self
    }

    pub fn component_id(&self) -> &ComponentId {
        &self.id
    }

    pub fn id(&self) -> &str {
        &self.id.id
    }

    pub fn version(&self) -> &str {
        &self.id.version
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    pub fn artifacts(&self) -> &[ArtifactKey] {
        &self.artifacts
    }

    pub fn touchpoint(&self) -> Option<&Touchpoint> {
        self.touchpoint.as_ref()
    }

    pub fn license_locations(&self) -> &[String] {
        &self.license_locations
    }

    pub fn is_category(&self) -> bool {
        self.property(property_keys::TYPE_CATEGORY) == Some("true")
    }

    pub fn is_execution_environment(&self) -> bool {
        self.id() == EXECUTION_ENVIRONMENT_ID
    }
}
