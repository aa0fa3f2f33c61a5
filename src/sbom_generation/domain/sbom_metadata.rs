use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

/// The application recorded under `metadata.tools.components`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolComponent {
    name: String,
    version: String,
}

impl ToolComponent {
    /// CycloneDX component type of a producing tool.
    pub const COMPONENT_TYPE: &'static str = "application";

    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }

    /// This binary, named and versioned from Cargo.toml.
    pub fn current() -> Self {
        Self::new(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn component_type(&self) -> &'static str {
        Self::COMPONENT_TYPE
    }
}

/// Document-level metadata of one generated SBOM.
///
/// The serial number identifies the document instance, so two runs over the
/// same repository still produce distinct serial numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SbomMetadata {
    tool: ToolComponent,
    timestamp: DateTime<Utc>,
    serial_number: Uuid,
}

impl SbomMetadata {
    pub fn new(tool: ToolComponent, timestamp: DateTime<Utc>, serial_number: Uuid) -> Self {
        Self {
            tool,
            timestamp,
            serial_number,
        }
    }

    pub fn tool(&self) -> &ToolComponent {
        &self.tool
    }

    pub fn tool_name(&self) -> &str {
        self.tool.name()
    }

    pub fn tool_version(&self) -> &str {
        self.tool.version()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// RFC 3339 creation time in UTC, whole seconds.
    pub fn timestamp(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    pub fn serial_uuid(&self) -> Uuid {
        self.serial_number
    }

    /// `urn:uuid:<uuid>` form written to the document.
    pub fn serial_number(&self) -> String {
        format!("urn:uuid:{}", self.serial_number)
    }
}
