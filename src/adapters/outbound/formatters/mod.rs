/// Formatter adapters for the CycloneDX serializations
mod cyclonedx_json;
mod cyclonedx_xml;

pub use cyclonedx_json::CycloneDxJsonFormatter;
pub use cyclonedx_xml::CycloneDxXmlFormatter;

/// CycloneDX specification version emitted by both formatters.
pub const SPEC_VERSION: &str = "1.6";

/// Component data type of touchpoint attachments.
const DATA_TYPE: &str = "configuration";
