//! Component view structs for read model
//!
//! These structs provide a flattened, serialization-ready view of component data.

/// View representation of a component, including nested sub-components
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentView {
    pub bom_ref: String,
    /// CycloneDX component type (`library`, `data`)
    pub component_type: String,
    pub name: String,
    pub group: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    pub publisher: Option<String>,
    pub scope: Option<String>,
    pub purl: Option<String>,
    pub hashes: Vec<HashView>,
    pub licenses: Vec<LicenseView>,
    pub pedigree: Option<PedigreeView>,
    pub external_references: Vec<ExternalReferenceView>,
    pub properties: Vec<PropertyView>,
    pub components: Vec<ComponentView>,
    pub data: Vec<DataView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashView {
    /// Algorithm name as written in the document, e.g. `SHA-256`
    pub algorithm: String,
    pub value: String,
}

/// View representation of license information; exactly one of `id` and `name` is set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LicenseView {
    pub id: Option<String>,
    pub name: Option<String>,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalReferenceView {
    pub reference_type: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyView {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PedigreeView {
    pub ancestors: Vec<ComponentView>,
    pub notes: String,
}

/// Configuration data attached to a component
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataView {
    pub name: String,
    pub content_type: String,
    pub text: String,
}
