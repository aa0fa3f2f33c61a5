use crate::application::read_models::{
    ComponentView, DataView, DependencyView, SbomMetadataView, SbomReadModel,
};
use crate::ports::outbound::SbomFormatter;
use crate::shared::Result;
use regex::{Captures, Regex};
use serde::Serialize;
use std::borrow::Cow;
use std::sync::LazyLock;

use super::{DATA_TYPE, SPEC_VERSION};

/// Line breaks followed by indentation inside multi-line values.
static INDENTED_LINE_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("\n( *)").expect("valid line break pattern"));

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Bom<'a> {
    bom_format: &'static str,
    spec_version: &'static str,
    serial_number: &'a str,
    version: u32,
    metadata: Metadata<'a>,
    components: Vec<Component<'a>>,
    dependencies: Vec<Dependency<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    annotations: Vec<Annotation<'a>>,
}

#[derive(Debug, Serialize)]
struct Metadata<'a> {
    timestamp: &'a str,
    tools: Tools<'a>,
}

#[derive(Debug, Serialize)]
struct Tools<'a> {
    components: Vec<Tool<'a>>,
}

#[derive(Debug, Serialize)]
struct Tool<'a> {
    #[serde(rename = "type")]
    tool_type: &'a str,
    name: &'a str,
    version: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Component<'a> {
    #[serde(rename = "type")]
    component_type: &'a str,
    #[serde(rename = "bom-ref")]
    bom_ref: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    publisher: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group: Option<&'a str>,
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scope: Option<&'a str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    hashes: Vec<Hash<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    licenses: Vec<License<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    purl: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pedigree: Option<Pedigree<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    external_references: Vec<ExternalReference<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    properties: Vec<Property<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    components: Vec<Component<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    data: Vec<Data<'a>>,
}

#[derive(Debug, Serialize)]
struct Hash<'a> {
    alg: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct License<'a> {
    license: LicenseContent<'a>,
}

#[derive(Debug, Serialize)]
struct LicenseContent<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct Pedigree<'a> {
    ancestors: Vec<Component<'a>>,
    notes: &'a str,
}

#[derive(Debug, Serialize)]
struct ExternalReference<'a> {
    #[serde(rename = "type")]
    reference_type: &'a str,
    url: &'a str,
}

#[derive(Debug, Serialize)]
struct Property<'a> {
    name: &'a str,
    value: Cow<'a, str>,
}

#[derive(Debug, Serialize)]
struct Data<'a> {
    #[serde(rename = "type")]
    data_type: &'static str,
    name: &'a str,
    contents: DataContents<'a>,
}

#[derive(Debug, Serialize)]
struct DataContents<'a> {
    attachment: Attachment<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Attachment<'a> {
    content_type: &'a str,
    content: Cow<'a, str>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Dependency<'a> {
    #[serde(rename = "ref")]
    bom_ref: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    depends_on: Vec<&'a str>,
}

#[derive(Debug, Serialize)]
struct Annotation<'a> {
    text: &'a str,
}

/// Encodes indented line breaks as character references.
///
/// JSON consumers collapse whitespace in these values, so the layout of
/// touchpoint renderings is kept as `&#x0A;` plus one `&#x20;` per space.
fn encode_line_breaks(value: &str) -> Cow<'_, str> {
    INDENTED_LINE_BREAK.replace_all(value, |captures: &Captures| {
        format!("&#x0A;{}", "&#x20;".repeat(captures[1].len()))
    })
}

/// CycloneDxJsonFormatter adapter for generating CycloneDX 1.6 JSON
///
/// A pure projection of the read model: the model is never modified.
pub struct CycloneDxJsonFormatter;

impl CycloneDxJsonFormatter {
    pub fn new() -> Self {
        Self
    }

    fn build_metadata(metadata: &SbomMetadataView) -> Metadata<'_> {
        Metadata {
            timestamp: &metadata.timestamp,
            tools: Tools {
                components: vec![Tool {
                    tool_type: &metadata.tool_type,
                    name: &metadata.tool_name,
                    version: &metadata.tool_version,
                }],
            },
        }
    }

    fn build_component(component: &ComponentView) -> Component<'_> {
        Component {
            component_type: &component.component_type,
            bom_ref: &component.bom_ref,
            publisher: component.publisher.as_deref(),
            group: component.group.as_deref(),
            name: &component.name,
            version: component.version.as_deref(),
            description: component.description.as_deref(),
            scope: component.scope.as_deref(),
            hashes: component
                .hashes
                .iter()
                .map(|h| Hash {
                    alg: &h.algorithm,
                    content: &h.value,
                })
                .collect(),
            licenses: component
                .licenses
                .iter()
                .map(|l| License {
                    license: LicenseContent {
                        id: l.id.as_deref(),
                        name: l.name.as_deref(),
                        url: &l.url,
                    },
                })
                .collect(),
            purl: component.purl.as_deref(),
            pedigree: component.pedigree.as_ref().map(|p| Pedigree {
                ancestors: p.ancestors.iter().map(Self::build_component).collect(),
                notes: &p.notes,
            }),
            external_references: component
                .external_references
                .iter()
                .map(|r| ExternalReference {
                    reference_type: &r.reference_type,
                    url: &r.url,
                })
                .collect(),
            properties: component
                .properties
                .iter()
                .map(|p| Property {
                    name: &p.name,
                    value: encode_line_breaks(&p.value),
                })
                .collect(),
            components: component
                .components
                .iter()
                .map(Self::build_component)
                .collect(),
            data: component.data.iter().map(Self::build_data).collect(),
        }
    }

    fn build_data(data: &DataView) -> Data<'_> {
        let content = if data.content_type == "application/xml" {
            encode_line_breaks(&data.text)
        } else {
            Cow::Borrowed(data.text.as_str())
        };
        Data {
            data_type: DATA_TYPE,
            name: &data.name,
            contents: DataContents {
                attachment: Attachment {
                    content_type: &data.content_type,
                    content,
                },
            },
        }
    }

    fn build_dependencies(dependencies: &[DependencyView]) -> Vec<Dependency<'_>> {
        dependencies
            .iter()
            .map(|d| Dependency {
                bom_ref: &d.bom_ref,
                depends_on: d.depends_on.iter().map(String::as_str).collect(),
            })
            .collect()
    }
}

impl Default for CycloneDxJsonFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl SbomFormatter for CycloneDxJsonFormatter {
    fn format(&self, model: &SbomReadModel) -> Result<String> {
        let bom = Bom {
            bom_format: "CycloneDX",
            spec_version: SPEC_VERSION,
            serial_number: &model.metadata.serial_number,
            version: 1,
            metadata: Self::build_metadata(&model.metadata),
            components: model.components.iter().map(Self::build_component).collect(),
            dependencies: Self::build_dependencies(&model.dependencies),
            annotations: model
                .annotations
                .iter()
                .map(|a| Annotation { text: &a.text })
                .collect(),
        };

        serde_json::to_string_pretty(&bom).map_err(Into::into)
    }
}
