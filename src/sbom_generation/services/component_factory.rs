use crate::sbom_generation::domain::component_descriptor::property_keys;
use crate::sbom_generation::domain::{
    ArtifactDescriptor, ArtifactKey, Component, ComponentData, ComponentDescriptor, ComponentType,
    ExternalReferenceType, Scope, Touchpoint,
};
use quick_xml::escape::escape;

/// Separates a component's display name from its description.
const ZERO_WIDTH_SPACE: char = '\u{200B}';

/// Property names that are reflected elsewhere in the component or are noise.
const EXCLUDED_PROPERTIES: &[&str] = &[
    property_keys::NAME,
    property_keys::TYPE_GROUP,
    property_keys::TYPE_FRAGMENT,
    property_keys::TYPE_PRODUCT,
    property_keys::BUNDLE_LOCALIZATION,
    property_keys::DESCRIPTION,
    property_keys::DESCRIPTION_URL,
    property_keys::CONTACT,
    property_keys::PROVIDER,
    property_keys::DOC_URL,
    "org.eclipse.justj.model",
    "org.eclipse.update.feature.plugin",
    "pgp.trustedPublicKeys",
    "org.eclipse.update.feature.exclusive",
    "org.eclipse.oomph.p2.iu.compatibility",
];

fn is_reported_property(key: &str, value: &str) -> bool {
    !key.starts_with("df_LT")
        && !key.ends_with(".pluginName")
        && !key.ends_with(".providerName")
        && !key.starts_with("maven-")
        && !key.starts_with("iplog.")
        && !EXCLUDED_PROPERTIES.contains(&key)
        && !value.starts_with('%')
}

/// Percent-encodes a query parameter, leaving `/`, `:` and `!` readable.
pub fn encode_query_parameter(value: &str) -> String {
    urlencoding::encode(value)
        .replace("%2F", "/")
        .replace("%3A", ":")
        .replace("%21", "!")
}

/// Builds components from p2 metadata without any I/O.
pub struct ComponentFactory;

impl ComponentFactory {
    /// Creates the component for a descriptor: identity, description, publisher,
    /// website references, reported properties and the rendered touchpoint.
    pub fn create(descriptor: &ComponentDescriptor) -> Component {
        let mut component = Component::new(ComponentType::Library, descriptor.id());
        component.version = Some(descriptor.version().to_string());
        component.scope = Some(Scope::Required);

        let name = descriptor.property(property_keys::NAME);
        component.description = match (name, descriptor.property(property_keys::DESCRIPTION)) {
            (name, Some(description)) => Some(match name {
                Some(name) => format!("{} - {}{}", name, ZERO_WIDTH_SPACE, description),
                None => String::new(),
            }),
            (Some(name), None) => Some(name.to_string()),
            (None, None) => None,
        };
        component.publisher = descriptor
            .property(property_keys::PROVIDER)
            .map(str::to_string);

        for key in [property_keys::DOC_URL, property_keys::DESCRIPTION_URL] {
            if let Some(url) = descriptor.property(key).filter(|u| u.starts_with("http")) {
                component.add_external_reference(ExternalReferenceType::Website, url);
            }
        }

        for (key, value) in descriptor.properties() {
            if is_reported_property(key, value) {
                component.add_property(key.as_str(), value.as_str());
            }
        }

        if let Some(rendered) = descriptor.touchpoint().and_then(Self::render_touchpoint) {
            component.add_property("touchpoint", rendered.clone());
            component.data.push(ComponentData {
                name: "touchpoint".to_string(),
                content_type: "application/xml".to_string(),
                text: rendered,
            });
        }

        component
    }

    /// `metadata/<id>_<version>` for metadata artifacts, else the repository-relative path.
    pub fn bom_ref(artifact: &ArtifactDescriptor) -> String {
        let key = artifact.key();
        if artifact.is_metadata() {
            format!("metadata/{}_{}", key.id(), key.version())
        } else {
            artifact.path().to_string()
        }
    }

    /// Value of the `missing-artifact` property for a metadata-only component, if any.
    pub fn missing_artifact(descriptor: &ComponentDescriptor, expected_missing: bool) -> Option<String> {
        if expected_missing {
            return None;
        }
        if let Some(feature) = descriptor.id().strip_suffix(".feature.group") {
            return Some(format!(
                "org.eclipse.update.feature,{},{}",
                feature,
                descriptor.version()
            ));
        }
        if descriptor.artifacts().is_empty() {
            return None;
        }
        Some(
            descriptor
                .artifacts()
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(";"),
        )
    }

    /// Fallback package URL in the p2 namespace.
    pub fn p2_purl(key: &ArtifactKey, location: &str) -> String {
        format!(
            "pkg:p2/{}@{}?classifier={}&repository_url={}",
            key.id(),
            key.version(),
            key.classifier(),
            encode_query_parameter(location)
        )
    }

    /// Renders installation instructions as a small XML fragment.
    ///
    /// Returns `None` for the null touchpoint, native touchpoints without data,
    /// and OSGi touchpoints left empty once `manifest`/`zipped` are dropped.
    pub fn render_touchpoint(touchpoint: &Touchpoint) -> Option<String> {
        if touchpoint.id == Touchpoint::NONE {
            return None;
        }
        let data: Vec<Vec<(&str, &str)>> = touchpoint
            .data
            .iter()
            .map(|item| {
                item.iter()
                    .filter(|(key, _)| {
                        touchpoint.id != Touchpoint::OSGI
                            || (key.as_str() != "manifest" && key.as_str() != "zipped")
                    })
                    .map(|(key, value)| (key.as_str(), value.as_str()))
                    .collect::<Vec<_>>()
            })
            .filter(|item| touchpoint.id != Touchpoint::OSGI || !item.is_empty())
            .collect();
        if data.is_empty() && (touchpoint.id == Touchpoint::OSGI || touchpoint.id == Touchpoint::NATIVE)
        {
            return None;
        }

        let mut out = String::from("<unit>\n");
        out.push_str(&format!(
            "  <touchpoint id='{}' version='{}'/>\n",
            escape(touchpoint.id.as_str()),
            escape(touchpoint.version.as_str())
        ));
        if !data.is_empty() {
            out.push_str("  <touchpointData>\n");
            for item in &data {
                out.push_str("    <instructions>\n");
                for (key, body) in item {
                    out.push_str(&format!("      <instruction key='{}'>\n", escape(*key)));
                    for statement in body.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                        out.push_str(&format!("        {};\n", escape(statement)));
                    }
                    out.push_str("      </instruction>\n");
                }
                out.push_str("    </instructions>\n");
            }
            out.push_str("  </touchpointData>\n");
        }
        out.push_str("</unit>");
        Some(out)
    }

    /// Copies licenses and external references from a binary component to its
    /// source counterpart when the source has none of its own.
    pub fn transfer_from_binary(source: &mut Component, binary: &Component) {
        if source.licenses.is_empty() {
            source.licenses = binary.licenses.clone();
        }
        if source.external_references.is_empty() {
            source.external_references = binary.external_references.clone();
        }
    }
}
