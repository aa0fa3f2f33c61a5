use crate::application::read_models::{ComponentView, SbomReadModel};
use crate::ports::outbound::SbomFormatter;
use crate::shared::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use super::{DATA_TYPE, SPEC_VERSION};

/// Thin element-level helper over the quick-xml event writer
struct XmlWriter {
    writer: Writer<Vec<u8>>,
}

impl XmlWriter {
    fn new() -> Self {
        Self {
            writer: Writer::new_with_indent(Vec::new(), b' ', 2),
        }
    }

    fn declaration(&mut self) -> Result<()> {
        self.writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
        Ok(())
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let element = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.writer.write_event(Event::Start(element))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let element = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.writer.write_event(Event::Empty(element))?;
        Ok(())
    }

    fn text_element(&mut self, name: &str, attributes: &[(&str, &str)], text: &str) -> Result<()> {
        self.start(name, attributes)?;
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        self.end(name)
    }

    fn optional(&mut self, name: &str, text: Option<&str>) -> Result<()> {
        match text {
            Some(text) => self.text_element(name, &[], text),
            None => Ok(()),
        }
    }

    fn into_string(self) -> Result<String> {
        Ok(String::from_utf8(self.writer.into_inner())?)
    }
}

/// CycloneDxXmlFormatter adapter for generating CycloneDX 1.6 XML
///
/// Elements are written in schema order. Multi-line values keep their
/// line breaks and indentation verbatim.
pub struct CycloneDxXmlFormatter;

impl CycloneDxXmlFormatter {
    pub fn new() -> Self {
        Self
    }

    fn write_metadata(xml: &mut XmlWriter, model: &SbomReadModel) -> Result<()> {
        let metadata = &model.metadata;
        xml.start("metadata", &[])?;
        xml.text_element("timestamp", &[], &metadata.timestamp)?;
        xml.start("tools", &[])?;
        xml.start("components", &[])?;
        xml.start("component", &[("type", metadata.tool_type.as_str())])?;
        xml.text_element("name", &[], &metadata.tool_name)?;
        xml.text_element("version", &[], &metadata.tool_version)?;
        xml.end("component")?;
        xml.end("components")?;
        xml.end("tools")?;
        xml.end("metadata")
    }

    fn write_component(xml: &mut XmlWriter, component: &ComponentView) -> Result<()> {
        xml.start(
            "component",
            &[
                ("type", component.component_type.as_str()),
                ("bom-ref", component.bom_ref.as_str()),
            ],
        )?;
        xml.optional("publisher", component.publisher.as_deref())?;
        xml.optional("group", component.group.as_deref())?;
        xml.text_element("name", &[], &component.name)?;
        xml.optional("version", component.version.as_deref())?;
        xml.optional("description", component.description.as_deref())?;
        xml.optional("scope", component.scope.as_deref())?;

        if !component.hashes.is_empty() {
            xml.start("hashes", &[])?;
            for hash in &component.hashes {
                xml.text_element("hash", &[("alg", hash.algorithm.as_str())], &hash.value)?;
            }
            xml.end("hashes")?;
        }

        if !component.licenses.is_empty() {
            xml.start("licenses", &[])?;
            for license in &component.licenses {
                xml.start("license", &[])?;
                xml.optional("id", license.id.as_deref())?;
                xml.optional("name", license.name.as_deref())?;
                xml.text_element("url", &[], &license.url)?;
                xml.end("license")?;
            }
            xml.end("licenses")?;
        }

        xml.optional("purl", component.purl.as_deref())?;

        if let Some(pedigree) = &component.pedigree {
            xml.start("pedigree", &[])?;
            xml.start("ancestors", &[])?;
            for ancestor in &pedigree.ancestors {
                Self::write_component(xml, ancestor)?;
            }
            xml.end("ancestors")?;
            xml.text_element("notes", &[], &pedigree.notes)?;
            xml.end("pedigree")?;
        }

        if !component.external_references.is_empty() {
            xml.start("externalReferences", &[])?;
            for reference in &component.external_references {
                xml.start("reference", &[("type", reference.reference_type.as_str())])?;
                xml.text_element("url", &[], &reference.url)?;
                xml.end("reference")?;
            }
            xml.end("externalReferences")?;
        }

        if !component.properties.is_empty() {
            xml.start("properties", &[])?;
            for property in &component.properties {
                xml.text_element("property", &[("name", property.name.as_str())], &property.value)?;
            }
            xml.end("properties")?;
        }

        if !component.components.is_empty() {
            xml.start("components", &[])?;
            for nested in &component.components {
                Self::write_component(xml, nested)?;
            }
            xml.end("components")?;
        }

        if !component.data.is_empty() {
            for data in &component.data {
                xml.start("data", &[])?;
                xml.text_element("type", &[], DATA_TYPE)?;
                xml.text_element("name", &[], &data.name)?;
                xml.start("contents", &[])?;
                xml.text_element(
                    "attachment",
                    &[("content-type", data.content_type.as_str())],
                    &data.text,
                )?;
                xml.end("contents")?;
                xml.end("data")?;
            }
        }

        xml.end("component")
    }

    fn write_dependencies(xml: &mut XmlWriter, model: &SbomReadModel) -> Result<()> {
        xml.start("dependencies", &[])?;
        for dependency in &model.dependencies {
            if dependency.depends_on.is_empty() {
                xml.empty("dependency", &[("ref", dependency.bom_ref.as_str())])?;
                continue;
            }
            xml.start("dependency", &[("ref", dependency.bom_ref.as_str())])?;
            for target in &dependency.depends_on {
                xml.empty("dependency", &[("ref", target.as_str())])?;
            }
            xml.end("dependency")?;
        }
        xml.end("dependencies")
    }
}

impl Default for CycloneDxXmlFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl SbomFormatter for CycloneDxXmlFormatter {
    fn format(&self, model: &SbomReadModel) -> Result<String> {
        let namespace = format!("http://cyclonedx.org/schema/bom/{}", SPEC_VERSION);
        let mut xml = XmlWriter::new();
        xml.declaration()?;
        xml.start(
            "bom",
            &[
                ("xmlns", namespace.as_str()),
                ("serialNumber", model.metadata.serial_number.as_str()),
                ("version", "1"),
            ],
        )?;

        Self::write_metadata(&mut xml, model)?;

        xml.start("components", &[])?;
        for component in &model.components {
            Self::write_component(&mut xml, component)?;
        }
        xml.end("components")?;

        Self::write_dependencies(&mut xml, model)?;

        if !model.annotations.is_empty() {
            xml.start("annotations", &[])?;
            for annotation in &model.annotations {
                xml.start("annotation", &[])?;
                xml.text_element("text", &[], &annotation.text)?;
                xml.end("annotation")?;
            }
            xml.end("annotations")?;
        }

        xml.end("bom")?;
        let mut document = xml.into_string()?;
        document.push('\n');
        Ok(document)
    }
}
