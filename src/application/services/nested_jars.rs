use super::coordinate_resolver::CoordinateResolver;
use crate::ports::outbound::ContentSource;
use crate::sbom_generation::domain::artifact::BUNDLE_CLASSIFIER;
use crate::sbom_generation::domain::{
    ArtifactDescriptor, Component, ComponentType, MavenCoordinate, Scope,
};
use crate::sbom_generation::services::{
    ArchiveEntries, ArchiveInspector, DigestCalculator, Manifest,
};
use crate::shared::Result;
use anyhow::Context;

/// Adds a sub-component for every jar named by the bundle's `Bundle-ClassPath`.
///
/// Sub-components are identified as `<parent bomRef>^<path>`. A Maven identity
/// is looked up by file name, then a sibling `.pom` entry, then the jar's own
/// content; a verified identity names the sub-component after the Maven
/// artifact, otherwise the path is the name.
pub async fn add_nested_jars<C: ContentSource + ?Sized>(
    resolver: &CoordinateResolver<'_, C>,
    component: &mut Component,
    artifact: &ArtifactDescriptor,
    bytes: &[u8],
) -> Result<()> {
    if artifact.is_metadata()
        || artifact.key().classifier() != BUNDLE_CLASSIFIER
        || !ArchiveInspector::is_zip(bytes)
    {
        return Ok(());
    }

    let entries = ArchiveInspector::entries(bytes)
        .with_context(|| format!("Failed to read nested jars of {}", component.bom_ref))?;
    let Some(manifest) = entries.get("META-INF/MANIFEST.MF") else {
        return Ok(());
    };
    let paths = Manifest::parse(&String::from_utf8_lossy(manifest)).nested_jar_paths();

    for (path, jar) in entries.iter().filter(|(name, _)| paths.contains(name)) {
        let coordinate = match resolver.from_jar_name(path).await? {
            Some(coordinate) => Some(coordinate),
            None => match sibling_pom_coordinate(&entries, path) {
                Some(coordinate) => Some(coordinate),
                None => resolver.from_bytes(jar).await?,
            },
        };

        let mut nested = Component::new(ComponentType::Library, path.as_str());
        nested.bom_ref = format!("{}^{}", component.bom_ref, path);
        match coordinate {
            Some(coordinate) => {
                if resolver.verify(&mut nested, &coordinate, jar).await? {
                    nested.name = coordinate.artifact_id().to_string();
                    nested.group = Some(coordinate.group_id().to_string());
                }
            }
            None => nested.scope = Some(Scope::Required),
        }
        nested.hashes = DigestCalculator::compute_all(jar);
        component.components.push(nested);
    }
    Ok(())
}

fn sibling_pom_coordinate(
    entries: &ArchiveEntries,
    jar_path: &str,
) -> Option<MavenCoordinate> {
    let pom_path = format!("{}.pom", jar_path.strip_suffix(".jar")?);
    let pom = entries.get(&pom_path)?;
    match MavenCoordinate::from_pom(&String::from_utf8_lossy(pom)) {
        Ok(coordinate) => coordinate,
        Err(e) => {
            tracing::warn!(path = %pom_path, error = %e, "Unparseable nested POM");
            None
        }
    }
}
