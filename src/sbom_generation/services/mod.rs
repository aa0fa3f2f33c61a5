mod archive;
mod component_factory;
mod digest;
mod manifest;
mod sbom_generator;

#[cfg(test)]
pub(crate) use archive::test_support;
pub use archive::{ArchiveEntries, ArchiveInspector, Equivalence};
pub use component_factory::{encode_query_parameter, ComponentFactory};
pub use digest::DigestCalculator;
pub use manifest::{parse_header, parse_key_values, HeaderClause, Manifest};
pub use sbom_generator::SbomGenerator;
