use crate::adapters::outbound::filesystem::{FileSystemWriter, StdoutPresenter};
use crate::application::dto::{OutputFormat, OutputTarget, SbomRequest};
use crate::ports::outbound::OutputPresenter;
use std::path::PathBuf;

/// Destination of one serialized document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenterType {
    Stdout,
    File(PathBuf),
}

impl From<&OutputTarget> for PresenterType {
    fn from(target: &OutputTarget) -> Self {
        match &target.path {
            Some(path) => PresenterType::File(path.clone()),
            None => PresenterType::Stdout,
        }
    }
}

/// Factory choosing the presenter for each requested output
///
/// The request decides the outputs: XML and JSON each go to a file, to
/// stdout, or both, and XML goes to stdout when nothing was asked for.
pub struct PresenterFactory;

impl PresenterFactory {
    /// # Examples
    /// ```
    /// use p2_sbom::application::factories::{PresenterFactory, PresenterType};
    ///
    /// let presenter = PresenterFactory::create(PresenterType::Stdout);
    /// ```
    pub fn create(presenter_type: PresenterType) -> Box<dyn OutputPresenter> {
        match presenter_type {
            PresenterType::Stdout => Box::new(StdoutPresenter::new()),
            PresenterType::File(path) => Box::new(FileSystemWriter::new(path)),
        }
    }

    /// Format and destination of every output the request asks for, in writing order
    pub fn routes(request: &SbomRequest) -> Vec<(OutputFormat, PresenterType)> {
        request
            .output_targets()
            .iter()
            .map(|target| (target.format, PresenterType::from(target)))
            .collect()
    }

    pub fn for_target(target: &OutputTarget) -> Box<dyn OutputPresenter> {
        Self::create(PresenterType::from(target))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use crate::application::dto::SbomRequestBuilder;
    use tempfile::TempDir;

    fn request() -> SbomRequestBuilder {
        SbomRequest::builder().snapshot_path(PathBuf::from("repository.json"))
    }

    #[test]
    fn test_default_route_is_xml_on_stdout() {
        let routes = PresenterFactory::routes(&request().build().unwrap());

        assert_eq!(routes, vec![(OutputFormat::Xml, PresenterType::Stdout)]);
    }

    #[test]
    fn test_json_stdout_alone_suppresses_default_xml() {
        let routes = PresenterFactory::routes(&request().json_stdout(true).build().unwrap());

        assert_eq!(routes, vec![(OutputFormat::Json, PresenterType::Stdout)]);
    }

    #[test]
    fn test_file_outputs_route_to_files() {
        let dir = TempDir::new().unwrap();
        let xml = dir.path().join("sbom.xml");
        let json = dir.path().join("sbom.json");

        let routes = PresenterFactory::routes(
            &request()
                .xml_output(Some(xml.clone()))
                .json_output(Some(json.clone()))
                .build()
                .unwrap(),
        );

        assert_eq!(
            routes,
            vec![
                (OutputFormat::Xml, PresenterType::File(xml)),
                (OutputFormat::Json, PresenterType::File(json)),
            ]
        );
    }

    #[test]
    fn test_file_and_stdout_for_one_format() {
        let dir = TempDir::new().unwrap();
        let xml = dir.path().join("sbom.xml");

        let routes = PresenterFactory::routes(
            &request()
                .xml_output(Some(xml.clone()))
                .xml_stdout(true)
                .build()
                .unwrap(),
        );

        assert_eq!(
            routes,
            vec![
                (OutputFormat::Xml, PresenterType::File(xml)),
                (OutputFormat::Xml, PresenterType::Stdout),
            ]
        );
    }

    #[test]
    fn test_file_target_presenter_writes_the_document() {
        let dir = TempDir::new().unwrap();
        let json = dir.path().join("out").join("sbom.json");
        let request = request().json_output(Some(json.clone())).build().unwrap();

        let targets = request.output_targets();
        assert_eq!(targets.len(), 1);
        PresenterFactory::for_target(&targets[0])
            .present("{\"bomFormat\":\"CycloneDX\"}")
            .unwrap();

        assert_eq!(
            fs::read_to_string(&json).unwrap(),
            "{\"bomFormat\":\"CycloneDX\"}"
        );
    }
}
