/// Outbound ports (Driven ports) - Infrastructure interfaces
///
/// These ports define the interfaces that the application core uses
/// to interact with external systems (repositories, network, file system, console).
pub mod content_source;
pub mod formatter;
pub mod http_transport;
pub mod metadata_repository;
pub mod output_presenter;
pub mod progress_reporter;

pub use content_source::ContentSource;
pub use formatter::SbomFormatter;
pub use http_transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
pub use metadata_repository::MetadataRepository;
pub use output_presenter::OutputPresenter;
pub use progress_reporter::ProgressReporter;
