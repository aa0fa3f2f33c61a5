/// Mock implementations for testing
mod mock_http_transport;
mod mock_metadata_repository;
mod mock_progress_reporter;

pub use mock_http_transport::MockHttpTransport;
pub use mock_metadata_repository::{MockMetadataRepository, REPOSITORY};
pub use mock_progress_reporter::MockProgressReporter;
