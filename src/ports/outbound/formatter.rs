use crate::application::read_models::SbomReadModel;
use crate::shared::Result;

/// SbomFormatter port for serializing the assembled document
///
/// One implementation per output encoding (CycloneDX XML, CycloneDX JSON).
pub trait SbomFormatter {
    /// Serializes the document.
    ///
    /// Encoding-specific adjustments are applied to the output only; the
    /// model itself is never modified, so formatting is repeatable.
    ///
    /// # Errors
    /// Returns an error if serialization fails
    fn format(&self, model: &SbomReadModel) -> Result<String>;
}
