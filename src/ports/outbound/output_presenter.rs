use crate::shared::Result;

/// OutputPresenter port for delivering a serialized document
///
/// This port abstracts the output destination (stdout, file, etc.).
pub trait OutputPresenter {
    /// Writes the serialized document to the destination
    ///
    /// # Errors
    /// Returns an error if:
    /// - The destination cannot be created
    /// - Writing to the destination fails
    fn present(&self, content: &str) -> Result<()>;
}
