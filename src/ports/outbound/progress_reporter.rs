/// ProgressReporter port for user-facing progress during a run
///
/// This port abstracts progress reporting (e.g., to stderr) so the use case
/// can describe long-running phases without knowing the terminal. Progress
/// is reported from the collecting side of the enrichment fan-out.
pub trait ProgressReporter: Send + Sync {
    /// Reports a phase or status message
    fn report(&self, message: &str);

    /// Reports progress through a counted phase
    ///
    /// # Arguments
    /// * `current` - Items completed so far
    /// * `total` - Total expected items
    /// * `message` - Optional detail, e.g. the in-flight count
    fn report_progress(&self, current: usize, total: usize, message: Option<&str>);

    /// Reports an error or warning message
    fn report_error(&self, message: &str);

    /// Reports completion of a phase
    fn report_completion(&self, message: &str);
}
