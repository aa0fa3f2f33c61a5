/// Ports module defining interfaces for hexagonal architecture
///
/// The application core drives its infrastructure exclusively through the
/// outbound ports declared here.
pub mod outbound;
