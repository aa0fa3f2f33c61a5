/// Domain layer - p2 metadata model, components and the rules that relate them
///
/// Nothing in this layer performs I/O.
pub mod domain;
pub mod policies;
pub mod services;
