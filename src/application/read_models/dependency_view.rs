//! Dependency view structs for read model

/// Dependencies of one component, targets sorted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyView {
    pub bom_ref: String,
    pub depends_on: Vec<String>,
}
