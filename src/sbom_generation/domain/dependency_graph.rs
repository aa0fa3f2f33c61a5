use std::collections::{BTreeSet, HashSet};

/// Dependency entry for one component: its bomRef and the bomRefs it depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependency {
    bom_ref: String,
    depends_on: BTreeSet<String>,
}

impl Dependency {
    pub fn new(bom_ref: impl Into<String>, depends_on: BTreeSet<String>) -> Self {
        Self {
            bom_ref: bom_ref.into(),
            depends_on,
        }
    }

    pub fn bom_ref(&self) -> &str {
        &self.bom_ref
    }

    pub fn depends_on(&self) -> &BTreeSet<String> {
        &self.depends_on
    }
}

/// DependencyGraph aggregate: one entry per component, in component order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyGraph {
    dependencies: Vec<Dependency>,
}

impl DependencyGraph {
    pub fn new(dependencies: Vec<Dependency>) -> Self {
        Self { dependencies }
    }

    pub fn dependencies(&self) -> &[Dependency] {
        &self.dependencies
    }

    pub fn edge_count(&self) -> usize {
        self.dependencies.iter().map(|d| d.depends_on.len()).sum()
    }

    /// Edges whose target is not one of the given bomRefs.
    pub fn dangling_edges<'a>(&'a self, known: &HashSet<&str>) -> Vec<(&'a str, &'a str)> {
        self.dependencies
            .iter()
            .flat_map(|d| {
                d.depends_on
                    .iter()
                    .filter(|target| !known.contains(target.as_str()))
                    .map(move |target| (d.bom_ref.as_str(), target.as_str()))
            })
            .collect()
    }
}
