use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::package::ResolvedPackage;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub dependencies: Vec<String>,
    pub dependents: Vec<String>,
}

/// Dependency edges between resolved packages, with their inverse.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DependencyGraph {
    nodes: BTreeMap<String, GraphNode>,
}

impl DependencyGraph {
    /// Build the graph over `packages`. Edges to names that are not in
    /// `packages` are dropped; one warning per dropped edge is returned.
    pub fn build(packages: &BTreeMap<String, Arc<ResolvedPackage>>) -> (Self, Vec<String>) {
        let mut nodes: BTreeMap<String, GraphNode> = packages
            .keys()
            .map(|name| (name.clone(), GraphNode::default()))
            .collect();
        let mut warnings = Vec::new();

        for (name, package) in packages {
            for dep in &package.dependencies {
                if !packages.contains_key(dep) {
                    warnings.push(format!(
                        "{} depends on {}, which was not resolved; edge dropped",
                        name, dep
                    ));
                    continue;
                }
                if let Some(node) = nodes.get_mut(name)
                    && !node.dependencies.contains(dep)
                {
                    node.dependencies.push(dep.clone());
                }
                if let Some(target) = nodes.get_mut(dep)
                    && !target.dependents.contains(name)
                {
                    target.dependents.push(name.clone());
                }
            }
        }

        (Self { nodes }, warnings)
    }

    pub fn node(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.get(name)
    }

    pub fn dependencies_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependencies.as_slice())
            .unwrap_or_default()
    }

    pub fn dependents_of(&self, name: &str) -> &[String] {
        self.nodes
            .get(name)
            .map(|n| n.dependents.as_slice())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Every edge X -> Y has X among Y's dependents, and vice versa.
    pub fn is_transpose_consistent(&self) -> bool {
        self.nodes.iter().all(|(x, node)| {
            node.dependencies
                .iter()
                .all(|y| self.dependents_of(y).contains(x))
                && node
                    .dependents
                    .iter()
                    .all(|d| self.dependencies_of(d).contains(x))
        })
    }
}
