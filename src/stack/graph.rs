// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! Resource dependency graph
//!
//! One node per declared resource, one edge per reference, pointing from
//! the referenced resource to the one that refers to it. The provisioning
//! engine creates resources in an order compatible with this graph.

use petgraph::algo::{has_path_connecting, kosaraju_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;
use std::fmt;

use super::pipeline::Action;
use super::resources::{GrantTarget, OutputValue, ServiceRole};
use super::WebStack;
use crate::errors::{WebStackError, WebStackResult};

/// Kind of a graph node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Secret,
    Bucket,
    BucketPolicy,
    Role,
    BuildProject,
    Pipeline,
    Webhook,
    CachePolicy,
    Distribution,
    Output,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Secret => "secret",
            Self::Bucket => "bucket",
            Self::BucketPolicy => "bucket policy",
            Self::Role => "role",
            Self::BuildProject => "build project",
            Self::Pipeline => "pipeline",
            Self::Webhook => "webhook",
            Self::CachePolicy => "cache policy",
            Self::Distribution => "distribution",
            Self::Output => "output",
        };
        write!(f, "{}", name)
    }
}

/// A resource and the logical IDs it references
#[derive(Debug, Clone)]
pub struct Declaration {
    pub id: String,
    pub kind: ResourceKind,
    pub references: Vec<String>,
}

impl Declaration {
    fn new(id: &str, kind: ResourceKind, references: Vec<&str>) -> Self {
        let mut refs: Vec<String> = Vec::with_capacity(references.len());
        for r in references {
            if !refs.iter().any(|existing| existing == r) {
                refs.push(r.to_string());
            }
        }
        Self {
            id: id.to_string(),
            kind,
            references: refs,
        }
    }
}

fn role_references(role: &ServiceRole) -> Vec<&str> {
    role.grants
        .iter()
        .flat_map(|g| g.targets.iter())
        .filter_map(|t| match t {
            GrantTarget::Bucket(b) | GrantTarget::BucketObjects(b) => Some(b.id()),
            GrantTarget::Project(p) => Some(p.id()),
            GrantTarget::BuildLogs(_) => None,
        })
        .collect()
}

/// Flatten a stack into declarations, in assembly order
pub fn declarations(stack: &WebStack) -> Vec<Declaration> {
    let mut pipeline_refs = vec![stack.pipeline.role.id(), stack.pipeline.artifact_bucket.id()];
    for action in stack.pipeline.stages.actions() {
        match action {
            Action::Source(s) => pipeline_refs.push(s.secret.id()),
            Action::Build(b) => pipeline_refs.push(b.project.id()),
            Action::Deploy(d) => pipeline_refs.push(d.bucket.id()),
        }
    }

    let mut decls = vec![
        Declaration::new(&stack.secret.logical_id, ResourceKind::Secret, vec![]),
        Declaration::new(&stack.website_bucket.logical_id, ResourceKind::Bucket, vec![]),
        Declaration::new(
            &stack.website_bucket_policy.logical_id,
            ResourceKind::BucketPolicy,
            vec![stack.website_bucket_policy.bucket.id()],
        ),
        Declaration::new(&stack.artifact_bucket.logical_id, ResourceKind::Bucket, vec![]),
        Declaration::new(
            &stack.build_role.logical_id,
            ResourceKind::Role,
            role_references(&stack.build_role),
        ),
        Declaration::new(
            &stack.build_project.logical_id,
            ResourceKind::BuildProject,
            vec![stack.build_project.role.id()],
        ),
        Declaration::new(
            &stack.pipeline_role.logical_id,
            ResourceKind::Role,
            role_references(&stack.pipeline_role),
        ),
        Declaration::new(&stack.pipeline.logical_id, ResourceKind::Pipeline, pipeline_refs),
        Declaration::new(
            &stack.webhook.logical_id,
            ResourceKind::Webhook,
            vec![stack.webhook.pipeline.id(), stack.webhook.secret.id()],
        ),
        Declaration::new(&stack.cache_policy.logical_id, ResourceKind::CachePolicy, vec![]),
        Declaration::new(
            &stack.distribution.logical_id,
            ResourceKind::Distribution,
            vec![stack.distribution.origin.id(), stack.distribution.cache_policy.id()],
        ),
    ];

    for output in &stack.outputs {
        let target = match &output.value {
            OutputValue::DistributionDomainName(d) => d.id(),
        };
        decls.push(Declaration::new(&output.name, ResourceKind::Output, vec![target]));
    }

    decls
}

/// Dependency graph over a stack's resources
pub struct ResourceGraph {
    graph: DiGraph<ResourceKind, ()>,
    name_to_index: HashMap<String, NodeIndex>,
    index_to_name: HashMap<NodeIndex, String>,
}

impl ResourceGraph {
    /// Build the graph for an assembled stack
    pub fn build(stack: &WebStack) -> WebStackResult<Self> {
        Self::from_declarations(&declarations(stack))
    }

    /// Build a graph from raw declarations
    pub fn from_declarations(decls: &[Declaration]) -> WebStackResult<Self> {
        let mut graph = DiGraph::new();
        let mut name_to_index = HashMap::new();
        let mut index_to_name = HashMap::new();

        for decl in decls {
            let node = graph.add_node(decl.kind);
            name_to_index.insert(decl.id.clone(), node);
            index_to_name.insert(node, decl.id.clone());
        }

        for decl in decls {
            let node = name_to_index[&decl.id];
            for target in &decl.references {
                let dep = name_to_index.get(target).ok_or_else(|| WebStackError::UnknownReference {
                    resource: decl.id.clone(),
                    target: target.clone(),
                })?;
                graph.add_edge(*dep, node, ());
            }
        }

        let built = Self {
            graph,
            name_to_index,
            index_to_name,
        };
        built.validate_acyclic()?;
        Ok(built)
    }

    fn validate_acyclic(&self) -> WebStackResult<()> {
        toposort(&self.graph, None)
            .map(|_| ())
            .map_err(|_| self.cycle_error())
    }

    fn cycle_error(&self) -> WebStackError {
        let resources = kosaraju_scc(&self.graph)
            .into_iter()
            .find(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
            .map(|scc| scc.iter().map(|n| self.index_to_name[n].clone()).collect())
            .unwrap_or_default();
        WebStackError::CircularDependency { resources }
    }

    /// Logical IDs in an order the provisioning engine could create them
    pub fn topological_order(&self) -> WebStackResult<Vec<String>> {
        toposort(&self.graph, None)
            .map(|nodes| nodes.into_iter().map(|n| self.index_to_name[&n].clone()).collect())
            .map_err(|_| self.cycle_error())
    }

    /// Resources this one references directly
    pub fn dependencies(&self, id: &str) -> Option<Vec<String>> {
        self.neighbors(id, Direction::Incoming)
    }

    /// Resources that reference this one directly
    pub fn dependents(&self, id: &str) -> Option<Vec<String>> {
        self.neighbors(id, Direction::Outgoing)
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Option<Vec<String>> {
        let node = self.name_to_index.get(id)?;
        let mut names: Vec<String> = self
            .graph
            .neighbors_directed(*node, direction)
            .map(|n| self.index_to_name[&n].clone())
            .collect();
        names.sort();
        Some(names)
    }

    /// Check if `a` depends, directly or transitively, on `b`
    pub fn depends_on(&self, a: &str, b: &str) -> bool {
        let (Some(node_a), Some(node_b)) = (self.name_to_index.get(a), self.name_to_index.get(b))
        else {
            return false;
        };
        node_a != node_b && has_path_connecting(&self.graph, *node_b, *node_a, None)
    }

    pub fn kind(&self, id: &str) -> Option<ResourceKind> {
        self.name_to_index.get(id).map(|n| self.graph[*n])
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    fn edges(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.graph.edge_indices().filter_map(move |e| {
            let (from, to) = self.graph.edge_endpoints(e)?;
            Some((self.index_to_name[&from].as_str(), self.index_to_name[&to].as_str()))
        })
    }

    /// Generate Mermaid diagram of the graph
    pub fn to_mermaid(&self) -> String {
        let mut out = String::from("graph TD\n");

        for node in self.graph.node_indices() {
            let name = &self.index_to_name[&node];
            out.push_str(&format!("    {}[\"{} ({})\"]\n", name, name, self.graph[node]));
        }

        for (from, to) in self.edges() {
            out.push_str(&format!("    {} --> {}\n", from, to));
        }

        out
    }

    /// Generate DOT diagram of the graph
    pub fn to_dot(&self) -> String {
        let mut out = String::from("digraph stack {\n");
        out.push_str("    rankdir=TB;\n");
        out.push_str("    node [shape=box, style=rounded];\n\n");

        for node in self.graph.node_indices() {
            let name = &self.index_to_name[&node];
            out.push_str(&format!(
                "    \"{}\" [label=\"{}\\n{}\"];\n",
                name, name, self.graph[node]
            ));
        }
        out.push('\n');

        for (from, to) in self.edges() {
            out.push_str(&format!("    \"{}\" -> \"{}\";\n", from, to));
        }

        out.push_str("}\n");
        out
    }

    /// Generate text representation of creation order
    pub fn to_text(&self) -> WebStackResult<String> {
        let order = self.topological_order()?;
        let mut out = String::new();

        for (i, id) in order.iter().enumerate() {
            let deps = self.dependencies(id).unwrap_or_default();
            let kind = self.kind(id).map(|k| k.to_string()).unwrap_or_default();

            out.push_str(&format!("{}. {} ({})", i + 1, id, kind));

            if !deps.is_empty() {
                out.push_str(&format!(" [depends: {}]", deps.join(", ")));
            }

            out.push('\n');
        }

        Ok(out)
    }
}

impl fmt::Debug for ResourceGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceGraph")
            .field("nodes", &self.graph.node_count())
            .field("edges", &self.graph.edge_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Environment, StackContext};
    use crate::stack::naming::{logical_ids, DISTRIBUTION_OUTPUT_NAME};
    use crate::stack::resources::Handle;

    fn stack() -> WebStack {
        WebStack::assemble(
            &StackContext::new("t", "acme", "site", "main"),
            &Environment::new("123456789012", "us-east-1"),
        )
        .unwrap()
    }

    fn position(order: &[String], id: &str) -> usize {
        order.iter().position(|n| n == id).unwrap()
    }

    #[test]
    fn test_creation_order_follows_references() {
        let graph = ResourceGraph::build(&stack()).unwrap();
        let order = graph.topological_order().unwrap();

        assert_eq!(order.len(), 12);
        assert!(position(&order, logical_ids::SECRET) < position(&order, logical_ids::PIPELINE));
        assert!(position(&order, logical_ids::BUILD_PROJECT) < position(&order, logical_ids::PIPELINE));
        assert!(position(&order, logical_ids::WEBSITE_BUCKET) < position(&order, logical_ids::DISTRIBUTION));
        assert!(position(&order, logical_ids::CACHE_POLICY) < position(&order, logical_ids::DISTRIBUTION));
        assert_eq!(order.last().map(String::as_str), Some(DISTRIBUTION_OUTPUT_NAME));
    }

    #[test]
    fn test_dependencies_and_dependents() {
        let graph = ResourceGraph::build(&stack()).unwrap();

        assert_eq!(
            graph.dependencies(logical_ids::DISTRIBUTION).unwrap(),
            vec![logical_ids::CACHE_POLICY, logical_ids::WEBSITE_BUCKET]
        );
        let bucket_dependents = graph.dependents(logical_ids::WEBSITE_BUCKET).unwrap();
        assert!(bucket_dependents.contains(&logical_ids::PIPELINE.to_string()));
        assert!(bucket_dependents.contains(&logical_ids::WEBSITE_BUCKET_POLICY.to_string()));
        assert!(graph.dependencies("Nope").is_none());
    }

    #[test]
    fn test_transitive_dependency() {
        let graph = ResourceGraph::build(&stack()).unwrap();

        assert!(graph.depends_on(logical_ids::WEBHOOK, logical_ids::BUILD_PROJECT_ROLE));
        assert!(graph.depends_on(DISTRIBUTION_OUTPUT_NAME, logical_ids::WEBSITE_BUCKET));
        assert!(!graph.depends_on(logical_ids::WEBSITE_BUCKET, logical_ids::PIPELINE));
        assert!(!graph.depends_on(logical_ids::SECRET, logical_ids::SECRET));
    }

    #[test]
    fn test_unknown_reference() {
        let mut stack = stack();
        stack.distribution.origin = Handle::new("MissingBucket");

        let result = ResourceGraph::build(&stack);
        assert!(matches!(
            result,
            Err(WebStackError::UnknownReference { ref target, .. }) if target == "MissingBucket"
        ));
    }

    #[test]
    fn test_cycle_detection() {
        let decls = vec![
            Declaration::new("A", ResourceKind::Role, vec!["B"]),
            Declaration::new("B", ResourceKind::BuildProject, vec!["A"]),
            Declaration::new("C", ResourceKind::Bucket, vec![]),
        ];

        match ResourceGraph::from_declarations(&decls) {
            Err(WebStackError::CircularDependency { mut resources }) => {
                resources.sort();
                assert_eq!(resources, vec!["A", "B"]);
            }
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_renderers() {
        let graph = ResourceGraph::build(&stack()).unwrap();

        let mermaid = graph.to_mermaid();
        assert!(mermaid.starts_with("graph TD"));
        assert!(mermaid.contains("WebappBucket --> WebAppDistribution"));

        let dot = graph.to_dot();
        assert!(dot.contains("\"CustomCachePolicy\" -> \"WebAppDistribution\";"));

        let text = graph.to_text().unwrap();
        assert!(text.contains("WebAppDistribution (distribution) [depends: CustomCachePolicy, WebappBucket]"));
    }
}
