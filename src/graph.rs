//! Addressed graph structures for visualization.
//!
//! Every node in an [`AddressedGraph`] carries a `name` that identifies it
//! within its graph: for trees materialized from dependency annotations the
//! name is the node's positional address (see [`crate::trees`]); for semantic
//! graphs it is the graph's own node name. Auxiliary data (highlights, label
//! alternatives, mouseover texts) is keyed by these names.
//!
//! Re-entrant edges are represented by repeating an already-introduced node
//! name with an empty child list; clients resolve the repetition. A tree is
//! simply a graph where that never happens.
//!
//! # Examples
//!
//! ```rust
//! use parseboard::graph::{AddressedGraph, GraphNode};
//!
//! let graph = AddressedGraph::new(
//!     GraphNode::root("", "want-01")
//!         .with_child(GraphNode::child("0", "boy", "ARG0")),
//! );
//!
//! let labels = graph.fold_top_down(Vec::new(), |mut acc, node| {
//!     acc.push(node.label.clone());
//!     acc
//! });
//! assert_eq!(labels, vec!["want-01", "boy"]);
//! ```

use serde::{Deserialize, Serialize};

/// One node of an addressed graph.
///
/// The serialized field names (`node_name`, `node_label`, `incoming_edge`,
/// `child_nodes`) are the wire shape consumed by the client visualizer and
/// accepted from `graph`-formatted raw instances.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    /// Node identity: a positional address for trees, a node name for graphs.
    #[serde(rename = "node_name")]
    pub name: String,
    /// Display label.
    #[serde(rename = "node_label")]
    pub label: String,
    /// Label of the edge connecting this node to its parent; `None` on the root.
    #[serde(
        rename = "incoming_edge",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub incoming_edge: Option<String>,
    /// Child nodes, in document order.
    #[serde(rename = "child_nodes", default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<GraphNode>,
}

impl GraphNode {
    /// Create a root node (no incoming edge).
    pub fn root(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            incoming_edge: None,
            children: Vec::new(),
        }
    }

    /// Create a non-root node connected to its parent by `edge_label`.
    pub fn child(
        name: impl Into<String>,
        label: impl Into<String>,
        edge_label: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            label: label.into(),
            incoming_edge: Some(edge_label.into()),
            children: Vec::new(),
        }
    }

    /// Append a child node, returning `self` for chaining.
    #[must_use]
    pub fn with_child(mut self, child: GraphNode) -> Self {
        self.children.push(child);
        self
    }
}

/// A rooted, addressed graph. This is the `instances` element shape for
/// `Tree`- and `Graph`-typed corpus slices.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AddressedGraph {
    pub root: GraphNode,
}

impl AddressedGraph {
    pub fn new(root: GraphNode) -> Self {
        Self { root }
    }

    /// Pre-order fold over all nodes, parents before children.
    ///
    /// The fold builds and returns a new accumulator rather than mutating
    /// captured state, so callers compose it like any other pure pipeline
    /// step (e.g. collecting mouseover texts during corpus assembly).
    pub fn fold_top_down<A, F>(&self, init: A, mut f: F) -> A
    where
        F: FnMut(A, &GraphNode) -> A,
    {
        let mut acc = init;
        let mut stack = vec![&self.root];
        while let Some(node) = stack.pop() {
            acc = f(acc, node);
            for child in node.children.iter().rev() {
                stack.push(child);
            }
        }
        acc
    }

    /// Total node count (including re-entrant repetitions).
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.fold_top_down(0, |acc, _| acc + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AddressedGraph {
        AddressedGraph::new(
            GraphNode::root("", "want-01")
                .with_child(
                    GraphNode::child("0", "boy", "ARG0")
                        .with_child(GraphNode::child("0.0", "little", "mod")),
                )
                .with_child(GraphNode::child("1", "go-02", "ARG1")),
        )
    }

    #[test]
    fn fold_visits_parents_before_children_in_document_order() {
        let names = sample().fold_top_down(Vec::new(), |mut acc, node| {
            acc.push(node.name.clone());
            acc
        });
        assert_eq!(names, vec!["", "0", "0.0", "1"]);
    }

    #[test]
    fn node_count_counts_all_nodes() {
        assert_eq!(sample().node_count(), 4);
    }

    #[test]
    fn serde_uses_wire_field_names() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["node_name"], "");
        assert_eq!(json["node_label"], "want-01");
        assert_eq!(json["child_nodes"][0]["incoming_edge"], "ARG0");

        let back: AddressedGraph = serde_json::from_value(json).unwrap();
        assert_eq!(back, sample());
    }

    #[test]
    fn root_serializes_without_incoming_edge() {
        let json = serde_json::to_value(sample()).unwrap();
        assert!(json.get("incoming_edge").is_none());
    }
}
