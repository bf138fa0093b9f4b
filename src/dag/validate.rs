//! DAG Validation
//!
//! Checks, in order:
//! - Node count (empty graph, fewer than 2 nodes)
//! - Self-loops (edge source == target)
//! - Cycles (first cycle found, all of its edges)
//! - Connectivity (every node referenced by at least one edge)
//!
//! Message precedence: invalid edges are reported before disconnection, so
//! the message always agrees with the edges a host highlights.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::{Edge, Node};

use super::flow::FlowGraph;

/// Which rule decided the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    EmptyGraph,
    TooFewNodes,
    InvalidEdges,
    Disconnected,
    Valid,
}

impl Verdict {
    pub fn message(self) -> &'static str {
        match self {
            Verdict::EmptyGraph => "Add a node to the graph.",
            Verdict::TooFewNodes => "Graph must have at least 2 nodes.",
            Verdict::InvalidEdges => "Graph contains invalid edges.",
            Verdict::Disconnected => "All nodes must be connected by at least one edge.",
            Verdict::Valid => "The graph is a valid Directed Acyclic Graph (DAG).",
        }
    }
}

/// Result of [`validate`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub is_valid: bool,
    pub message: String,
    /// Self-loop edges first, then the edges of the detected cycle
    pub invalid_edges: Vec<String>,
    /// Nodes never referenced by an edge
    #[serde(default)]
    pub disconnected_nodes: Vec<String>,
    /// Node path of the detected cycle (empty when acyclic)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cycle: Vec<String>,
    pub verdict: Verdict,
}

impl ValidationReport {
    fn early(verdict: Verdict) -> Self {
        Self {
            is_valid: false,
            message: verdict.message().to_string(),
            invalid_edges: Vec::new(),
            disconnected_nodes: Vec::new(),
            cycle: Vec::new(),
            verdict,
        }
    }

    /// Status bar text: `✅ <message>` or `❌ <message>`
    pub fn status_line(&self) -> String {
        let mark = if self.is_valid { "✅" } else { "❌" };
        format!("{} {}", mark, self.message)
    }

    /// Short badge for the status bar
    pub fn badge(&self) -> &'static str {
        if self.is_valid {
            "Valid DAG"
        } else {
            "Invalid DAG"
        }
    }

    /// Whether `edge_id` should be highlighted
    pub fn is_edge_invalid(&self, edge_id: &str) -> bool {
        self.invalid_edges.iter().any(|id| id == edge_id)
    }
}

/// Validate a snapshot as a DAG. Never fails: every input maps to a report.
pub fn validate(nodes: &[Node], edges: &[Edge]) -> ValidationReport {
    if nodes.is_empty() {
        return ValidationReport::early(Verdict::EmptyGraph);
    }

    if nodes.len() < 2 {
        return ValidationReport::early(Verdict::TooFewNodes);
    }

    let flow = FlowGraph::from_snapshot(nodes, edges);

    let mut invalid_edges: Vec<String> =
        flow.self_loops().iter().map(|id| id.to_string()).collect();

    let cycle = flow.find_cycle();
    if let Some(ref cycle) = cycle {
        debug!(cycle = %cycle, "cycle detected");
        for edge_id in &cycle.edges {
            if !invalid_edges.iter().any(|id| id == edge_id) {
                invalid_edges.push(edge_id.to_string());
            }
        }
    }

    let disconnected_nodes: Vec<String> = flow
        .unreferenced_nodes(edges)
        .into_iter()
        .map(str::to_string)
        .collect();

    let verdict = if !invalid_edges.is_empty() {
        Verdict::InvalidEdges
    } else if !disconnected_nodes.is_empty() {
        Verdict::Disconnected
    } else {
        Verdict::Valid
    };

    debug!(
        nodes = nodes.len(),
        edges = edges.len(),
        ignored_edges = flow.dangling_count(),
        invalid = invalid_edges.len(),
        disconnected = disconnected_nodes.len(),
        ?verdict,
        "graph validated"
    );

    ValidationReport {
        is_valid: verdict == Verdict::Valid,
        message: verdict.message().to_string(),
        invalid_edges,
        disconnected_nodes,
        cycle: cycle
            .map(|c| c.nodes.into_iter().map(str::to_string).collect())
            .unwrap_or_default(),
        verdict,
    }
}
