//! FlowGraph - adjacency built from a graph snapshot
//!
//! Borrows ids from the snapshot (no cloning) and keeps successor lists in
//! edge sequence order, so traversal order is reproducible.
//!
//! Construction rules:
//! - Self-loops are set aside (they never enter the adjacency)
//! - Edges with an endpoint outside the node set are skipped
//!
//! Cycle detection uses the DFS three-color algorithm with an explicit stack.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::graph::{Edge, Node};

/// Outgoing arc: target node plus the edge that produced it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link<'a> {
    pub target: &'a str,
    pub edge_id: &'a str,
}

/// Stack-allocated successor list: most editor nodes have 0-4 successors
pub type LinkVec<'a> = SmallVec<[Link<'a>; 4]>;

/// A cycle found by [`FlowGraph::find_cycle`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle<'a> {
    /// Nodes on the cycle, starting at the re-entered node
    pub nodes: Vec<&'a str>,
    /// Edge ids closing the cycle, in path order (last one is the back edge)
    pub edges: Vec<&'a str>,
}

impl fmt::Display for Cycle<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.nodes.join(" → "))?;
        if let Some(first) = self.nodes.first() {
            write!(f, " → {}", first)?;
        }
        Ok(())
    }
}

/// Directed adjacency over a snapshot
pub struct FlowGraph<'a> {
    /// node_id -> outgoing links (edge sequence order)
    adjacency: FxHashMap<&'a str, LinkVec<'a>>,
    /// Node ids in snapshot order
    node_ids: Vec<&'a str>,
    /// Self-loop edge ids in snapshot order
    self_loops: Vec<&'a str>,
    /// Edges skipped because an endpoint is unknown
    dangling: usize,
}

impl<'a> FlowGraph<'a> {
    pub fn from_snapshot(nodes: &'a [Node], edges: &'a [Edge]) -> Self {
        let capacity = nodes.len();
        let mut adjacency: FxHashMap<&'a str, LinkVec<'a>> =
            FxHashMap::with_capacity_and_hasher(capacity, Default::default());
        let mut node_ids: Vec<&'a str> = Vec::with_capacity(capacity);

        for node in nodes {
            let id = node.id.as_str();
            if adjacency.insert(id, LinkVec::new()).is_none() {
                node_ids.push(id);
            }
        }

        let mut self_loops = Vec::new();
        let mut dangling = 0;

        for edge in edges {
            if edge.is_self_loop() {
                self_loops.push(edge.id.as_str());
                continue;
            }

            if !adjacency.contains_key(edge.target.as_str()) {
                dangling += 1;
                continue;
            }

            match adjacency.get_mut(edge.source.as_str()) {
                Some(links) => links.push(Link {
                    target: edge.target.as_str(),
                    edge_id: edge.id.as_str(),
                }),
                None => dangling += 1,
            }
        }

        Self {
            adjacency,
            node_ids,
            self_loops,
            dangling,
        }
    }

    /// Node ids in snapshot order (duplicates collapsed)
    #[inline]
    pub fn node_ids(&self) -> &[&'a str] {
        &self.node_ids
    }

    /// Outgoing links of a node
    #[inline]
    pub fn successors(&self, node_id: &str) -> &[Link<'a>] {
        self.adjacency
            .get(node_id)
            .map(SmallVec::as_slice)
            .unwrap_or_default()
    }

    /// Self-loop edge ids (excluded from the adjacency)
    #[inline]
    pub fn self_loops(&self) -> &[&'a str] {
        &self.self_loops
    }

    /// Number of edges ignored because of an unknown endpoint
    #[inline]
    pub fn dangling_count(&self) -> usize {
        self.dangling
    }

    /// Number of links in the adjacency
    pub fn link_count(&self) -> usize {
        self.adjacency.values().map(SmallVec::len).sum()
    }

    /// Find the first cycle reachable in node order.
    ///
    /// White = unvisited, Gray = on the active path, Black = fully explored.
    /// Reaching a Gray node closes a cycle; the walk stops there, so at most
    /// one cycle is reported per call.
    pub fn find_cycle(&self) -> Option<Cycle<'a>> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Color {
            White,
            Gray,
            Black,
        }

        let mut colors: FxHashMap<&'a str, Color> = self
            .node_ids
            .iter()
            .map(|id| (*id, Color::White))
            .collect();

        // (node, index of the next successor to explore)
        let mut stack: Vec<(&'a str, usize)> = Vec::new();
        // path_edges[i] links stack[i] to stack[i + 1]
        let mut path_edges: Vec<&'a str> = Vec::new();

        for &root in &self.node_ids {
            if colors.get(root) != Some(&Color::White) {
                continue;
            }

            colors.insert(root, Color::Gray);
            stack.push((root, 0));

            while let Some(frame) = stack.last_mut() {
                let node = frame.0;
                let links = self.successors(node);

                if frame.1 >= links.len() {
                    colors.insert(node, Color::Black);
                    stack.pop();
                    path_edges.pop();
                    continue;
                }

                let link = links[frame.1];
                frame.1 += 1;

                match colors.get(link.target) {
                    Some(Color::Gray) => {
                        let start = stack
                            .iter()
                            .position(|(id, _)| *id == link.target)
                            .unwrap_or(0);
                        let nodes = stack[start..].iter().map(|(id, _)| *id).collect();
                        let mut edges: Vec<&'a str> = path_edges[start..].to_vec();
                        edges.push(link.edge_id);
                        return Some(Cycle { nodes, edges });
                    }
                    Some(Color::White) => {
                        colors.insert(link.target, Color::Gray);
                        path_edges.push(link.edge_id);
                        stack.push((link.target, 0));
                    }
                    Some(Color::Black) | None => {}
                }
            }
        }

        None
    }

    /// Node ids not referenced by any edge (snapshot order).
    ///
    /// Self-loops count as a reference; dangling endpoints only count for the
    /// endpoint that exists.
    pub fn unreferenced_nodes(&self, edges: &[Edge]) -> Vec<&'a str> {
        let referenced: FxHashSet<&str> = edges
            .iter()
            .flat_map(|e| [e.source.as_str(), e.target.as_str()])
            .collect();

        self.node_ids
            .iter()
            .copied()
            .filter(|id| !referenced.contains(id))
            .collect()
    }
}
