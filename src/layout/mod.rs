//! # Auto-layout
//!
//! Rank-based placement of editor nodes.
//!
//! ## Overview
//!
//! [`layout`] takes a snapshot and a [`Direction`] and returns the same nodes
//! with new top-left positions and anchor sides. The layering itself is done
//! by a [`LayeringEngine`]:
//!
//! - [`SugiyamaEngine`] - the default hierarchical engine
//! - any other implementation passed to [`layout_with`] (tests use failing
//!   and counting engines)
//!
//! ## Failure handling
//!
//! A layering failure never reaches the caller as an error. The original nodes
//! come back untouched and [`LayoutOutcome::warning`] says why:
//!
//! ```rust
//! use dagedit::graph::{Edge, Node};
//! use dagedit::layout::{layout, Direction};
//!
//! let nodes = vec![Node::new("a", "A"), Node::new("b", "B")];
//! let edges = vec![Edge::new("ab", "a", "b")];
//!
//! let outcome = layout(&nodes, &edges, Direction::TopToBottom);
//! assert!(outcome.warning.is_none());
//! assert!(outcome.nodes[1].position.y > outcome.nodes[0].position.y);
//! ```

mod sugiyama;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::LayoutConfig;
use crate::error::{DagError, Result};
use crate::graph::{AnchorSide, Edge, Node, Position};

pub use sugiyama::{LayoutGraph, LayoutNode, Placement, SugiyamaEngine};

/// Flow direction of edges in the drawing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// Ranks stacked top to bottom
    #[default]
    #[serde(rename = "TB")]
    TopToBottom,
    /// Ranks stacked left to right
    #[serde(rename = "LR")]
    LeftToRight,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::TopToBottom => "TB",
            Direction::LeftToRight => "LR",
        }
    }

    #[inline]
    pub fn is_horizontal(self) -> bool {
        self == Direction::LeftToRight
    }

    /// `(source side, target side)` for edges drawn in this direction
    pub fn anchors(self) -> (AnchorSide, AnchorSide) {
        match self {
            Direction::TopToBottom => (AnchorSide::Bottom, AnchorSide::Top),
            Direction::LeftToRight => (AnchorSide::Right, AnchorSide::Left),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = DagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "TB" => Ok(Direction::TopToBottom),
            "LR" => Ok(Direction::LeftToRight),
            _ => Err(DagError::InvalidDirection {
                value: s.to_string(),
            }),
        }
    }
}

/// Non-fatal signal that the layering failed and positions were kept
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutWarning {
    /// Error code of the underlying failure
    pub code: String,
    pub reason: String,
}

impl From<&DagError> for LayoutWarning {
    fn from(err: &DagError) -> Self {
        Self {
            code: err.code().to_string(),
            reason: err.to_string(),
        }
    }
}

impl fmt::Display for LayoutWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "auto-layout failed, original positions kept ({})", self.reason)
    }
}

/// Result of [`layout`]
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOutcome {
    /// Input nodes, same order, positions and anchor sides replaced
    pub nodes: Vec<Node>,
    /// Node ids per rank in drawing order (empty on fallback)
    pub layers: Vec<Vec<String>>,
    pub warning: Option<LayoutWarning>,
}

impl LayoutOutcome {
    fn empty() -> Self {
        Self {
            nodes: Vec::new(),
            layers: Vec::new(),
            warning: None,
        }
    }

    fn fallback(nodes: &[Node], err: &DagError) -> Self {
        Self {
            nodes: nodes.to_vec(),
            layers: Vec::new(),
            warning: Some(LayoutWarning::from(err)),
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.warning.is_some()
    }
}

/// Layering engine seam
///
/// Engines work in a top-to-bottom frame: ranks grow along y, nodes of a rank
/// are spread along x. [`layout_with`] transposes sizes and coordinates for
/// left-to-right drawings.
pub trait LayeringEngine: Send + Sync {
    /// Engine name (for logging)
    fn name(&self) -> &str;

    /// Compute node centers for `graph`
    fn run(&self, graph: &LayoutGraph, config: &LayoutConfig) -> Result<Placement>;
}

/// Lay out with the default engine and spacing
pub fn layout(nodes: &[Node], edges: &[Edge], direction: Direction) -> LayoutOutcome {
    layout_with(
        &SugiyamaEngine,
        &LayoutConfig::default(),
        nodes,
        edges,
        direction,
    )
}

/// Lay out with an explicit engine and spacing
pub fn layout_with(
    engine: &dyn LayeringEngine,
    config: &LayoutConfig,
    nodes: &[Node],
    edges: &[Edge],
    direction: Direction,
) -> LayoutOutcome {
    if nodes.is_empty() {
        return LayoutOutcome::empty();
    }

    match place(engine, config, nodes, edges, direction) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!(
                engine = engine.name(),
                code = err.code(),
                error = %err,
                "layout failed, keeping original positions"
            );
            LayoutOutcome::fallback(nodes, &err)
        }
    }
}

/// Effective `(width, height)` of a node in the drawing frame
fn effective_size(node: &Node, config: &LayoutConfig) -> (f64, f64) {
    (
        node.measured_width().unwrap_or(config.default_width),
        node.measured_height().unwrap_or(config.default_height),
    )
}

fn place(
    engine: &dyn LayeringEngine,
    config: &LayoutConfig,
    nodes: &[Node],
    edges: &[Edge],
    direction: Direction,
) -> Result<LayoutOutcome> {
    let horizontal = direction.is_horizontal();
    let engine_config = if horizontal {
        config.transposed()
    } else {
        config.clone()
    };

    let mut graph = LayoutGraph::with_capacity(nodes.len());
    for node in nodes {
        let (width, height) = effective_size(node, config);
        if horizontal {
            graph.add_node(&node.id, height, width)?;
        } else {
            graph.add_node(&node.id, width, height)?;
        }
    }

    let mut skipped = 0usize;
    for edge in edges {
        if !graph.add_edge(&edge.source, &edge.target) {
            skipped += 1;
        }
    }

    let placement = engine.run(&graph, &engine_config)?;
    if placement.centers.len() != nodes.len() {
        return Err(DagError::Layering {
            reason: format!(
                "engine '{}' placed {} of {} nodes",
                engine.name(),
                placement.centers.len(),
                nodes.len()
            ),
        });
    }

    let (source_side, target_side) = direction.anchors();

    let placed: Vec<Node> = nodes
        .iter()
        .zip(&placement.centers)
        .map(|(node, center)| {
            let (width, height) = effective_size(node, config);
            let (cx, cy) = if horizontal {
                (center.y, center.x)
            } else {
                (center.x, center.y)
            };

            let mut node = node.clone();
            node.position = Position::new(cx - width / 2.0, cy - height / 2.0);
            node.source_position = Some(source_side);
            node.target_position = Some(target_side);
            node
        })
        .collect();

    let layers = placement
        .layers
        .iter()
        .map(|layer| layer.iter().map(|&i| nodes[i].id.clone()).collect())
        .collect();

    debug!(
        engine = engine.name(),
        %direction,
        nodes = nodes.len(),
        skipped_edges = skipped,
        ranks = placement.layers.len(),
        crossings = placement.crossings,
        "layout computed"
    );

    Ok(LayoutOutcome {
        nodes: placed,
        layers,
        warning: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FailingEngine;

    impl LayeringEngine for FailingEngine {
        fn name(&self) -> &str {
            "failing"
        }

        fn run(&self, _graph: &LayoutGraph, _config: &LayoutConfig) -> Result<Placement> {
            Err(DagError::Layering {
                reason: "simulated".to_string(),
            })
        }
    }

    #[derive(Default)]
    struct CountingEngine {
        calls: AtomicUsize,
    }

    impl LayeringEngine for CountingEngine {
        fn name(&self) -> &str {
            "counting"
        }

        fn run(&self, graph: &LayoutGraph, config: &LayoutConfig) -> Result<Placement> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            SugiyamaEngine.run(graph, config)
        }
    }

    fn chain() -> (Vec<Node>, Vec<Edge>) {
        (
            vec![
                Node::new("a", "A").with_position(5.0, 5.0),
                Node::new("b", "B").with_position(300.0, 7.0),
                Node::new("c", "C").with_position(-40.0, 99.0),
            ],
            vec![Edge::new("ab", "a", "b"), Edge::new("bc", "b", "c")],
        )
    }

    // ═══════════════════════════════════════════════════════════════
    // DIRECTION
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn test_direction_parse() {
        assert_eq!("TB".parse::<Direction>().unwrap(), Direction::TopToBottom);
        assert_eq!(" lr ".parse::<Direction>().unwrap(), Direction::LeftToRight);
        assert!("BT".parse::<Direction>().is_err());
        assert_eq!(Direction::default(), Direction::TopToBottom);
        assert_eq!(Direction::LeftToRight.to_string(), "LR");
    }

    #[test]
    fn test_direction_anchors() {
        assert_eq!(
            Direction::LeftToRight.anchors(),
            (AnchorSide::Right, AnchorSide::Left)
        );
        assert_eq!(
            Direction::TopToBottom.anchors(),
            (AnchorSide::Bottom, AnchorSide::Top)
        );
    }

    // ═══════════════════════════════════════════════════════════════
    // LAYOUT ENTRY POINT
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn test_empty_input_skips_engine() {
        let engine = CountingEngine::default();
        let outcome = layout_with(
            &engine,
            &LayoutConfig::default(),
            &[],
            &[],
            Direction::TopToBottom,
        );
        assert!(outcome.nodes.is_empty());
        assert!(outcome.warning.is_none());
        assert_eq!(engine.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_engine_runs_once() {
        let engine = CountingEngine::default();
        let (nodes, edges) = chain();
        layout_with(
            &engine,
            &LayoutConfig::default(),
            &nodes,
            &edges,
            Direction::TopToBottom,
        );
        assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failing_engine_falls_back() {
        let (nodes, edges) = chain();
        let outcome = layout_with(
            &FailingEngine,
            &LayoutConfig::default(),
            &nodes,
            &edges,
            Direction::LeftToRight,
        );

        assert_eq!(outcome.nodes, nodes);
        assert!(outcome.is_fallback());
        let warning = outcome.warning.unwrap();
        assert_eq!(warning.code, "DAG-022");
        assert!(warning.to_string().contains("simulated"));
    }

    #[test]
    fn test_invalid_size_falls_back() {
        let nodes = vec![
            Node::new("a", "A").with_size(f64::NAN, 10.0),
            Node::new("b", "B"),
        ];
        let outcome = layout(&nodes, &[], Direction::TopToBottom);
        assert_eq!(outcome.nodes, nodes);
        assert_eq!(outcome.warning.unwrap().code, "DAG-021");
    }

    #[test]
    fn test_duplicate_ids_fall_back() {
        let nodes = vec![Node::new("a", "A"), Node::new("a", "again")];
        let outcome = layout(&nodes, &[], Direction::TopToBottom);
        assert_eq!(outcome.nodes, nodes);
        assert_eq!(outcome.warning.unwrap().code, "DAG-020");
    }

    #[test]
    fn test_chain_top_to_bottom() {
        let (nodes, edges) = chain();
        let outcome = layout(&nodes, &edges, Direction::TopToBottom);

        let ys: Vec<f64> = outcome.nodes.iter().map(|n| n.position.y).collect();
        // 30 margin, 60 high boxes, 70 between ranks
        assert_eq!(ys, vec![30.0, 160.0, 290.0]);
        for node in &outcome.nodes {
            assert_eq!(node.position.x, 30.0);
            assert_eq!(node.source_position, Some(AnchorSide::Bottom));
            assert_eq!(node.target_position, Some(AnchorSide::Top));
        }
        assert_eq!(
            outcome.layers,
            vec![vec!["a".to_string()], vec!["b".to_string()], vec!["c".to_string()]]
        );
    }

    #[test]
    fn test_chain_left_to_right() {
        let (nodes, edges) = chain();
        let outcome = layout(&nodes, &edges, Direction::LeftToRight);

        let xs: Vec<f64> = outcome.nodes.iter().map(|n| n.position.x).collect();
        // 30 margin, 120 wide boxes, 70 between ranks
        assert_eq!(xs, vec![30.0, 220.0, 410.0]);
        for node in &outcome.nodes {
            assert_eq!(node.position.y, 30.0);
            assert_eq!(node.source_position, Some(AnchorSide::Right));
            assert_eq!(node.target_position, Some(AnchorSide::Left));
        }
    }

    #[test]
    fn test_measured_size_used_for_spacing() {
        let nodes = vec![
            Node::new("a", "A").with_size(200.0, 40.0),
            Node::new("b", "B").with_size(80.0, 20.0),
        ];
        let outcome = layout(&nodes, &[], Direction::TopToBottom);

        let a = &outcome.nodes[0].position;
        let b = &outcome.nodes[1].position;
        assert_eq!(a.x, 30.0);
        // a is 200 wide, then a 50 gap
        assert_eq!(b.x, 280.0);
        // same rank: centers aligned on the rank axis
        assert_eq!(a.y + 20.0, b.y + 10.0);
    }

    #[test]
    fn test_layout_preserves_identity() {
        let (nodes, edges) = chain();
        let outcome = layout(&nodes, &edges, Direction::TopToBottom);

        assert_eq!(outcome.nodes.len(), nodes.len());
        for (before, after) in nodes.iter().zip(&outcome.nodes) {
            assert_eq!(before.id, after.id);
            assert_eq!(before.data, after.data);
            assert_eq!(before.measured, after.measured);
            assert_eq!(before.extra, after.extra);
        }
    }

    #[test]
    fn test_unknown_endpoints_skipped() {
        let nodes = vec![Node::new("a", "A"), Node::new("b", "B")];
        let edges = vec![Edge::new("ax", "a", "ghost"), Edge::new("ab", "a", "b")];
        let outcome = layout(&nodes, &edges, Direction::TopToBottom);
        assert!(outcome.warning.is_none());
        assert_eq!(outcome.layers.len(), 2);
    }
}
