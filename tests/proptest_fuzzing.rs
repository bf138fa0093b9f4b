//! Property-based testing for dagedit
//!
//! Uses proptest to fuzz validation and layout with arbitrary editor graphs:
//! self-loops, cycles, duplicate edges and dangling endpoints included.

use dagedit::{layout, validate, Direction, Edge, Node, Verdict};
use proptest::prelude::*;

// =============================================================================
// Generators
// =============================================================================

prop_compose! {
    /// Arbitrary graph: up to 12 nodes, edges between any indices, some of
    /// them pointing one past the last node (dangling)
    fn arb_graph()(node_count in 0usize..12)(
        node_count in Just(node_count),
        pairs in prop::collection::vec((0usize..13, 0usize..13), 0..30),
        sizes in prop::collection::vec(
            prop::option::of((10.0f64..300.0, 10.0f64..200.0)),
            node_count,
        ),
    ) -> (Vec<Node>, Vec<Edge>) {
        let nodes = sizes
            .into_iter()
            .enumerate()
            .map(|(i, size)| {
                let node = Node::new(format!("n{}", i), format!("Node {}", i));
                match size {
                    Some((w, h)) => node.with_size(w, h),
                    None => node,
                }
            })
            .collect();
        let edges = pairs
            .into_iter()
            .enumerate()
            .map(|(i, (s, t))| Edge::new(format!("e{}", i), format!("n{}", s), format!("n{}", t)))
            .collect();
        (nodes, edges)
    }
}

prop_compose! {
    /// Acyclic graph: every edge goes from a lower to a higher index
    fn arb_dag()(node_count in 2usize..10)(
        node_count in Just(node_count),
        pairs in prop::collection::vec((0usize..10, 0usize..10), 0..20),
    ) -> (Vec<Node>, Vec<Edge>) {
        let nodes = (0..node_count)
            .map(|i| Node::new(format!("n{}", i), format!("Node {}", i)))
            .collect();
        let edges = pairs
            .into_iter()
            .filter(|(s, t)| s < t && *t < node_count)
            .enumerate()
            .map(|(i, (s, t))| Edge::new(format!("e{}", i), format!("n{}", s), format!("n{}", t)))
            .collect();
        (nodes, edges)
    }
}

fn size(node: &Node) -> (f64, f64) {
    (
        node.measured_width().unwrap_or(120.0),
        node.measured_height().unwrap_or(60.0),
    )
}

// =============================================================================
// Validation
// =============================================================================

proptest! {
    /// Property: validation classifies every graph without panicking
    #[test]
    fn test_validate_never_panics((nodes, edges) in arb_graph()) {
        let report = validate(&nodes, &edges);
        prop_assert_eq!(report.message.as_str(), report.verdict.message());
    }

    /// Property: a valid report has nothing to highlight
    #[test]
    fn test_valid_means_clean((nodes, edges) in arb_graph()) {
        let report = validate(&nodes, &edges);
        if report.is_valid {
            prop_assert!(nodes.len() >= 2);
            prop_assert!(report.invalid_edges.is_empty());
            prop_assert!(report.disconnected_nodes.is_empty());
            prop_assert!(report.cycle.is_empty());
        }
    }

    /// Property: invalid edges are real, distinct edge ids
    #[test]
    fn test_invalid_edges_exist((nodes, edges) in arb_graph()) {
        let report = validate(&nodes, &edges);
        for (i, id) in report.invalid_edges.iter().enumerate() {
            prop_assert!(edges.iter().any(|e| &e.id == id));
            prop_assert!(!report.invalid_edges[i + 1..].contains(id));
        }
    }

    /// Property: every self-loop is reported
    #[test]
    fn test_self_loops_reported((nodes, edges) in arb_graph()) {
        let report = validate(&nodes, &edges);
        if nodes.len() >= 2 {
            for edge in edges.iter().filter(|e| e.is_self_loop()) {
                prop_assert!(report.is_edge_invalid(&edge.id));
            }
        }
    }

    /// Property: edges going forward in node order never form a cycle
    #[test]
    fn test_forward_edges_are_acyclic((nodes, edges) in arb_dag()) {
        let report = validate(&nodes, &edges);
        prop_assert!(report.invalid_edges.is_empty());
        prop_assert!(matches!(report.verdict, Verdict::Valid | Verdict::Disconnected));
    }

    /// Property: validation is deterministic
    #[test]
    fn test_validate_deterministic((nodes, edges) in arb_graph()) {
        prop_assert_eq!(validate(&nodes, &edges), validate(&nodes, &edges));
    }
}

// =============================================================================
// Layout
// =============================================================================

proptest! {
    /// Property: layout keeps node identity and order and never falls back
    /// on well-formed input
    #[test]
    fn test_layout_preserves_nodes((nodes, edges) in arb_graph()) {
        let outcome = layout(&nodes, &edges, Direction::TopToBottom);
        prop_assert!(outcome.warning.is_none());
        prop_assert_eq!(outcome.nodes.len(), nodes.len());
        for (before, after) in nodes.iter().zip(&outcome.nodes) {
            prop_assert_eq!(&before.id, &after.id);
            prop_assert_eq!(&before.data, &after.data);
        }
        let placed: usize = outcome.layers.iter().map(Vec::len).sum();
        prop_assert_eq!(placed, nodes.len());
    }

    /// Property: no two node boxes overlap, in either direction
    #[test]
    fn test_layout_no_overlap(
        (nodes, edges) in arb_graph(),
        horizontal in any::<bool>(),
    ) {
        let direction = if horizontal { Direction::LeftToRight } else { Direction::TopToBottom };
        let outcome = layout(&nodes, &edges, direction);

        for (i, a) in outcome.nodes.iter().enumerate() {
            let (aw, ah) = size(a);
            for b in &outcome.nodes[i + 1..] {
                let (bw, bh) = size(b);
                let apart_x = a.position.x + aw <= b.position.x + 1e-6
                    || b.position.x + bw <= a.position.x + 1e-6;
                let apart_y = a.position.y + ah <= b.position.y + 1e-6
                    || b.position.y + bh <= a.position.y + 1e-6;
                prop_assert!(apart_x || apart_y, "{} overlaps {}", a.id, b.id);
            }
        }
    }

    /// Property: the drawing starts exactly at the margins
    #[test]
    fn test_layout_respects_margins((nodes, edges) in arb_graph()) {
        prop_assume!(!nodes.is_empty());
        let outcome = layout(&nodes, &edges, Direction::TopToBottom);

        let min_x = outcome.nodes.iter().map(|n| n.position.x).fold(f64::INFINITY, f64::min);
        let min_y = outcome.nodes.iter().map(|n| n.position.y).fold(f64::INFINITY, f64::min);
        prop_assert!((min_x - 30.0).abs() < 1e-6);
        prop_assert!((min_y - 30.0).abs() < 1e-6);
    }

    /// Property: in a DAG every edge points down the drawing
    #[test]
    fn test_dag_edges_point_forward((nodes, edges) in arb_dag()) {
        let outcome = layout(&nodes, &edges, Direction::TopToBottom);
        for edge in &edges {
            let source = outcome.nodes.iter().find(|n| n.id == edge.source).unwrap();
            let target = outcome.nodes.iter().find(|n| n.id == edge.target).unwrap();
            prop_assert!(source.position.y + 60.0 < target.position.y);
        }
    }

    /// Property: layout is deterministic
    #[test]
    fn test_layout_deterministic((nodes, edges) in arb_graph()) {
        let first = layout(&nodes, &edges, Direction::LeftToRight);
        let second = layout(&nodes, &edges, Direction::LeftToRight);
        prop_assert_eq!(first, second);
    }
}
