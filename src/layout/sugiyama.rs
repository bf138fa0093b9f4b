//! Sugiyama-style hierarchical layering
//!
//! Steps (all in a top-to-bottom frame):
//! 1. Break cycles: DFS in node order, back edges are reversed
//! 2. Rank: longest path from the roots (Kahn's algorithm)
//! 3. Normalize: edges spanning several ranks become chains of virtual nodes
//! 4. Order: DFS initial order, then barycenter sweeps, keeping the ordering
//!    with the fewest crossings
//! 5. Coordinates: ranks stacked by their tallest node, nodes packed with
//!    the configured gaps, every rank centered on the widest one
//!
//! Nothing here iterates over a hash map, so the same graph always gives the
//! same placement.

use std::collections::VecDeque;

use rustc_hash::FxHashMap;

use crate::config::LayoutConfig;
use crate::error::{DagError, Result};
use crate::graph::Position;

use super::LayeringEngine;

/// Node registered in a [`LayoutGraph`]
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutNode {
    pub id: String,
    pub width: f64,
    pub height: f64,
}

/// Input of a layering engine: sized nodes and directed arcs between them
#[derive(Debug, Clone, Default)]
pub struct LayoutGraph {
    nodes: Vec<LayoutNode>,
    index: FxHashMap<String, usize>,
    arcs: Vec<(usize, usize)>,
}

impl LayoutGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            arcs: Vec::new(),
        }
    }

    /// Register a node; ids must be unique and sizes finite and non-negative
    pub fn add_node(&mut self, id: &str, width: f64, height: f64) -> Result<usize> {
        if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
            return Err(DagError::InvalidNodeSize {
                id: id.to_string(),
                width,
                height,
            });
        }

        if self.index.contains_key(id) {
            return Err(DagError::DuplicateNode { id: id.to_string() });
        }

        let idx = self.nodes.len();
        self.nodes.push(LayoutNode {
            id: id.to_string(),
            width,
            height,
        });
        self.index.insert(id.to_string(), idx);
        Ok(idx)
    }

    /// Register an arc. Returns `false` (and adds nothing) when an endpoint
    /// is unknown.
    pub fn add_edge(&mut self, source: &str, target: &str) -> bool {
        match (self.index.get(source), self.index.get(target)) {
            (Some(&s), Some(&t)) => {
                self.arcs.push((s, t));
                true
            }
            _ => false,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[LayoutNode] {
        &self.nodes
    }

    pub fn arcs(&self) -> &[(usize, usize)] {
        &self.arcs
    }

    pub fn index_of(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }
}

/// Engine output, indexed like [`LayoutGraph::nodes`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placement {
    /// Node centers, translated so the drawing starts at the margins
    pub centers: Vec<Position>,
    /// Node indices per rank, in drawing order
    pub layers: Vec<Vec<usize>>,
    /// Edge crossings left by the chosen ordering
    pub crossings: usize,
}

/// Default hierarchical engine
#[derive(Debug, Clone, Copy, Default)]
pub struct SugiyamaEngine;

impl LayeringEngine for SugiyamaEngine {
    fn name(&self) -> &str {
        "sugiyama"
    }

    fn run(&self, graph: &LayoutGraph, config: &LayoutConfig) -> Result<Placement> {
        if graph.is_empty() {
            return Ok(Placement::default());
        }

        let arcs = break_cycles(graph);
        let ranks = assign_ranks(graph.len(), &arcs)?;
        let network = Network::normalize(graph, &arcs, &ranks);
        let (layers, crossings) = order_layers(&network, config.order_passes);
        let coords = assign_coordinates(&network, &layers, config);

        let real = network.real_count;
        let min_left = (0..real)
            .map(|v| coords[v].x - network.width[v] / 2.0)
            .fold(f64::INFINITY, f64::min);
        let min_top = (0..real)
            .map(|v| coords[v].y - network.height[v] / 2.0)
            .fold(f64::INFINITY, f64::min);
        let dx = config.margin_x - min_left;
        let dy = config.margin_y - min_top;

        let centers = coords[..real]
            .iter()
            .map(|p| Position::new(p.x + dx, p.y + dy))
            .collect();

        let layers = layers
            .into_iter()
            .map(|layer| layer.into_iter().filter(|&v| v < real).collect())
            .collect();

        Ok(Placement {
            centers,
            layers,
            crossings,
        })
    }
}

// ═══════════════════════════════════════════════════════════════
// STEP 1: CYCLE BREAKING
// ═══════════════════════════════════════════════════════════════

/// Acyclic copy of the graph's arcs: self-loops dropped, back edges reversed
fn break_cycles(graph: &LayoutGraph) -> Vec<(usize, usize)> {
    #[derive(Clone, Copy, PartialEq, Eq)]
    enum Color {
        White,
        Gray,
        Black,
    }

    let arcs = graph.arcs();
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); graph.len()];
    for (i, &(s, t)) in arcs.iter().enumerate() {
        if s != t {
            outgoing[s].push(i);
        }
    }

    let mut colors = vec![Color::White; graph.len()];
    let mut reversed = vec![false; arcs.len()];
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..graph.len() {
        if colors[root] != Color::White {
            continue;
        }

        colors[root] = Color::Gray;
        stack.push((root, 0));

        while let Some(frame) = stack.last_mut() {
            let node = frame.0;
            if frame.1 >= outgoing[node].len() {
                colors[node] = Color::Black;
                stack.pop();
                continue;
            }

            let arc = outgoing[node][frame.1];
            frame.1 += 1;

            let target = arcs[arc].1;
            match colors[target] {
                Color::Gray => reversed[arc] = true,
                Color::White => {
                    colors[target] = Color::Gray;
                    stack.push((target, 0));
                }
                Color::Black => {}
            }
        }
    }

    arcs.iter()
        .enumerate()
        .filter(|(_, (s, t))| s != t)
        .map(|(i, &(s, t))| if reversed[i] { (t, s) } else { (s, t) })
        .collect()
}

// ═══════════════════════════════════════════════════════════════
// STEP 2: RANKING
// ═══════════════════════════════════════════════════════════════

/// Longest-path ranks: roots at 0, each target after all of its sources
fn assign_ranks(node_count: usize, arcs: &[(usize, usize)]) -> Result<Vec<usize>> {
    let mut in_degree = vec![0usize; node_count];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for &(s, t) in arcs {
        in_degree[t] += 1;
        successors[s].push(t);
    }

    let mut ranks = vec![0usize; node_count];
    let mut queue: VecDeque<usize> = (0..node_count).filter(|&v| in_degree[v] == 0).collect();
    let mut processed = 0;

    while let Some(current) = queue.pop_front() {
        processed += 1;
        for &succ in &successors[current] {
            ranks[succ] = ranks[succ].max(ranks[current] + 1);
            in_degree[succ] -= 1;
            if in_degree[succ] == 0 {
                queue.push_back(succ);
            }
        }
    }

    if processed != node_count {
        return Err(DagError::Layering {
            reason: format!(
                "ranking reached {} of {} nodes, graph still cyclic",
                processed, node_count
            ),
        });
    }

    Ok(ranks)
}

// ═══════════════════════════════════════════════════════════════
// STEP 3: NORMALIZATION
// ═══════════════════════════════════════════════════════════════

/// Ranked graph where every arc joins adjacent ranks
///
/// Indices below `real_count` are the caller's nodes, the rest are virtual
/// nodes standing in for long edges.
struct Network {
    width: Vec<f64>,
    height: Vec<f64>,
    rank: Vec<usize>,
    preds: Vec<Vec<usize>>,
    succs: Vec<Vec<usize>>,
    real_count: usize,
}

impl Network {
    fn normalize(graph: &LayoutGraph, arcs: &[(usize, usize)], ranks: &[usize]) -> Self {
        let real_count = graph.len();
        let mut net = Network {
            width: graph.nodes().iter().map(|n| n.width).collect(),
            height: graph.nodes().iter().map(|n| n.height).collect(),
            rank: ranks.to_vec(),
            preds: vec![Vec::new(); real_count],
            succs: vec![Vec::new(); real_count],
            real_count,
        };

        for &(s, t) in arcs {
            let mut prev = s;
            for r in (ranks[s] + 1)..ranks[t] {
                let v = net.add_virtual(r);
                net.link(prev, v);
                prev = v;
            }
            net.link(prev, t);
        }

        net
    }

    fn add_virtual(&mut self, rank: usize) -> usize {
        self.width.push(0.0);
        self.height.push(0.0);
        self.rank.push(rank);
        self.preds.push(Vec::new());
        self.succs.push(Vec::new());
        self.width.len() - 1
    }

    fn link(&mut self, s: usize, t: usize) {
        self.succs[s].push(t);
        self.preds[t].push(s);
    }

    #[inline]
    fn len(&self) -> usize {
        self.width.len()
    }

    #[inline]
    fn is_virtual(&self, v: usize) -> bool {
        v >= self.real_count
    }

    fn rank_count(&self) -> usize {
        self.rank.iter().max().map_or(0, |r| r + 1)
    }
}

// ═══════════════════════════════════════════════════════════════
// STEP 4: ORDERING
// ═══════════════════════════════════════════════════════════════

/// Sweeps without improvement before giving up
const MAX_STALE_SWEEPS: usize = 4;

fn order_layers(net: &Network, passes: usize) -> (Vec<Vec<usize>>, usize) {
    let mut layers = initial_order(net);
    let mut best = layers.clone();
    let mut best_crossings = count_crossings(net, &layers);
    let mut stale = 0;

    for _ in 0..passes {
        if best_crossings == 0 || stale >= MAX_STALE_SWEEPS {
            break;
        }

        // Down sweep: order by predecessor positions
        for r in 1..layers.len() {
            reorder_by_barycenter(&mut layers, r, r - 1, &net.preds);
        }
        // Up sweep: order by successor positions
        for r in (0..layers.len().saturating_sub(1)).rev() {
            reorder_by_barycenter(&mut layers, r, r + 1, &net.succs);
        }

        let crossings = count_crossings(net, &layers);
        if crossings < best_crossings {
            best = layers.clone();
            best_crossings = crossings;
            stale = 0;
        } else {
            stale += 1;
        }
    }

    (best, best_crossings)
}

/// DFS from nodes in (rank, index) order: children land next to their parent
fn initial_order(net: &Network) -> Vec<Vec<usize>> {
    let mut layers: Vec<Vec<usize>> = vec![Vec::new(); net.rank_count()];
    let mut visited = vec![false; net.len()];

    let mut starts: Vec<usize> = (0..net.len()).collect();
    starts.sort_by_key(|&v| (net.rank[v], v));

    let mut stack: Vec<usize> = Vec::new();
    for start in starts {
        stack.push(start);
        while let Some(v) = stack.pop() {
            if visited[v] {
                continue;
            }
            visited[v] = true;
            layers[net.rank[v]].push(v);
            stack.extend(net.succs[v].iter().rev().copied());
        }
    }

    layers
}

/// Sort one layer by the mean position of its neighbours in `adjacent`.
///
/// Nodes without neighbours there keep their slot; ties keep current order.
fn reorder_by_barycenter(
    layers: &mut [Vec<usize>],
    layer_idx: usize,
    adjacent: usize,
    neighbors: &[Vec<usize>],
) {
    let adjacent_positions: FxHashMap<usize, usize> = layers[adjacent]
        .iter()
        .enumerate()
        .map(|(pos, &v)| (v, pos))
        .collect();

    let barycenters: Vec<Option<f64>> = layers[layer_idx]
        .iter()
        .map(|&v| {
            let positions: Vec<usize> = neighbors[v]
                .iter()
                .filter_map(|u| adjacent_positions.get(u).copied())
                .collect();
            if positions.is_empty() {
                None
            } else {
                Some(positions.iter().sum::<usize>() as f64 / positions.len() as f64)
            }
        })
        .collect();

    let mut sortable: Vec<(f64, usize)> = layers[layer_idx]
        .iter()
        .zip(&barycenters)
        .filter_map(|(&v, b)| b.map(|b| (b, v)))
        .collect();
    sortable.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut sorted = sortable.into_iter().map(|(_, v)| v);
    let reordered: Vec<usize> = layers[layer_idx]
        .iter()
        .zip(&barycenters)
        .map(|(&v, b)| match b {
            Some(_) => sorted.next().unwrap_or(v),
            None => v,
        })
        .collect();

    layers[layer_idx] = reordered;
}

/// Crossings between every pair of adjacent layers
fn count_crossings(net: &Network, layers: &[Vec<usize>]) -> usize {
    let mut total = 0;

    for pair in layers.windows(2) {
        let lower: FxHashMap<usize, usize> =
            pair[1].iter().enumerate().map(|(pos, &v)| (v, pos)).collect();

        let mut segments: Vec<(usize, usize)> = Vec::new();
        for (upper_pos, &u) in pair[0].iter().enumerate() {
            for v in &net.succs[u] {
                if let Some(&lower_pos) = lower.get(v) {
                    segments.push((upper_pos, lower_pos));
                }
            }
        }
        segments.sort_unstable();

        // Sorted by upper end: a crossing is an inversion of the lower ends
        for (i, a) in segments.iter().enumerate() {
            total += segments[i + 1..].iter().filter(|b| b.1 < a.1).count();
        }
    }

    total
}

// ═══════════════════════════════════════════════════════════════
// STEP 5: COORDINATES
// ═══════════════════════════════════════════════════════════════

/// Centers for every network node (virtual ones included), untranslated
fn assign_coordinates(net: &Network, layers: &[Vec<usize>], config: &LayoutConfig) -> Vec<Position> {
    let mut coords = vec![Position::default(); net.len()];

    let half_gap = |v: usize| {
        if net.is_virtual(v) {
            config.edge_sep / 2.0
        } else {
            config.node_sep / 2.0
        }
    };

    // Rank axis
    let mut offset = 0.0;
    for layer in layers {
        let thickness = layer.iter().map(|&v| net.height[v]).fold(0.0, f64::max);
        for &v in layer {
            coords[v].y = offset + thickness / 2.0;
        }
        offset += thickness + config.rank_sep;
    }

    // Cross axis: pack, then center every layer on the widest
    let mut spans = Vec::with_capacity(layers.len());
    for layer in layers {
        let mut prev: Option<usize> = None;
        for &v in layer {
            coords[v].x = match prev {
                None => net.width[v] / 2.0,
                Some(p) => {
                    coords[p].x + net.width[p] / 2.0 + half_gap(p) + half_gap(v) + net.width[v] / 2.0
                }
            };
            prev = Some(v);
        }
        spans.push(prev.map_or(0.0, |p| coords[p].x + net.width[p] / 2.0));
    }

    let widest = spans.iter().copied().fold(0.0, f64::max);
    for (layer, span) in layers.iter().zip(spans) {
        let shift = (widest - span) / 2.0;
        for &v in layer {
            coords[v].x += shift;
        }
    }

    coords
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(ids: &[&str], arcs: &[(&str, &str)]) -> LayoutGraph {
        let mut g = LayoutGraph::new();
        for id in ids {
            g.add_node(id, 120.0, 60.0).unwrap();
        }
        for (s, t) in arcs {
            g.add_edge(s, t);
        }
        g
    }

    fn run(g: &LayoutGraph) -> Placement {
        SugiyamaEngine.run(g, &LayoutConfig::default()).unwrap()
    }

    fn rank_of(p: &Placement, idx: usize) -> usize {
        p.layers
            .iter()
            .position(|layer| layer.contains(&idx))
            .expect("node placed in a layer")
    }

    // ═══════════════════════════════════════════════════════════════
    // GRAPH CONSTRUCTION
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn test_add_node_rejects_duplicates_and_bad_sizes() {
        let mut g = LayoutGraph::new();
        assert_eq!(g.add_node("a", 10.0, 10.0).unwrap(), 0);
        assert!(matches!(
            g.add_node("a", 10.0, 10.0),
            Err(DagError::DuplicateNode { .. })
        ));
        assert!(matches!(
            g.add_node("b", -1.0, 10.0),
            Err(DagError::InvalidNodeSize { .. })
        ));
        assert!(matches!(
            g.add_node("c", 1.0, f64::INFINITY),
            Err(DagError::InvalidNodeSize { .. })
        ));
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_add_edge_unknown_endpoint() {
        let mut g = graph(&["a"], &[]);
        assert!(!g.add_edge("a", "ghost"));
        assert!(g.arcs().is_empty());
        assert_eq!(g.index_of("a"), Some(0));
    }

    // ═══════════════════════════════════════════════════════════════
    // RANKING
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn test_diamond_ranks() {
        let g = graph(
            &["start", "a", "b", "end"],
            &[("start", "a"), ("start", "b"), ("a", "end"), ("b", "end")],
        );
        let p = run(&g);

        assert_eq!(p.layers.len(), 3);
        assert_eq!(rank_of(&p, 0), 0);
        assert_eq!(rank_of(&p, 1), 1);
        assert_eq!(rank_of(&p, 2), 1);
        assert_eq!(rank_of(&p, 3), 2);
    }

    #[test]
    fn test_longest_path_decides_rank() {
        // a → b → c and a → c: c sits below b
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("a", "c")]);
        let p = run(&g);
        assert_eq!(rank_of(&p, 2), 2);
    }

    #[test]
    fn test_cycle_is_broken_not_fatal() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("c", "a")]);
        let p = run(&g);
        assert_eq!(p.layers.len(), 3);
        assert_eq!(rank_of(&p, 0), 0);
    }

    #[test]
    fn test_self_loop_ignored() {
        let g = graph(&["a", "b"], &[("a", "a"), ("a", "b")]);
        let p = run(&g);
        assert_eq!(p.layers, vec![vec![0], vec![1]]);
    }

    #[test]
    fn test_disconnected_nodes_share_rank_zero() {
        let g = graph(&["x", "y", "z"], &[]);
        let p = run(&g);
        assert_eq!(p.layers, vec![vec![0, 1, 2]]);
    }

    #[test]
    fn test_assign_ranks_reports_leftover_cycle() {
        let err = assign_ranks(2, &[(0, 1), (1, 0)]).unwrap_err();
        assert_eq!(err.code(), "DAG-022");
    }

    // ═══════════════════════════════════════════════════════════════
    // NORMALIZATION & ORDERING
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn test_long_edge_gets_virtual_nodes() {
        let g = graph(&["a", "b", "c", "d"], &[("a", "b"), ("b", "c"), ("c", "d"), ("a", "d")]);
        let arcs = break_cycles(&g);
        let ranks = assign_ranks(g.len(), &arcs).unwrap();
        let net = Network::normalize(&g, &arcs, &ranks);

        // a(0) → d(3) spans three ranks: two virtual nodes
        assert_eq!(net.len(), 6);
        assert!(net.is_virtual(4) && net.is_virtual(5));
        assert_eq!(net.rank[4], 1);
        assert_eq!(net.rank[5], 2);
        assert_eq!(net.succs[0], vec![1, 4]);
        assert_eq!(net.preds[3], vec![2, 5]);
    }

    #[test]
    fn test_virtual_nodes_not_reported() {
        let g = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("a", "c")]);
        let p = run(&g);
        let placed: usize = p.layers.iter().map(Vec::len).sum();
        assert_eq!(placed, 3);
        assert_eq!(p.centers.len(), 3);
    }

    #[test]
    fn test_count_crossings() {
        // upper [a, b], lower [c, d], a → d and b → c cross once
        let g = graph(&["a", "b", "c", "d"], &[("a", "d"), ("b", "c")]);
        let arcs = break_cycles(&g);
        let ranks = assign_ranks(g.len(), &arcs).unwrap();
        let net = Network::normalize(&g, &arcs, &ranks);

        assert_eq!(count_crossings(&net, &[vec![0, 1], vec![2, 3]]), 1);
        assert_eq!(count_crossings(&net, &[vec![0, 1], vec![3, 2]]), 0);
    }

    #[test]
    fn test_ordering_removes_avoidable_crossings() {
        let g = graph(
            &["a", "b", "c", "x", "y", "z"],
            &[("a", "z"), ("b", "y"), ("c", "x"), ("a", "y")],
        );
        let p = run(&g);
        assert_eq!(p.crossings, 0);
    }

    #[test]
    fn test_initial_order_is_depth_first() {
        // children follow their parent, not their own index
        let g = graph(&["a", "b", "c", "x", "y"], &[("a", "y"), ("b", "x")]);
        let arcs = break_cycles(&g);
        let ranks = assign_ranks(g.len(), &arcs).unwrap();
        let net = Network::normalize(&g, &arcs, &ranks);

        assert_eq!(initial_order(&net), vec![vec![0, 1, 2], vec![4, 3]]);
    }

    #[test]
    fn test_barycenter_keeps_unconnected_slots() {
        let mut layers = vec![vec![0, 1], vec![2, 3, 4]];
        // 2 → 1, 4 → 0, 3 has no neighbour above
        let preds = vec![vec![], vec![], vec![1], vec![], vec![0]];
        reorder_by_barycenter(&mut layers, 1, 0, &preds);
        assert_eq!(layers[1], vec![4, 3, 2]);
    }

    // ═══════════════════════════════════════════════════════════════
    // COORDINATES
    // ═══════════════════════════════════════════════════════════════

    #[test]
    fn test_margins_and_rank_spacing() {
        let g = graph(&["a", "b"], &[("a", "b")]);
        let p = run(&g);

        // 120x60 boxes, centers offset by half the box plus the 30 margin
        assert_eq!(p.centers[0], Position::new(90.0, 60.0));
        assert_eq!(p.centers[1], Position::new(90.0, 190.0));
    }

    #[test]
    fn test_same_rank_nodes_do_not_overlap() {
        let mut g = LayoutGraph::new();
        g.add_node("root", 50.0, 20.0).unwrap();
        g.add_node("wide", 300.0, 20.0).unwrap();
        g.add_node("tiny", 5.0, 80.0).unwrap();
        g.add_node("mid", 100.0, 40.0).unwrap();
        for t in ["wide", "tiny", "mid"] {
            g.add_edge("root", t);
        }
        let config = LayoutConfig::default();
        let p = SugiyamaEngine.run(&g, &config).unwrap();

        let layer = &p.layers[1];
        for pair in layer.windows(2) {
            let (l, r) = (pair[0], pair[1]);
            let right_edge = p.centers[l].x + g.nodes()[l].width / 2.0;
            let left_edge = p.centers[r].x - g.nodes()[r].width / 2.0;
            assert!(left_edge - right_edge >= config.node_sep - 1e-9);
        }
        // rank 1 is as thick as its tallest node (80)
        for &v in layer {
            assert_eq!(p.centers[v].y, 30.0 + 20.0 + 70.0 + 40.0);
        }
    }

    #[test]
    fn test_layers_centered_on_widest() {
        let g = graph(&["root", "a", "b"], &[("root", "a"), ("root", "b")]);
        let p = run(&g);

        let mid = (p.centers[1].x + p.centers[2].x) / 2.0;
        assert_eq!(p.centers[0].x, mid);
    }

    #[test]
    fn test_deterministic() {
        let g = graph(
            &["a", "b", "c", "d", "e", "f"],
            &[("a", "d"), ("b", "d"), ("c", "e"), ("a", "f"), ("e", "f"), ("f", "b")],
        );
        assert_eq!(run(&g), run(&g));
    }
}
