//! # Editor session
//!
//! Host-side state around the core: the current snapshot, a selection, the
//! JSON panel flag and undo/redo history. Every structural mutation records
//! the previous snapshot and refreshes the cached [`ValidationReport`].
//!
//! ```rust
//! use dagedit::editor::Editor;
//!
//! let mut editor = Editor::default();
//! let a = editor.add_node("Fetch").unwrap();
//! let b = editor.add_node("Store").unwrap();
//! editor.connect(&a, &b).unwrap();
//! assert!(editor.report().is_valid);
//!
//! editor.undo();
//! assert!(!editor.report().is_valid);
//! ```

mod history;
mod shortcuts;

use std::collections::BTreeSet;
use std::mem;

use serde::Serialize;
use tracing::{debug, trace};

use crate::config::Settings;
use crate::dag::{validate, ValidationReport};
use crate::error::{DagError, Result};
use crate::graph::{Edge, GraphSnapshot, Node, Position};
use crate::layout::{layout_with, Direction, LayoutWarning, SugiyamaEngine};

pub use history::History;
pub use shortcuts::{Binding, EditorAction, Key, Shortcut, BINDINGS};

/// Spread of freshly added nodes (grid cells per row/column)
const STAGGER_CELLS: usize = 5;
const STAGGER_STEP: f64 = 80.0;

/// What [`Editor::dispatch`] did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome")]
pub enum ActionOutcome {
    /// Whether the action changed anything
    Applied { changed: bool },
    NodeAdded { id: String },
    LaidOut { warning: Option<LayoutWarning> },
    Exported { json: String },
    PanelToggled { visible: bool },
}

/// Interactive editing session
#[derive(Debug, Clone)]
pub struct Editor {
    snapshot: GraphSnapshot,
    selected_nodes: BTreeSet<String>,
    selected_edges: BTreeSet<String>,
    history: History,
    settings: Settings,
    next_node: usize,
    next_edge: usize,
    json_panel: bool,
    report: ValidationReport,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl Editor {
    pub fn new(settings: Settings) -> Self {
        Self::with_snapshot(GraphSnapshot::default(), settings)
    }

    /// Open an existing snapshot (not recorded in history)
    pub fn with_snapshot(snapshot: GraphSnapshot, settings: Settings) -> Self {
        let report = validate(&snapshot.nodes, &snapshot.edges);
        let mut editor = Self {
            history: History::new(settings.history_limit),
            snapshot,
            selected_nodes: BTreeSet::new(),
            selected_edges: BTreeSet::new(),
            settings,
            next_node: 0,
            next_edge: 0,
            json_panel: false,
            report,
        };
        editor.sync_counters();
        editor
    }

    // ─────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> &GraphSnapshot {
        &self.snapshot
    }

    pub fn nodes(&self) -> &[Node] {
        &self.snapshot.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.snapshot.edges
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Validation of the current snapshot
    pub fn report(&self) -> &ValidationReport {
        &self.report
    }

    pub fn status_line(&self) -> String {
        self.report.status_line()
    }

    pub fn selected_nodes(&self) -> impl Iterator<Item = &str> {
        self.selected_nodes.iter().map(String::as_str)
    }

    pub fn selected_edges(&self) -> impl Iterator<Item = &str> {
        self.selected_edges.iter().map(String::as_str)
    }

    pub fn has_selection(&self) -> bool {
        !self.selected_nodes.is_empty() || !self.selected_edges.is_empty()
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn is_json_panel_visible(&self) -> bool {
        self.json_panel
    }

    /// Label offered for the next node (`Node {n}`)
    pub fn default_label(&self) -> String {
        format!("Node {}", self.next_node)
    }

    // ─────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────

    /// Add a node; a blank label adds nothing
    pub fn add_node(&mut self, label: &str) -> Option<String> {
        let label = label.trim();
        if label.is_empty() {
            return None;
        }

        let id = self.fresh_node_id();
        let slot = self.snapshot.nodes.len();
        let position = Position::new(
            (slot % STAGGER_CELLS) as f64 * STAGGER_STEP,
            (slot / STAGGER_CELLS % STAGGER_CELLS) as f64 * STAGGER_STEP,
        );

        let mut next = self.snapshot.clone();
        next.nodes.push(Node::new(id.clone(), label).with_position(position.x, position.y));
        self.commit(next, "add_node");
        Some(id)
    }

    /// Add an edge between two existing nodes
    pub fn connect(&mut self, source: &str, target: &str) -> Result<String> {
        for id in [source, target] {
            if !self.snapshot.contains_node(id) {
                return Err(DagError::UnknownNode { id: id.to_string() });
            }
        }

        let id = self.fresh_edge_id();
        let mut next = self.snapshot.clone();
        next.edges.push(Edge::new(id.clone(), source, target));
        self.commit(next, "connect");
        Ok(id)
    }

    pub fn move_node(&mut self, id: &str, position: Position) -> Result<()> {
        let mut next = self.snapshot.clone();
        let node = next
            .nodes
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| DagError::UnknownNode { id: id.to_string() })?;

        if node.position == position {
            return Ok(());
        }
        node.position = position;
        self.commit(next, "move_node");
        Ok(())
    }

    /// Replace the selection; unknown ids are ignored
    pub fn select<S: AsRef<str>>(&mut self, ids: &[S]) {
        self.selected_nodes.clear();
        self.selected_edges.clear();

        for id in ids {
            let id: &str = id.as_ref();
            if self.snapshot.contains_node(id) {
                self.selected_nodes.insert(id.to_string());
            } else if self.snapshot.edges.iter().any(|e| e.id == id) {
                self.selected_edges.insert(id.to_string());
            }
        }
    }

    pub fn select_all(&mut self) {
        self.selected_nodes = self.snapshot.nodes.iter().map(|n| n.id.clone()).collect();
        self.selected_edges = self.snapshot.edges.iter().map(|e| e.id.clone()).collect();
    }

    pub fn clear_selection(&mut self) -> bool {
        let had = self.has_selection();
        self.selected_nodes.clear();
        self.selected_edges.clear();
        had
    }

    /// Remove selected nodes, selected edges and edges touching removed nodes
    pub fn delete_selected(&mut self) -> bool {
        if !self.has_selection() {
            return false;
        }

        let nodes = mem::take(&mut self.selected_nodes);
        let edges = mem::take(&mut self.selected_edges);

        let mut next = self.snapshot.clone();
        next.nodes.retain(|n| !nodes.contains(&n.id));
        next.edges.retain(|e| {
            !edges.contains(&e.id) && !nodes.contains(&e.source) && !nodes.contains(&e.target)
        });

        if next == self.snapshot {
            return false;
        }
        self.commit(next, "delete_selected");
        true
    }

    /// Re-place every node; on failure positions stay and the warning is returned
    pub fn auto_layout(&mut self, direction: Direction) -> Option<LayoutWarning> {
        let outcome = layout_with(
            &SugiyamaEngine,
            &self.settings.layout,
            &self.snapshot.nodes,
            &self.snapshot.edges,
            direction,
        );

        if outcome.warning.is_some() {
            return outcome.warning;
        }

        if outcome.nodes != self.snapshot.nodes {
            let next = GraphSnapshot::new(outcome.nodes, self.snapshot.edges.clone());
            self.commit(next, "auto_layout");
        }
        None
    }

    /// Replace the whole graph (undoable)
    pub fn import(&mut self, snapshot: GraphSnapshot) {
        self.selected_nodes.clear();
        self.selected_edges.clear();
        self.commit(snapshot, "import");
        self.sync_counters();
    }

    pub fn undo(&mut self) -> bool {
        match self.history.undo(&self.snapshot) {
            Some(previous) => {
                self.restore(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo(&self.snapshot) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    /// Flip the JSON panel; returns the new visibility
    pub fn toggle_json_panel(&mut self) -> bool {
        self.json_panel = !self.json_panel;
        self.json_panel
    }

    /// JSON shown in the preview panel
    pub fn json_preview(&self) -> Result<String> {
        self.snapshot.to_json_pretty()
    }

    /// JSON written on export (`{"nodes": [...], "edges": [...]}`)
    pub fn export_json(&self) -> Result<String> {
        self.snapshot.to_json_pretty()
    }

    /// Run a shortcut action
    pub fn dispatch(&mut self, action: EditorAction) -> Result<ActionOutcome> {
        trace!(?action, "dispatch");
        let outcome = match action {
            EditorAction::DeleteSelected => ActionOutcome::Applied {
                changed: self.delete_selected(),
            },
            EditorAction::ClearSelection => ActionOutcome::Applied {
                changed: self.clear_selection(),
            },
            EditorAction::SelectAll => {
                self.select_all();
                ActionOutcome::Applied {
                    changed: self.has_selection(),
                }
            }
            EditorAction::AddNode => {
                let label = self.default_label();
                match self.add_node(&label) {
                    Some(id) => ActionOutcome::NodeAdded { id },
                    None => ActionOutcome::Applied { changed: false },
                }
            }
            EditorAction::AutoLayout => ActionOutcome::LaidOut {
                warning: self.auto_layout(Direction::TopToBottom),
            },
            EditorAction::Export => ActionOutcome::Exported {
                json: self.export_json()?,
            },
            EditorAction::ToggleJsonPanel => ActionOutcome::PanelToggled {
                visible: self.toggle_json_panel(),
            },
            EditorAction::Undo => ActionOutcome::Applied {
                changed: self.undo(),
            },
            EditorAction::Redo => ActionOutcome::Applied {
                changed: self.redo(),
            },
        };
        Ok(outcome)
    }

    // ─────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────

    fn commit(&mut self, next: GraphSnapshot, op: &str) {
        let before = mem::replace(&mut self.snapshot, next);
        self.history.record(before);
        self.refresh();
        debug!(
            op,
            nodes = self.snapshot.nodes.len(),
            edges = self.snapshot.edges.len(),
            valid = self.report.is_valid,
            "graph changed"
        );
    }

    fn restore(&mut self, snapshot: GraphSnapshot) {
        self.snapshot = snapshot;
        let snapshot = &self.snapshot;
        self.selected_nodes.retain(|id| snapshot.contains_node(id));
        self.selected_edges
            .retain(|id| snapshot.edges.iter().any(|e| &e.id == id));
        self.refresh();
    }

    fn refresh(&mut self) {
        self.report = validate(&self.snapshot.nodes, &self.snapshot.edges);
    }

    fn fresh_node_id(&mut self) -> String {
        loop {
            let id = format!("node_{}", self.next_node);
            self.next_node += 1;
            if !self.snapshot.contains_node(&id) {
                return id;
            }
        }
    }

    fn fresh_edge_id(&mut self) -> String {
        loop {
            let id = format!("edge_{}", self.next_edge);
            self.next_edge += 1;
            if !self.snapshot.edges.iter().any(|e| e.id == id) {
                return id;
            }
        }
    }

    /// Move counters past `node_N`/`edge_N` ids already in the snapshot
    fn sync_counters(&mut self) {
        let next_node = next_suffix(self.snapshot.nodes.iter().map(|n| n.id.as_str()), "node_");
        let next_edge = next_suffix(self.snapshot.edges.iter().map(|e| e.id.as_str()), "edge_");
        self.next_node = self.next_node.max(next_node);
        self.next_edge = self.next_edge.max(next_edge);
    }
}

/// One past the largest `N` among ids shaped `{prefix}N`
fn next_suffix<'a>(ids: impl Iterator<Item = &'a str>, prefix: &str) -> usize {
    ids.filter_map(|id| id.strip_prefix(prefix)?.parse::<usize>().ok())
        .map(|n| n + 1)
        .max()
        .unwrap_or(0)
}
