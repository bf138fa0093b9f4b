//! dagedit - validation and auto-layout core for a DAG editor

pub mod config;
pub mod dag;
pub mod editor;
pub mod error;
pub mod graph;
pub mod layout;

pub use config::{LayoutConfig, Settings};
pub use dag::{validate, ValidationReport, Verdict};
pub use editor::{ActionOutcome, Editor, EditorAction, History, Shortcut};
pub use error::{DagError, FixSuggestion, Result};
pub use graph::{AnchorSide, Edge, GraphSnapshot, Measured, Node, NodeData, Position};
pub use layout::{
    layout, layout_with, Direction, LayeringEngine, LayoutOutcome, LayoutWarning, SugiyamaEngine,
};
