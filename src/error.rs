//! Error types with fix suggestions
//!
//! Structural problems in a graph (cycles, self-loops, disconnected nodes) are
//! NOT errors: they are reported through [`crate::ValidationReport`]. The
//! variants below cover what happens around the core: reading snapshots,
//! settings, and the layering engine's internal failures (which the layout
//! entry point converts into a fallback).

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, DagError>;

/// Trait for errors that provide fix suggestions
pub trait FixSuggestion {
    fn fix_suggestion(&self) -> Option<&str>;
}

#[derive(Error, Debug)]
pub enum DagError {
    // ─────────────────────────────────────────────────────────────
    // Snapshot I/O (DAG-001 to DAG-004)
    // ─────────────────────────────────────────────────────────────
    #[error("DAG-001: IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("DAG-002: JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("DAG-003: YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("DAG-004: Unsupported snapshot format '{extension}'")]
    UnsupportedFormat { extension: String },

    // ─────────────────────────────────────────────────────────────
    // Settings (DAG-010 to DAG-011)
    // ─────────────────────────────────────────────────────────────
    #[error("DAG-010: Invalid layout direction '{value}' (expected TB or LR)")]
    InvalidDirection { value: String },

    #[error("DAG-011: Invalid setting '{field}': {reason}")]
    Config { field: String, reason: String },

    // ─────────────────────────────────────────────────────────────
    // Layering engine (DAG-020 to DAG-022)
    // ─────────────────────────────────────────────────────────────
    #[error("DAG-020: Node '{id}' registered twice in layout graph")]
    DuplicateNode { id: String },

    #[error("DAG-021: Node '{id}' has invalid size {width}x{height}")]
    InvalidNodeSize { id: String, width: f64, height: f64 },

    #[error("DAG-022: Layering failed: {reason}")]
    Layering { reason: String },

    // ─────────────────────────────────────────────────────────────
    // Editor session (DAG-030 to DAG-031)
    // ─────────────────────────────────────────────────────────────
    #[error("DAG-030: Node '{id}' does not exist")]
    UnknownNode { id: String },

    #[error("DAG-031: Unknown shortcut '{chord}'")]
    UnknownShortcut { chord: String },
}

impl DagError {
    /// Short error code (e.g. `DAG-020`), stable across message changes
    pub fn code(&self) -> &'static str {
        match self {
            DagError::Io(_) => "DAG-001",
            DagError::Json(_) => "DAG-002",
            DagError::Yaml(_) => "DAG-003",
            DagError::UnsupportedFormat { .. } => "DAG-004",
            DagError::InvalidDirection { .. } => "DAG-010",
            DagError::Config { .. } => "DAG-011",
            DagError::DuplicateNode { .. } => "DAG-020",
            DagError::InvalidNodeSize { .. } => "DAG-021",
            DagError::Layering { .. } => "DAG-022",
            DagError::UnknownNode { .. } => "DAG-030",
            DagError::UnknownShortcut { .. } => "DAG-031",
        }
    }
}

impl FixSuggestion for DagError {
    fn fix_suggestion(&self) -> Option<&str> {
        match self {
            DagError::Io(_) => Some("Check file path and permissions"),
            DagError::Json(_) => {
                Some("Snapshot must be {\"nodes\": [...], \"edges\": [...]} as exported by the editor")
            }
            DagError::Yaml(_) => Some("Check YAML syntax: indentation and quoting"),
            DagError::UnsupportedFormat { .. } => Some("Use a .json, .yaml or .yml file"),
            DagError::InvalidDirection { .. } => Some("Use --direction TB or --direction LR"),
            DagError::Config { .. } => {
                Some("Spacing values must be finite and >= 0, history_limit must be > 0")
            }
            DagError::DuplicateNode { .. } => Some("Give every node a unique id"),
            DagError::InvalidNodeSize { .. } => {
                Some("Remove the measured size or set a finite, non-negative width/height")
            }
            DagError::Layering { .. } => None,
            DagError::UnknownNode { .. } => Some("Connect only nodes that exist in the graph"),
            DagError::UnknownShortcut { .. } => {
                Some("Use chords like ctrl+z, ctrl+shift+z, ctrl+l, delete or escape")
            }
        }
    }
}
