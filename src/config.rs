//! dagedit Configuration Module
//!
//! Layout spacing and host session defaults, read from YAML.
//!
//! ## Priority Order (highest to lowest)
//!
//! 1. Environment variables (`DAGEDIT_DIRECTION`, `DAGEDIT_HISTORY_LIMIT`)
//! 2. Explicit config file (`--config path`)
//! 3. `./dagedit.yaml` when present
//! 4. Defaults

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DagError, Result};
use crate::layout::Direction;

/// Config file picked up from the working directory
pub const DEFAULT_CONFIG_FILE: &str = "dagedit.yaml";

/// Spacing constants for the layering engine
///
/// Never derived from graph size.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutConfig {
    /// Gap between neighbouring nodes of a rank
    pub node_sep: f64,
    /// Gap between consecutive ranks
    pub rank_sep: f64,
    /// Gap used around virtual nodes of long edges
    pub edge_sep: f64,
    pub margin_x: f64,
    pub margin_y: f64,
    /// Box used when a node has no measured width
    pub default_width: f64,
    /// Box used when a node has no measured height
    pub default_height: f64,
    /// Maximum barycenter sweeps while ordering ranks
    pub order_passes: usize,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_sep: 50.0,
            rank_sep: 70.0,
            edge_sep: 10.0,
            margin_x: 30.0,
            margin_y: 30.0,
            default_width: 120.0,
            default_height: 60.0,
            order_passes: 24,
        }
    }
}

impl LayoutConfig {
    /// Same spacing with the two margin axes swapped (left-to-right frame)
    pub fn transposed(&self) -> Self {
        Self {
            margin_x: self.margin_y,
            margin_y: self.margin_x,
            ..self.clone()
        }
    }

    /// Reject negative or non-finite spacing
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("node_sep", self.node_sep),
            ("rank_sep", self.rank_sep),
            ("edge_sep", self.edge_sep),
            ("margin_x", self.margin_x),
            ("margin_y", self.margin_y),
            ("default_width", self.default_width),
            ("default_height", self.default_height),
        ];

        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(DagError::Config {
                    field: format!("layout.{}", field),
                    reason: format!("expected a finite value >= 0, got {}", value),
                });
            }
        }

        Ok(())
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Direction of `dagedit layout` when `--direction` is absent
    pub direction: Direction,
    pub layout: LayoutConfig,
    /// Undo snapshots kept by the editor session
    pub history_limit: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            direction: Direction::TopToBottom,
            layout: LayoutConfig::default(),
            history_limit: 100,
        }
    }
}

impl Settings {
    /// Parse from a YAML string (missing keys take defaults)
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load settings following the priority order above.
    ///
    /// An explicit path must exist; the working-directory file is optional.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let settings = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.exists() {
                    Self::from_file(local)?
                } else {
                    Self::default()
                }
            }
        };

        let settings = settings.with_env()?;
        settings.validate()?;
        Ok(settings)
    }

    fn from_file(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading settings");
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Merge with process environment variables
    pub fn with_env(self) -> Result<Self> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Merge with variables from `lookup` (empty values are ignored)
    pub fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(value) = lookup("DAGEDIT_DIRECTION").filter(|v| !v.is_empty()) {
            self.direction = value.parse()?;
        }

        if let Some(value) = lookup("DAGEDIT_HISTORY_LIMIT").filter(|v| !v.is_empty()) {
            self.history_limit = value.trim().parse().map_err(|_| DagError::Config {
                field: "history_limit".to_string(),
                reason: format!("'{}' is not a positive integer", value),
            })?;
        }

        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.history_limit == 0 {
            return Err(DagError::Config {
                field: "history_limit".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        self.layout.validate()
    }
}
