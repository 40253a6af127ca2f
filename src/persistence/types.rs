// Types for composition persistence

use crate::blocks::graph::BlockGraph;
use crate::blocks::types::{BlockId, BlockKind, Params, Point};
use serde::{Deserialize, Serialize};

/// Save file format version
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FormatVersion {
    pub major: u32,
    pub minor: u32,
}

impl FormatVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    pub const fn current() -> Self {
        Self::new(1, 0)
    }

    /// Same major version means the layout is readable
    pub fn is_compatible(&self) -> bool {
        self.major == Self::current().major
    }
}

impl std::fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Zoom state of the sketch, saved with the composition
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ViewState {
    pub zoom_level: f64,
    pub zoom_position: Point,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom_level: 1.0,
            zoom_position: Point::default(),
        }
    }
}

/// Persisted form of one block
///
/// Relations are identity references to other records of the same document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockRecord {
    pub id: BlockId,
    pub kind: BlockKind,
    pub position: Point,
    #[serde(default)]
    pub params: Params,
    /// Source: connected effects, in chain order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub effects: Vec<BlockId>,
    /// Source: active modifiers
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modifiers: Vec<BlockId>,
    /// Effect: connected sources
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<BlockId>,
    /// Modifier: driven effects
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub targets: Vec<BlockId>,
}

/// The persisted document: every reachable block once, plus view state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionDocument {
    pub version: FormatVersion,
    /// RFC 3339 time of the save
    pub saved_at: String,
    #[serde(default)]
    pub view: ViewState,
    pub composition: Vec<BlockRecord>,
}

/// A rebuilt composition ready to be installed
#[derive(Debug, Clone, PartialEq)]
pub struct SaveFile {
    pub composition: BlockGraph,
    pub view: ViewState,
    pub saved_at: Option<String>,
}

impl SaveFile {
    pub fn zoom_level(&self) -> f64 {
        self.view.zoom_level
    }

    pub fn zoom_position(&self) -> Point {
        self.view.zoom_position
    }
}
