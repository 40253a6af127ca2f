// Block types - identities, geometry and the variants placed on the canvas

use crate::blocks::modifiable::Modifiable;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Named numeric parameters of a block (e.g. "frequency", "mix")
pub type Params = BTreeMap<String, f64>;

/// Unique identity of a block
///
/// Identities survive undo/redo and save/load, so every reference to a block
/// (connections, modifier lists, persisted records) goes through a `BlockId`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BlockId(Uuid);

impl BlockId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BlockId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for BlockId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// 2-D point in sketch coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn offset(self, dx: f64, dy: f64) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn distance(self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Visual extent of a block, centred on its position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// What a block does in the signal graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockRole {
    /// Produces a signal consumed by effects
    Source,
    /// Consumes signals from sources
    Effect,
    /// Drives the parameters of effects
    Modifier,
}

impl std::fmt::Display for BlockRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockRole::Source => write!(f, "source"),
            BlockRole::Effect => write!(f, "effect"),
            BlockRole::Modifier => write!(f, "modifier"),
        }
    }
}

/// Concrete block variant (the persisted variant tag)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockKind {
    ToneSource,
    Noise,
    Microphone,
    Granular,
    Delay,
    Reverb,
    Filter,
    Distortion,
    Panner,
    Lfo,
    Envelope,
    Pitch,
}

impl BlockKind {
    pub const ALL: [BlockKind; 12] = [
        BlockKind::ToneSource,
        BlockKind::Noise,
        BlockKind::Microphone,
        BlockKind::Granular,
        BlockKind::Delay,
        BlockKind::Reverb,
        BlockKind::Filter,
        BlockKind::Distortion,
        BlockKind::Panner,
        BlockKind::Lfo,
        BlockKind::Envelope,
        BlockKind::Pitch,
    ];

    pub fn role(self) -> BlockRole {
        match self {
            BlockKind::ToneSource | BlockKind::Noise | BlockKind::Microphone | BlockKind::Granular => {
                BlockRole::Source
            }
            BlockKind::Delay
            | BlockKind::Reverb
            | BlockKind::Filter
            | BlockKind::Distortion
            | BlockKind::Panner => BlockRole::Effect,
            BlockKind::Lfo | BlockKind::Envelope | BlockKind::Pitch => BlockRole::Modifier,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BlockKind::ToneSource => "tone",
            BlockKind::Noise => "noise",
            BlockKind::Microphone => "microphone",
            BlockKind::Granular => "granular",
            BlockKind::Delay => "delay",
            BlockKind::Reverb => "reverb",
            BlockKind::Filter => "filter",
            BlockKind::Distortion => "distortion",
            BlockKind::Panner => "panner",
            BlockKind::Lfo => "lfo",
            BlockKind::Envelope => "envelope",
            BlockKind::Pitch => "pitch",
        }
    }

    /// Parameters a freshly created block starts with
    pub fn default_params(self) -> Params {
        let values: &[(&str, f64)] = match self {
            BlockKind::ToneSource => &[("frequency", 440.0), ("volume", 0.5)],
            BlockKind::Noise => &[("volume", 0.3)],
            BlockKind::Microphone => &[("gain", 1.0)],
            BlockKind::Granular => &[("grain_size", 0.1), ("density", 10.0), ("volume", 0.5)],
            BlockKind::Delay => &[("time", 0.25), ("feedback", 0.4), ("mix", 0.5)],
            BlockKind::Reverb => &[("room_size", 0.7), ("damping", 0.5), ("mix", 0.3)],
            BlockKind::Filter => &[("cutoff", 1000.0), ("resonance", 0.7)],
            BlockKind::Distortion => &[("drive", 0.5), ("mix", 1.0)],
            BlockKind::Panner => &[("pan", 0.0)],
            BlockKind::Lfo => &[("rate", 2.0), ("depth", 0.5)],
            BlockKind::Envelope => &[("attack", 0.01), ("release", 0.5)],
            BlockKind::Pitch => &[("semitones", 0.0)],
        };
        values
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    pub fn default_size(self) -> Size {
        match self.role() {
            BlockRole::Source => Size::new(2.0, 2.0),
            BlockRole::Effect => Size::new(3.0, 2.0),
            BlockRole::Modifier => Size::new(2.0, 1.0),
        }
    }
}

impl std::fmt::Display for BlockKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for BlockKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Unknown block kind: {}", s))
    }
}

/// Role-specific relations of a block
///
/// Every relation is a list of identities into the graph arena. Source/effect
/// links are mutual: a source listing an effect implies the effect lists the
/// source, and `BlockGraph` keeps both sides in step.
#[derive(Debug, Clone, PartialEq)]
pub enum BlockLinks {
    Source {
        /// Connected effects, in signal-chain order
        effects: Vec<BlockId>,
        /// Active modifiers and their last-processed snapshot
        modifiable: Modifiable,
    },
    Effect {
        /// Sources feeding this effect (back-references)
        sources: Vec<BlockId>,
    },
    Modifier {
        /// Effects this modifier drives
        targets: Vec<BlockId>,
    },
}

impl BlockLinks {
    pub fn empty(role: BlockRole) -> Self {
        match role {
            BlockRole::Source => BlockLinks::Source {
                effects: Vec::new(),
                modifiable: Modifiable::default(),
            },
            BlockRole::Effect => BlockLinks::Effect {
                sources: Vec::new(),
            },
            BlockRole::Modifier => BlockLinks::Modifier {
                targets: Vec::new(),
            },
        }
    }
}

/// A placeable node of the composition
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    id: BlockId,
    kind: BlockKind,
    position: Point,
    size: Size,
    params: Params,
    links: BlockLinks,
}

impl Block {
    /// Create a block of the given variant with a fresh identity
    pub fn new(kind: BlockKind, position: Point) -> Self {
        Self::with_id(BlockId::new(), kind, position)
    }

    pub fn with_id(id: BlockId, kind: BlockKind, position: Point) -> Self {
        Self {
            id,
            kind,
            position,
            size: kind.default_size(),
            params: kind.default_params(),
            links: BlockLinks::empty(kind.role()),
        }
    }

    /// Rebuild a block with explicit relations (used when loading)
    pub(crate) fn from_parts(
        id: BlockId,
        kind: BlockKind,
        position: Point,
        params: Params,
        links: BlockLinks,
    ) -> Self {
        Self {
            id,
            kind,
            position,
            size: kind.default_size(),
            params,
            links,
        }
    }

    pub fn id(&self) -> BlockId {
        self.id
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn role(&self) -> BlockRole {
        self.kind.role()
    }

    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Hit test against the block's visual bounds
    pub fn contains(&self, point: Point) -> bool {
        (point.x - self.position.x).abs() <= self.size.width / 2.0
            && (point.y - self.position.y).abs() <= self.size.height / 2.0
    }

    pub fn params(&self) -> &Params {
        &self.params
    }

    pub fn param(&self, name: &str) -> Option<f64> {
        self.params.get(name).copied()
    }

    pub fn links(&self) -> &BlockLinks {
        &self.links
    }

    /// Effects fed by this source (empty for other roles)
    pub fn effects(&self) -> &[BlockId] {
        match &self.links {
            BlockLinks::Source { effects, .. } => effects,
            _ => &[],
        }
    }

    /// Sources feeding this effect (empty for other roles)
    pub fn sources(&self) -> &[BlockId] {
        match &self.links {
            BlockLinks::Effect { sources } => sources,
            _ => &[],
        }
    }

    /// Effects driven by this modifier (empty for other roles)
    pub fn targets(&self) -> &[BlockId] {
        match &self.links {
            BlockLinks::Modifier { targets } => targets,
            _ => &[],
        }
    }

    /// Modifiable capability, present on sources
    pub fn modifiable(&self) -> Option<&Modifiable> {
        match &self.links {
            BlockLinks::Source { modifiable, .. } => Some(modifiable),
            _ => None,
        }
    }

    pub fn modifiers(&self) -> &[BlockId] {
        self.modifiable().map(|m| m.modifiers()).unwrap_or(&[])
    }

    /// Every block this one references, in a stable order
    pub fn neighbours(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.effects()
            .iter()
            .chain(self.modifiers())
            .chain(self.sources())
            .chain(self.targets())
            .copied()
    }

    pub(crate) fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    pub(crate) fn params_mut(&mut self) -> &mut Params {
        &mut self.params
    }

    pub(crate) fn links_mut(&mut self) -> &mut BlockLinks {
        &mut self.links
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roles() {
        assert_eq!(BlockKind::ToneSource.role(), BlockRole::Source);
        assert_eq!(BlockKind::Reverb.role(), BlockRole::Effect);
        assert_eq!(BlockKind::Lfo.role(), BlockRole::Modifier);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("Delay".parse::<BlockKind>(), Ok(BlockKind::Delay));
        assert_eq!("tone".parse::<BlockKind>(), Ok(BlockKind::ToneSource));
        assert!("theremin".parse::<BlockKind>().is_err());
    }

    #[test]
    fn test_new_block_has_defaults() {
        let block = Block::new(BlockKind::ToneSource, Point::new(1.0, 2.0));
        assert_eq!(block.param("frequency"), Some(440.0));
        assert_eq!(block.position(), Point::new(1.0, 2.0));
        assert!(block.effects().is_empty());
        assert!(block.modifiable().is_some());

        let effect = Block::new(BlockKind::Filter, Point::default());
        assert!(effect.modifiable().is_none());
    }

    #[test]
    fn test_contains() {
        let block = Block::new(BlockKind::Delay, Point::new(10.0, 10.0));
        assert!(block.contains(Point::new(11.0, 10.5)));
        assert!(!block.contains(Point::new(12.0, 10.0)));
    }

    #[test]
    fn test_block_id_parse() {
        let id = BlockId::new();
        let parsed: BlockId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }
}
