// Graph change events - Core → observers (UI refresh)

use crate::blocks::observable::CollectionAction;
use crate::blocks::types::{BlockId, Point};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GraphEvent {
    /// A block joined the Blocks collection
    BlockAdded(BlockId),
    /// A block left the Blocks collection
    BlockRemoved(BlockId),
    BlockMoved { id: BlockId, position: Point },
    /// Parameters or relations of a block were rewritten
    BlockChanged(BlockId),
    Connected { source: BlockId, effect: BlockId },
    Disconnected { source: BlockId, effect: BlockId },
    TargetAdded { modifier: BlockId, effect: BlockId },
    TargetRemoved { modifier: BlockId, effect: BlockId },
    /// The Modifiers collection of a modifiable changed
    ModifiersChanged {
        modifiable: BlockId,
        action: CollectionAction,
    },
    /// A loaded composition replaced the whole graph
    CompositionReplaced,
}
