// BlockGraph - arena of blocks and their connections
//
// Blocks live in a map keyed by identity; `order` is the Blocks collection
// as seen by the sketch (draw order, persisted order). Relations are stored
// on both sides as identity lists, and every mutation goes through this type
// so both sides always change together.

use crate::app::SignalRouter;
use crate::blocks::types::{Block, BlockId, BlockLinks, BlockRole, Point};
use crate::blocks::{GraphError, GraphResult};
use crate::messaging::event::GraphEvent;
use std::collections::{HashMap, HashSet};

/// Pre-mutation snapshots of every block a mutation touched
///
/// Restoring a journal puts those blocks back exactly as they were, which is
/// how structural mutations are undone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Journal {
    snapshots: Vec<Block>,
}

impl Journal {
    pub fn touched(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.snapshots.iter().map(|b| b.id())
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }
}

/// Everything needed to put a removed block back
#[derive(Debug, Clone, PartialEq)]
pub struct RemovedBlock {
    /// The block as it was before it was detached
    pub block: Block,
    /// Position in the Blocks collection
    pub index: usize,
    /// Neighbours changed while detaching
    pub journal: Journal,
}

#[derive(Debug, Clone, Default)]
pub struct BlockGraph {
    blocks: HashMap<BlockId, Block>,
    order: Vec<BlockId>,
    journal: Option<Vec<Block>>,
    events: Vec<GraphEvent>,
}

impl PartialEq for BlockGraph {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order && self.blocks == other.blocks
    }
}

impl BlockGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from fully linked blocks, keeping their order
    pub(crate) fn from_blocks(blocks: Vec<Block>) -> GraphResult<Self> {
        let mut graph = Self::new();
        for block in blocks {
            let id = block.id();
            if graph.blocks.insert(id, block).is_some() {
                return Err(GraphError::DuplicateBlock(id));
            }
            graph.order.push(id);
        }
        Ok(graph)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: BlockId) -> bool {
        self.blocks.contains_key(&id)
    }

    pub fn get(&self, id: BlockId) -> Option<&Block> {
        self.blocks.get(&id)
    }

    pub fn block(&self, id: BlockId) -> GraphResult<&Block> {
        self.blocks.get(&id).ok_or(GraphError::BlockNotFound(id))
    }

    pub fn ids(&self) -> &[BlockId] {
        &self.order
    }

    pub fn index_of(&self, id: BlockId) -> Option<usize> {
        self.order.iter().position(|b| *b == id)
    }

    /// Blocks in collection order
    pub fn blocks(&self) -> impl Iterator<Item = &Block> + '_ {
        self.order.iter().filter_map(|id| self.blocks.get(id))
    }

    pub fn sources(&self) -> impl Iterator<Item = &Block> + '_ {
        self.blocks().filter(|b| b.role() == BlockRole::Source)
    }

    pub fn effects(&self) -> impl Iterator<Item = &Block> + '_ {
        self.blocks().filter(|b| b.role() == BlockRole::Effect)
    }

    pub fn modifiers(&self) -> impl Iterator<Item = &Block> + '_ {
        self.blocks().filter(|b| b.role() == BlockRole::Modifier)
    }

    /// Topmost block under `point`, if any
    pub fn block_at(&self, point: Point) -> Option<&Block> {
        self.blocks().filter(|b| b.contains(point)).last()
    }

    /// Same blocks with the same relations, regardless of collection order
    pub fn same_topology(&self, other: &BlockGraph) -> bool {
        self.blocks == other.blocks
    }

    /// Drain change notifications produced since the last call
    pub fn take_events(&mut self) -> Vec<GraphEvent> {
        std::mem::take(&mut self.events)
    }

    // ---- Blocks collection ----

    /// Append a block to the Blocks collection
    pub fn insert(&mut self, block: Block) -> GraphResult<usize> {
        let index = self.order.len();
        self.insert_at(index, block)?;
        Ok(index)
    }

    pub fn insert_at(&mut self, index: usize, block: Block) -> GraphResult<()> {
        let id = block.id();
        if self.blocks.contains_key(&id) {
            return Err(GraphError::DuplicateBlock(id));
        }
        if index > self.order.len() {
            return Err(GraphError::IndexOutOfRange {
                index,
                len: self.order.len(),
            });
        }
        self.blocks.insert(id, block);
        self.order.insert(index, id);
        self.events.push(GraphEvent::BlockAdded(id));
        Ok(())
    }

    /// Detach a block from everything it participates in, then remove it
    pub fn remove_block(&mut self, id: BlockId) -> GraphResult<RemovedBlock> {
        let index = self.index_of(id).ok_or(GraphError::BlockNotFound(id))?;
        let block = self.block(id)?.clone();

        let ((), journal) = self.journaled(|graph| graph.detach(id))?;

        self.blocks.remove(&id);
        self.order.remove(index);
        self.events.push(GraphEvent::BlockRemoved(id));

        Ok(RemovedBlock {
            block,
            index,
            journal,
        })
    }

    /// Put a removed block back with its neighbours' prior relations
    pub fn restore(&mut self, removed: &RemovedBlock) -> GraphResult<()> {
        self.insert_at(removed.index, removed.block.clone())?;
        self.apply_journal(&removed.journal);
        Ok(())
    }

    fn detach(&mut self, id: BlockId) -> GraphResult<()> {
        let block = self.block(id)?.clone();
        match block.role() {
            BlockRole::Source => {
                // Drop modulation first so its reconnection sees the live links.
                if !block.modifiers().is_empty() {
                    self.set_modifiers(id, Vec::new())?;
                }
                let effects = self.block(id)?.effects().to_vec();
                for effect in effects {
                    self.disconnect(effect, id)?;
                }
            }
            BlockRole::Effect => {
                for source in block.sources() {
                    self.disconnect(id, *source)?;
                }
                let drivers: Vec<BlockId> = self
                    .modifiers()
                    .filter(|m| m.targets().contains(&id))
                    .map(|m| m.id())
                    .collect();
                for modifier in drivers {
                    self.remove_target(modifier, id)?;
                }
            }
            BlockRole::Modifier => {
                let users: Vec<BlockId> = self
                    .sources()
                    .filter(|s| s.modifiers().contains(&id))
                    .map(|s| s.id())
                    .collect();
                for modifiable in users {
                    self.remove_modifier(modifiable, id)?;
                }
            }
        }
        Ok(())
    }

    // ---- Block state ----

    /// Move a block; returns its previous position
    pub fn set_position(&mut self, id: BlockId, position: Point) -> GraphResult<Point> {
        if !position.is_finite() {
            return Err(GraphError::NonFinite {
                id,
                field: "position".to_string(),
            });
        }
        self.touch(id);
        let block = self.block_mut(id)?;
        let previous = block.position();
        block.set_position(position);
        self.events.push(GraphEvent::BlockMoved { id, position });
        Ok(previous)
    }

    /// Set a numeric parameter; returns its previous value
    pub fn set_param(&mut self, id: BlockId, name: &str, value: f64) -> GraphResult<Option<f64>> {
        if !value.is_finite() {
            return Err(GraphError::NonFinite {
                id,
                field: name.to_string(),
            });
        }
        self.touch(id);
        let previous = self
            .block_mut(id)?
            .params_mut()
            .insert(name.to_string(), value);
        self.events.push(GraphEvent::BlockChanged(id));
        Ok(previous)
    }

    /// Remove a parameter that did not exist before an edit
    pub(crate) fn clear_param(&mut self, id: BlockId, name: &str) -> GraphResult<()> {
        self.touch(id);
        self.block_mut(id)?.params_mut().remove(name);
        self.events.push(GraphEvent::BlockChanged(id));
        Ok(())
    }

    // ---- Source <-> Effect ----

    /// `effect.Connect(source)`: link both sides; false if already linked
    pub fn connect(&mut self, effect: BlockId, source: BlockId) -> GraphResult<bool> {
        self.expect_role(effect, BlockRole::Effect)?;
        self.expect_role(source, BlockRole::Source)?;

        if self.block(effect)?.sources().contains(&source) {
            return Ok(false);
        }

        self.touch(effect);
        self.touch(source);
        if let BlockLinks::Effect { sources } = self.block_mut(effect)?.links_mut() {
            sources.push(source);
        }
        if let BlockLinks::Source { effects, .. } = self.block_mut(source)?.links_mut()
            && !effects.contains(&effect)
        {
            effects.push(effect);
        }
        self.events.push(GraphEvent::Connected { source, effect });
        Ok(true)
    }

    /// `effect.Disconnect(source)`: unlink both sides; false if not linked
    pub fn disconnect(&mut self, effect: BlockId, source: BlockId) -> GraphResult<bool> {
        self.expect_role(effect, BlockRole::Effect)?;
        self.expect_role(source, BlockRole::Source)?;

        if !self.block(effect)?.sources().contains(&source) {
            return Ok(false);
        }

        self.touch(effect);
        self.touch(source);
        if let BlockLinks::Effect { sources } = self.block_mut(effect)?.links_mut() {
            sources.retain(|s| *s != source);
        }
        if let BlockLinks::Source { effects, .. } = self.block_mut(source)?.links_mut() {
            effects.retain(|e| *e != effect);
        }
        self.events.push(GraphEvent::Disconnected { source, effect });
        Ok(true)
    }

    // ---- Modifier -> Effect targets ----

    pub fn add_target(&mut self, modifier: BlockId, effect: BlockId) -> GraphResult<bool> {
        self.expect_role(modifier, BlockRole::Modifier)?;
        self.expect_role(effect, BlockRole::Effect)?;

        if self.block(modifier)?.targets().contains(&effect) {
            return Ok(false);
        }
        self.touch(modifier);
        if let BlockLinks::Modifier { targets } = self.block_mut(modifier)?.links_mut() {
            targets.push(effect);
        }
        self.events.push(GraphEvent::TargetAdded { modifier, effect });
        Ok(true)
    }

    pub fn remove_target(&mut self, modifier: BlockId, effect: BlockId) -> GraphResult<bool> {
        self.expect_role(modifier, BlockRole::Modifier)?;

        if !self.block(modifier)?.targets().contains(&effect) {
            return Ok(false);
        }
        self.touch(modifier);
        if let BlockLinks::Modifier { targets } = self.block_mut(modifier)?.links_mut() {
            targets.retain(|t| *t != effect);
        }
        self.events.push(GraphEvent::TargetRemoved { modifier, effect });
        Ok(true)
    }

    /// Existing effects driven by `modifier`; empty if it is gone
    pub(crate) fn targets_of(&self, modifier: BlockId) -> Vec<BlockId> {
        self.get(modifier)
            .map(|m| {
                m.targets()
                    .iter()
                    .copied()
                    .filter(|t| self.contains(*t))
                    .collect()
            })
            .unwrap_or_default()
    }

    // ---- Journal ----

    /// Run a mutation while recording pre-change snapshots of touched blocks
    ///
    /// On error the touched blocks are rolled back, so the mutation is
    /// all-or-nothing. Nested calls fold their snapshots into the outer journal.
    pub fn journaled<R>(
        &mut self,
        mutation: impl FnOnce(&mut Self) -> GraphResult<R>,
    ) -> GraphResult<(R, Journal)> {
        let outer = self.journal.replace(Vec::new());
        let result = mutation(self);
        let snapshots = self.journal.take().unwrap_or_default();
        self.journal = outer;

        if let Some(outer) = self.journal.as_mut() {
            for snapshot in &snapshots {
                if !outer.iter().any(|b| b.id() == snapshot.id()) {
                    outer.push(snapshot.clone());
                }
            }
        }

        let journal = Journal { snapshots };
        match result {
            Ok(value) => Ok((value, journal)),
            Err(e) => {
                self.apply_journal(&journal);
                Err(e)
            }
        }
    }

    /// Overwrite every journaled block that still exists with its snapshot
    pub fn apply_journal(&mut self, journal: &Journal) {
        for snapshot in &journal.snapshots {
            let id = snapshot.id();
            if let Some(block) = self.blocks.get_mut(&id) {
                *block = snapshot.clone();
                self.events.push(GraphEvent::BlockChanged(id));
            }
        }
    }

    pub(crate) fn touch(&mut self, id: BlockId) {
        if let Some(journal) = self.journal.as_mut()
            && !journal.iter().any(|b| b.id() == id)
            && let Some(block) = self.blocks.get(&id)
        {
            journal.push(block.clone());
        }
    }

    // ---- Traversal ----

    /// Visit every block reachable from `roots` exactly once
    ///
    /// Depth-first over all relations (source -> effects and modifiers,
    /// effect -> sources, modifier -> targets), in pre-order. Shared blocks
    /// and cycles are handled by the visited set; unknown roots are skipped.
    pub fn traverse_unique(&self, roots: impl IntoIterator<Item = BlockId>) -> Vec<BlockId> {
        let mut visited = HashSet::new();
        let mut visit_order = Vec::new();
        let mut stack: Vec<BlockId> = Vec::new();

        for root in roots {
            stack.push(root);
            while let Some(id) = stack.pop() {
                let Some(block) = self.blocks.get(&id) else {
                    continue;
                };
                if !visited.insert(id) {
                    continue;
                }
                visit_order.push(id);

                let neighbours: Vec<BlockId> = block.neighbours().collect();
                stack.extend(neighbours.into_iter().rev().filter(|n| !visited.contains(n)));
            }
        }

        visit_order
    }

    /// Every block, each once, starting from the Blocks collection order
    pub fn traverse_all(&self) -> Vec<BlockId> {
        self.traverse_unique(self.order.iter().copied())
    }

    // ---- Signal path ----

    /// Re-establish the live signal path of a source to its effects
    pub fn refresh(&self, source: BlockId, router: &mut dyn SignalRouter) -> GraphResult<()> {
        self.expect_role(source, BlockRole::Source)?;
        let block = self.block(source)?;

        router.disconnect_all(block);
        for effect in block.effects() {
            router.connect(block, self.block(*effect)?);
        }
        Ok(())
    }

    /// Check that every relation points at a live block of the right role
    /// and that source/effect links are mutual
    pub fn validate(&self) -> GraphResult<()> {
        for block in self.blocks() {
            let id = block.id();
            match block.links() {
                BlockLinks::Source {
                    effects,
                    modifiable,
                } => {
                    for effect in effects {
                        self.expect_role(*effect, BlockRole::Effect)?;
                        if !self.block(*effect)?.sources().contains(&id) {
                            return Err(GraphError::AsymmetricLink {
                                from: id,
                                to: *effect,
                            });
                        }
                    }
                    for modifier in modifiable.modifiers().iter().chain(modifiable.old_modifiers()) {
                        self.expect_role(*modifier, BlockRole::Modifier)?;
                    }
                }
                BlockLinks::Effect { sources } => {
                    for source in sources {
                        self.expect_role(*source, BlockRole::Source)?;
                        if !self.block(*source)?.effects().contains(&id) {
                            return Err(GraphError::AsymmetricLink {
                                from: id,
                                to: *source,
                            });
                        }
                    }
                }
                BlockLinks::Modifier { targets } => {
                    for target in targets {
                        self.expect_role(*target, BlockRole::Effect)?;
                    }
                }
            }
        }
        Ok(())
    }

    // ---- Internals ----

    pub(crate) fn block_mut(&mut self, id: BlockId) -> GraphResult<&mut Block> {
        self.blocks.get_mut(&id).ok_or(GraphError::BlockNotFound(id))
    }

    pub(crate) fn expect_role(&self, id: BlockId, expected: BlockRole) -> GraphResult<()> {
        let actual = self.block(id)?.role();
        if actual != expected {
            return Err(GraphError::RoleMismatch {
                id,
                expected,
                actual,
            });
        }
        Ok(())
    }

    pub(crate) fn push_event(&mut self, event: GraphEvent) {
        self.events.push(event);
    }
}
