// Modifiable - modifier collection carried by sources, and its reconnection
//
// Whenever the Modifiers collection changes, every effect driven by the
// previous modifiers is disconnected from the modifiable, every effect driven
// by the current modifiers is connected, and the snapshot is refreshed. The
// full disconnect/reconnect converges even if a modifier's targets changed
// since the last notification.

use crate::blocks::graph::BlockGraph;
use crate::blocks::observable::ObservableCollection;
use crate::blocks::types::{BlockId, BlockLinks, BlockRole};
use crate::blocks::{GraphError, GraphResult};
use crate::messaging::event::GraphEvent;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Modifiable {
    modifiers: ObservableCollection<BlockId>,
    old_modifiers: Vec<BlockId>,
}

impl Modifiable {
    /// Rebuild a modifiable whose modifiers are already wired up
    pub(crate) fn settled(modifiers: Vec<BlockId>) -> Self {
        Self {
            old_modifiers: modifiers.clone(),
            modifiers: ObservableCollection::from_items(modifiers),
        }
    }

    /// Active modifiers, in the order they were added
    pub fn modifiers(&self) -> &[BlockId] {
        self.modifiers.items()
    }

    /// The Modifiers collection as of the last processed change
    pub fn old_modifiers(&self) -> &[BlockId] {
        &self.old_modifiers
    }
}

impl BlockGraph {
    /// Add a modifier to a modifiable; false if it was already active
    pub fn add_modifier(&mut self, modifiable: BlockId, modifier: BlockId) -> GraphResult<bool> {
        self.expect_role(modifier, BlockRole::Modifier)?;
        if self.modifiable_mut(modifiable)?.modifiers.contains(&modifier) {
            return Ok(false);
        }
        self.touch(modifiable);
        self.modifiable_mut(modifiable)?.modifiers.add(modifier);
        self.process_modifier_changes(modifiable)?;
        Ok(true)
    }

    /// Remove a modifier from a modifiable; false if it was not active
    pub fn remove_modifier(&mut self, modifiable: BlockId, modifier: BlockId) -> GraphResult<bool> {
        if !self.modifiable_mut(modifiable)?.modifiers.contains(&modifier) {
            return Ok(false);
        }
        self.touch(modifiable);
        self.modifiable_mut(modifiable)?.modifiers.remove(&modifier);
        self.process_modifier_changes(modifiable)?;
        Ok(true)
    }

    /// Replace the whole Modifiers collection
    pub fn set_modifiers(&mut self, modifiable: BlockId, modifiers: Vec<BlockId>) -> GraphResult<()> {
        for modifier in &modifiers {
            self.expect_role(*modifier, BlockRole::Modifier)?;
        }
        self.touch(modifiable);
        self.modifiable_mut(modifiable)?.modifiers.replace(modifiers);
        self.process_modifier_changes(modifiable)
    }

    fn process_modifier_changes(&mut self, modifiable: BlockId) -> GraphResult<()> {
        let changes = self.modifiable_mut(modifiable)?.modifiers.take_changes();
        for change in changes {
            self.on_modifiers_changed(modifiable)?;
            self.push_event(GraphEvent::ModifiersChanged {
                modifiable,
                action: change.action,
            });
        }
        Ok(())
    }

    fn on_modifiers_changed(&mut self, modifiable: BlockId) -> GraphResult<()> {
        let (old, current) = {
            let m = self.modifiable_mut(modifiable)?;
            (m.old_modifiers.clone(), m.modifiers.items().to_vec())
        };

        for modifier in &old {
            for effect in self.targets_of(*modifier) {
                self.disconnect(effect, modifiable)?;
            }
        }

        for modifier in &current {
            for effect in self.targets_of(*modifier) {
                self.connect(effect, modifiable)?;
            }
        }

        self.modifiable_mut(modifiable)?.old_modifiers = current;
        log::debug!("Reconnected modifiers of {}", modifiable);
        Ok(())
    }

    fn modifiable_mut(&mut self, id: BlockId) -> GraphResult<&mut Modifiable> {
        let block = self.block_mut(id)?;
        let actual = block.role();
        match block.links_mut() {
            BlockLinks::Source { modifiable, .. } => Ok(modifiable),
            _ => Err(GraphError::RoleMismatch {
                id,
                expected: BlockRole::Source,
                actual,
            }),
        }
    }
}
