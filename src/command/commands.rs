// Concrete graph command implementations
//
// Each handler captures what it needs to reverse itself while executing and
// is then recorded as the operation.

use crate::blocks::graph::{BlockGraph, Journal, RemovedBlock};
use crate::blocks::types::{Block, BlockId, BlockKind, BlockRole, Point};
use crate::blocks::GraphError;
use crate::command::state::EditorState;
use crate::command::trait_def::{
    CommandError, CommandHandler, CommandOutput, CommandResult, Execution, Operation,
};

/// Place a new block on the canvas
///
/// The block's identity is fixed when the command is built, so redo brings
/// back the same block.
pub struct CreateBlockCommand {
    block: Block,
    index: Option<usize>,
}

impl CreateBlockCommand {
    pub fn new(kind: BlockKind, position: Point) -> Self {
        Self {
            block: Block::new(kind, position),
            index: None,
        }
    }

    pub fn block_id(&self) -> BlockId {
        self.block.id()
    }
}

impl CommandHandler for CreateBlockCommand {
    fn execute(mut self: Box<Self>, state: &mut EditorState) -> CommandResult<Execution> {
        let index = state.graph.insert(self.block.clone())?;
        self.index = Some(index);
        Ok(Execution::Recorded(
            CommandOutput::Created(self.block.id()),
            self,
        ))
    }

    fn description(&self) -> String {
        format!("Create {} block", self.block.kind())
    }
}

impl Operation for CreateBlockCommand {
    fn undo(&mut self, graph: &mut BlockGraph) -> CommandResult<()> {
        graph.remove_block(self.block.id())?;
        Ok(())
    }

    fn redo(&mut self, graph: &mut BlockGraph) -> CommandResult<()> {
        let index = self.index.unwrap_or(graph.len()).min(graph.len());
        graph.insert_at(index, self.block.clone())?;
        Ok(())
    }

    fn description(&self) -> String {
        CommandHandler::description(self)
    }
}

/// Remove a block after detaching it from everything it is linked to
pub struct DeleteBlockCommand {
    id: BlockId,
    removed: Option<RemovedBlock>,
}

impl DeleteBlockCommand {
    pub fn new(id: BlockId) -> Self {
        Self { id, removed: None }
    }

    fn kind_name(&self) -> String {
        self.removed
            .as_ref()
            .map(|r| r.block.kind().to_string())
            .unwrap_or_else(|| "block".to_string())
    }
}

impl CommandHandler for DeleteBlockCommand {
    fn execute(mut self: Box<Self>, state: &mut EditorState) -> CommandResult<Execution> {
        self.removed = Some(state.graph.remove_block(self.id)?);
        Ok(Execution::Recorded(CommandOutput::Deleted(self.id), self))
    }

    fn description(&self) -> String {
        format!("Delete {} block", self.kind_name())
    }
}

impl Operation for DeleteBlockCommand {
    fn undo(&mut self, graph: &mut BlockGraph) -> CommandResult<()> {
        let removed = self
            .removed
            .as_ref()
            .ok_or(GraphError::BlockNotFound(self.id))?;
        graph.restore(removed)?;
        Ok(())
    }

    fn redo(&mut self, graph: &mut BlockGraph) -> CommandResult<()> {
        self.removed = Some(graph.remove_block(self.id)?);
        Ok(())
    }

    fn description(&self) -> String {
        CommandHandler::description(self)
    }
}

/// Move a block, remembering where it was
pub struct MoveBlockCommand {
    id: BlockId,
    new_position: Point,
    old_position: Option<Point>,
}

impl MoveBlockCommand {
    pub fn new(id: BlockId, position: Point) -> Self {
        Self {
            id,
            new_position: position,
            old_position: None,
        }
    }
}

impl CommandHandler for MoveBlockCommand {
    fn execute(mut self: Box<Self>, state: &mut EditorState) -> CommandResult<Execution> {
        let from = state.graph.set_position(self.id, self.new_position)?;
        self.old_position = Some(from);
        Ok(Execution::Recorded(
            CommandOutput::Moved {
                block: self.id,
                from,
                to: self.new_position,
            },
            self,
        ))
    }

    fn description(&self) -> String {
        format!(
            "Move block to ({:.1}, {:.1})",
            self.new_position.x, self.new_position.y
        )
    }
}

impl Operation for MoveBlockCommand {
    fn undo(&mut self, graph: &mut BlockGraph) -> CommandResult<()> {
        let old = self
            .old_position
            .ok_or(GraphError::BlockNotFound(self.id))?;
        graph.set_position(self.id, old)?;
        Ok(())
    }

    fn redo(&mut self, graph: &mut BlockGraph) -> CommandResult<()> {
        graph.set_position(self.id, self.new_position)?;
        Ok(())
    }

    fn description(&self) -> String {
        CommandHandler::description(self)
    }
}

/// Add a delta to a numeric parameter of a block
///
/// A parameter the block did not have starts from zero and is removed again
/// on undo.
pub struct IncrementNumberCommand {
    id: BlockId,
    param: String,
    delta: f64,
    value: f64,
    previous: Option<Option<f64>>,
}

impl IncrementNumberCommand {
    pub fn new(id: BlockId, param: impl Into<String>, delta: f64) -> Self {
        Self {
            id,
            param: param.into(),
            delta,
            value: 0.0,
            previous: None,
        }
    }
}

impl CommandHandler for IncrementNumberCommand {
    fn execute(mut self: Box<Self>, state: &mut EditorState) -> CommandResult<Execution> {
        let current = state.graph.block(self.id)?.param(&self.param).unwrap_or(0.0);
        self.value = current + self.delta;
        let previous = state.graph.set_param(self.id, &self.param, self.value)?;
        self.previous = Some(previous);

        Ok(Execution::Recorded(
            CommandOutput::Incremented {
                block: self.id,
                param: self.param.clone(),
                value: self.value,
            },
            self,
        ))
    }

    fn description(&self) -> String {
        format!("Change {} by {}", self.param, self.delta)
    }
}

impl Operation for IncrementNumberCommand {
    fn undo(&mut self, graph: &mut BlockGraph) -> CommandResult<()> {
        match self.previous {
            Some(Some(previous)) => {
                graph.set_param(self.id, &self.param, previous)?;
            }
            Some(None) => graph.clear_param(self.id, &self.param)?,
            None => return Err(GraphError::BlockNotFound(self.id).into()),
        }
        Ok(())
    }

    fn redo(&mut self, graph: &mut BlockGraph) -> CommandResult<()> {
        graph.set_param(self.id, &self.param, self.value)?;
        Ok(())
    }

    fn description(&self) -> String {
        CommandHandler::description(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkAction {
    Connect,
    Disconnect,
}

/// Which relation a pair of blocks shares, by role
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Relation {
    Signal { source: BlockId, effect: BlockId },
    Target { modifier: BlockId, effect: BlockId },
    Modulation { modifiable: BlockId, modifier: BlockId },
}

impl Relation {
    fn between(graph: &BlockGraph, first: BlockId, second: BlockId) -> CommandResult<Self> {
        let a = graph.block(first)?.role();
        let b = graph.block(second)?.role();

        let relation = match (a, b) {
            (BlockRole::Source, BlockRole::Effect) => Relation::Signal {
                source: first,
                effect: second,
            },
            (BlockRole::Effect, BlockRole::Source) => Relation::Signal {
                source: second,
                effect: first,
            },
            (BlockRole::Modifier, BlockRole::Effect) => Relation::Target {
                modifier: first,
                effect: second,
            },
            (BlockRole::Effect, BlockRole::Modifier) => Relation::Target {
                modifier: second,
                effect: first,
            },
            (BlockRole::Source, BlockRole::Modifier) => Relation::Modulation {
                modifiable: first,
                modifier: second,
            },
            (BlockRole::Modifier, BlockRole::Source) => Relation::Modulation {
                modifiable: second,
                modifier: first,
            },
            _ => {
                return Err(CommandError::InvalidArguments(format!(
                    "cannot link a {} to a {}",
                    a, b
                )));
            }
        };
        Ok(relation)
    }

    fn apply(self, graph: &mut BlockGraph, action: LinkAction) -> CommandResult<(bool, Journal)> {
        let (changed, journal) = graph.journaled(|graph| match (self, action) {
            (Relation::Signal { source, effect }, LinkAction::Connect) => {
                graph.connect(effect, source)
            }
            (Relation::Signal { source, effect }, LinkAction::Disconnect) => {
                graph.disconnect(effect, source)
            }
            (Relation::Target { modifier, effect }, LinkAction::Connect) => {
                graph.add_target(modifier, effect)
            }
            (Relation::Target { modifier, effect }, LinkAction::Disconnect) => {
                graph.remove_target(modifier, effect)
            }
            (
                Relation::Modulation {
                    modifiable,
                    modifier,
                },
                LinkAction::Connect,
            ) => graph.add_modifier(modifiable, modifier),
            (
                Relation::Modulation {
                    modifiable,
                    modifier,
                },
                LinkAction::Disconnect,
            ) => graph.remove_modifier(modifiable, modifier),
        })?;
        Ok((changed, journal))
    }
}

/// Link or unlink two blocks
///
/// Source + Effect share a signal link, Modifier + Effect a modulation
/// target, and Source + Modifier an entry of the source's Modifiers. Undo
/// restores every block the change touched.
pub struct LinkBlocksCommand {
    first: BlockId,
    second: BlockId,
    action: LinkAction,
    journal: Option<Journal>,
}

impl LinkBlocksCommand {
    pub fn connect(first: BlockId, second: BlockId) -> Self {
        Self::new(first, second, LinkAction::Connect)
    }

    pub fn disconnect(first: BlockId, second: BlockId) -> Self {
        Self::new(first, second, LinkAction::Disconnect)
    }

    fn new(first: BlockId, second: BlockId, action: LinkAction) -> Self {
        Self {
            first,
            second,
            action,
            journal: None,
        }
    }

    fn output(&self, changed: bool) -> CommandOutput {
        match self.action {
            LinkAction::Connect => CommandOutput::Linked {
                first: self.first,
                second: self.second,
                changed,
            },
            LinkAction::Disconnect => CommandOutput::Unlinked {
                first: self.first,
                second: self.second,
                changed,
            },
        }
    }
}

impl CommandHandler for LinkBlocksCommand {
    fn execute(mut self: Box<Self>, state: &mut EditorState) -> CommandResult<Execution> {
        let relation = Relation::between(&state.graph, self.first, self.second)?;
        let (changed, journal) = relation.apply(&mut state.graph, self.action)?;

        if !changed {
            return Ok(Execution::Complete(self.output(false)));
        }

        self.journal = Some(journal);
        let output = self.output(true);
        Ok(Execution::Recorded(output, self))
    }

    fn description(&self) -> String {
        match self.action {
            LinkAction::Connect => "Connect blocks".to_string(),
            LinkAction::Disconnect => "Disconnect blocks".to_string(),
        }
    }
}

impl Operation for LinkBlocksCommand {
    fn undo(&mut self, graph: &mut BlockGraph) -> CommandResult<()> {
        let journal = self
            .journal
            .as_ref()
            .ok_or(GraphError::BlockNotFound(self.first))?;
        graph.apply_journal(journal);
        Ok(())
    }

    fn redo(&mut self, graph: &mut BlockGraph) -> CommandResult<()> {
        let relation = Relation::between(graph, self.first, self.second)?;
        let (_, journal) = relation.apply(graph, self.action)?;
        self.journal = Some(journal);
        Ok(())
    }

    fn description(&self) -> String {
        CommandHandler::description(self)
    }
}

/// Undo the last recorded operation
///
/// An empty history is reported as a status, not an error.
pub struct UndoCommand;

impl CommandHandler for UndoCommand {
    fn execute(self: Box<Self>, state: &mut EditorState) -> CommandResult<Execution> {
        let result = state.history.undo(&mut state.graph);
        history_step(result, CommandOutput::Undone, || {
            CommandOutput::NothingToUndo
        })
    }

    fn description(&self) -> String {
        "Undo".to_string()
    }
}

/// Re-apply the last undone operation
pub struct RedoCommand;

impl CommandHandler for RedoCommand {
    fn execute(self: Box<Self>, state: &mut EditorState) -> CommandResult<Execution> {
        let result = state.history.redo(&mut state.graph);
        history_step(result, CommandOutput::Redone, || {
            CommandOutput::NothingToRedo
        })
    }

    fn description(&self) -> String {
        "Redo".to_string()
    }
}

fn history_step(
    result: CommandResult<String>,
    done: fn(String) -> CommandOutput,
    empty: impl FnOnce() -> CommandOutput,
) -> CommandResult<Execution> {
    match result {
        Ok(description) => Ok(Execution::Complete(done(description))),
        Err(CommandError::NothingToUndo) | Err(CommandError::NothingToRedo) => {
            log::debug!("History step skipped: history boundary reached");
            Ok(Execution::Complete(empty()))
        }
        Err(e) => Err(e),
    }
}
