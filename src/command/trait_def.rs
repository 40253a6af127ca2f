// CommandHandler and Operation trait definitions

use crate::blocks::graph::BlockGraph;
use crate::blocks::types::{BlockId, Point};
use crate::blocks::GraphError;
use crate::command::deferred::Deferred;
use crate::command::state::EditorState;
use crate::persistence::{PersistenceError, SaveFile};
use crate::resource::ResourceError;
use thiserror::Error;

/// Result type for command operations
pub type CommandResult<T> = Result<T, CommandError>;

/// Errors that can occur during command execution
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Resource(#[from] ResourceError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Persistence worker stopped before reporting a result")]
    WorkerDisconnected,
}

impl CommandError {
    /// Save/load failure, reported apart from graph mutation failures
    pub fn is_persistence(&self) -> bool {
        matches!(
            self,
            CommandError::Persistence(_) | CommandError::WorkerDisconnected
        )
    }

    /// The stored composition is unreadable, as opposed to unreachable
    pub fn is_deserialization(&self) -> bool {
        matches!(self, CommandError::Persistence(e) if e.is_deserialization())
    }
}

/// Outcome of a command, resolved through its deferred result
#[derive(Debug)]
pub enum CommandOutput {
    Created(BlockId),
    Deleted(BlockId),
    Moved {
        block: BlockId,
        from: Point,
        to: Point,
    },
    Incremented {
        block: BlockId,
        param: String,
        value: f64,
    },
    /// Pair linked; `changed` is false when the link already existed
    Linked {
        first: BlockId,
        second: BlockId,
        changed: bool,
    },
    Unlinked {
        first: BlockId,
        second: BlockId,
        changed: bool,
    },
    Undone(String),
    Redone(String),
    NothingToUndo,
    NothingToRedo,
    Saved {
        composition_id: String,
    },
    /// Rebuilt on the persistence worker, not yet installed
    Loaded {
        composition_id: String,
        save_file: Box<SaveFile>,
    },
    /// Loaded composition now live in the editor
    Installed {
        composition_id: String,
    },
}

/// What executing a handler produced
pub enum Execution {
    /// Done, nothing to record
    Complete(CommandOutput),
    /// Graph mutation done; the operation goes onto the history
    Recorded(CommandOutput, Box<dyn Operation>),
    /// Persistence work still in flight
    Deferred(Deferred<CommandOutput>),
}

/// One unit of command logic, instantiated per invocation
///
/// Handlers that mutate the graph capture everything needed to reverse the
/// mutation while executing and hand themselves back as an [`Operation`].
pub trait CommandHandler: Send {
    fn execute(self: Box<Self>, state: &mut EditorState) -> CommandResult<Execution>;

    /// Human-readable description (e.g. "Move Delay block")
    fn description(&self) -> String;
}

/// A recorded, reversible graph mutation
///
/// Must be Send as operations are owned by the history, which travels with
/// the editor state.
pub trait Operation: Send {
    /// Restore the graph to its state before the mutation
    fn undo(&mut self, graph: &mut BlockGraph) -> CommandResult<()>;

    /// Re-apply the mutation after an undo
    fn redo(&mut self, graph: &mut BlockGraph) -> CommandResult<()>;

    fn description(&self) -> String;
}
