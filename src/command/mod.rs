// Command Pattern for Undo/Redo functionality
//
// Every mutation of the composition goes through `CommandManager`, which
// resolves a command name to a handler factory, executes the handler against
// the editor state and records graph mutations on the bounded history.
//
// Architecture:
// - CommandHandler trait: execute() + description(), one per command kind
// - Operation trait: undo() / redo() of a recorded graph mutation
// - CommandManager: name -> handler registry, records operations
// - OperationManager: bounded done/undone stacks
// - Deferred: result of Save/Load, whose I/O runs on a worker thread

pub mod args;
pub mod commands;
pub mod deferred;
pub mod manager;
pub mod operation;
pub mod persistence;
pub mod state;
pub mod trait_def;

pub use args::{CommandArg, CommandArgs};
pub use deferred::Deferred;
pub use manager::{CommandHandlerFactory, CommandManager, Commands};
pub use operation::OperationManager;
pub use state::EditorState;
pub use trait_def::{
    CommandError, CommandHandler, CommandOutput, CommandResult, Execution, Operation,
};
