// CommandManager - resolves command names to handlers and records history

use crate::command::args::CommandArgs;
use crate::command::commands::{
    CreateBlockCommand, DeleteBlockCommand, IncrementNumberCommand, LinkBlocksCommand,
    MoveBlockCommand, RedoCommand, UndoCommand,
};
use crate::command::deferred::Deferred;
use crate::command::persistence::{LoadCommand, SaveAsCommand, SaveCommand};
use crate::command::state::EditorState;
use crate::command::trait_def::{CommandError, CommandHandler, CommandOutput, CommandResult, Execution};
use crate::resource::{Resource, ResourceError, ResourceManager, ResourceResult};

/// Names of the built-in commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Commands {
    CreateBlock,
    DeleteBlock,
    MoveBlock,
    IncrementNumber,
    ConnectBlocks,
    DisconnectBlocks,
    Save,
    SaveAs,
    Load,
    Undo,
    Redo,
}

impl Commands {
    pub const ALL: [Commands; 11] = [
        Commands::CreateBlock,
        Commands::DeleteBlock,
        Commands::MoveBlock,
        Commands::IncrementNumber,
        Commands::ConnectBlocks,
        Commands::DisconnectBlocks,
        Commands::Save,
        Commands::SaveAs,
        Commands::Load,
        Commands::Undo,
        Commands::Redo,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Commands::CreateBlock => "CREATE_BLOCK",
            Commands::DeleteBlock => "DELETE_BLOCK",
            Commands::MoveBlock => "MOVE_BLOCK",
            Commands::IncrementNumber => "INCREMENT_NUMBER",
            Commands::ConnectBlocks => "CONNECT_BLOCKS",
            Commands::DisconnectBlocks => "DISCONNECT_BLOCKS",
            Commands::Save => "SAVE",
            Commands::SaveAs => "SAVEAS",
            Commands::Load => "LOAD",
            Commands::Undo => "UNDO",
            Commands::Redo => "REDO",
        }
    }
}

impl std::fmt::Display for Commands {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

type CreateHandler = fn(&CommandArgs) -> CommandResult<Box<dyn CommandHandler>>;

/// Registry entry building a handler from the call's arguments
#[derive(Clone)]
pub struct CommandHandlerFactory {
    name: String,
    create: CreateHandler,
}

impl CommandHandlerFactory {
    pub fn new(name: impl Into<String>, create: CreateHandler) -> Self {
        Self {
            name: name.into(),
            create,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn create(&self, args: &CommandArgs) -> CommandResult<Box<dyn CommandHandler>> {
        (self.create)(args)
    }
}

impl Resource for CommandHandlerFactory {
    fn resource_key(&self) -> &str {
        &self.name
    }
}

impl std::fmt::Debug for CommandHandlerFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandHandlerFactory")
            .field("name", &self.name)
            .finish()
    }
}

fn create_block(args: &CommandArgs) -> CommandResult<Box<dyn CommandHandler>> {
    Ok(Box::new(CreateBlockCommand::new(
        args.kind_at(0)?,
        args.point_at(1)?,
    )))
}

fn delete_block(args: &CommandArgs) -> CommandResult<Box<dyn CommandHandler>> {
    Ok(Box::new(DeleteBlockCommand::new(args.block_at(0)?)))
}

fn move_block(args: &CommandArgs) -> CommandResult<Box<dyn CommandHandler>> {
    Ok(Box::new(MoveBlockCommand::new(
        args.block_at(0)?,
        args.point_at(1)?,
    )))
}

fn increment_number(args: &CommandArgs) -> CommandResult<Box<dyn CommandHandler>> {
    Ok(Box::new(IncrementNumberCommand::new(
        args.block_at(0)?,
        args.text_at(1)?,
        args.number_at(2)?,
    )))
}

fn connect_blocks(args: &CommandArgs) -> CommandResult<Box<dyn CommandHandler>> {
    Ok(Box::new(LinkBlocksCommand::connect(
        args.block_at(0)?,
        args.block_at(1)?,
    )))
}

fn disconnect_blocks(args: &CommandArgs) -> CommandResult<Box<dyn CommandHandler>> {
    Ok(Box::new(LinkBlocksCommand::disconnect(
        args.block_at(0)?,
        args.block_at(1)?,
    )))
}

fn save(_args: &CommandArgs) -> CommandResult<Box<dyn CommandHandler>> {
    Ok(Box::new(SaveCommand))
}

fn save_as(args: &CommandArgs) -> CommandResult<Box<dyn CommandHandler>> {
    Ok(Box::new(SaveAsCommand::new(
        args.optional_text_at(0)?.map(str::to_string),
    )))
}

fn load(args: &CommandArgs) -> CommandResult<Box<dyn CommandHandler>> {
    Ok(Box::new(LoadCommand::new(args.text_at(0)?)))
}

fn undo(_args: &CommandArgs) -> CommandResult<Box<dyn CommandHandler>> {
    Ok(Box::new(UndoCommand))
}

fn redo(_args: &CommandArgs) -> CommandResult<Box<dyn CommandHandler>> {
    Ok(Box::new(RedoCommand))
}

fn builtin_factory(command: Commands) -> CommandHandlerFactory {
    let create: CreateHandler = match command {
        Commands::CreateBlock => create_block,
        Commands::DeleteBlock => delete_block,
        Commands::MoveBlock => move_block,
        Commands::IncrementNumber => increment_number,
        Commands::ConnectBlocks => connect_blocks,
        Commands::DisconnectBlocks => disconnect_blocks,
        Commands::Save => save,
        Commands::SaveAs => save_as,
        Commands::Load => load,
        Commands::Undo => undo,
        Commands::Redo => redo,
    };
    CommandHandlerFactory::new(command.as_str(), create)
}

/// Entry point for every mutation of the editor state
///
/// Commands run one at a time, in the order they are issued. Graph commands
/// complete before `execute_command` returns; Save/Load hand back a pending
/// deferred whose result the caller applies with `EditorState::complete`.
#[derive(Debug, Default)]
pub struct CommandManager {
    handlers: ResourceManager<CommandHandlerFactory>,
}

impl CommandManager {
    /// Create a manager with no handlers registered
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager with every built-in command registered
    pub fn with_default_handlers() -> Self {
        let mut manager = Self::new();
        for command in Commands::ALL {
            // Built-in names are distinct
            if let Err(e) = manager.register(builtin_factory(command)) {
                log::warn!("Skipping built-in command {}: {}", command, e);
            }
        }
        manager
    }

    /// Register a handler factory; names must be unique
    pub fn register(&mut self, factory: CommandHandlerFactory) -> ResourceResult<()> {
        let name = factory.name().to_string();
        self.handlers.add_resource(factory)?;
        log::info!("Registered command handler {}", name);
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.handlers.contains(name)
    }

    pub fn command_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.handlers.keys().collect();
        names.sort_unstable();
        names
    }

    /// Execute a command by name
    ///
    /// Undoable graph mutations are recorded on the history, which clears
    /// pending redo entries. Pending graph events are flushed to observers.
    pub fn execute_command(
        &mut self,
        name: &str,
        args: CommandArgs,
        state: &mut EditorState,
    ) -> Deferred<CommandOutput> {
        let result = self.run(name, &args, state);
        state.flush_events();

        match result {
            Ok(deferred) => deferred,
            Err(e) => {
                log::warn!("Command {} rejected: {}", name, e);
                Deferred::rejected(e)
            }
        }
    }

    fn run(
        &self,
        name: &str,
        args: &CommandArgs,
        state: &mut EditorState,
    ) -> CommandResult<Deferred<CommandOutput>> {
        let factory = self.handlers.get_resource(name).map_err(|e| match e {
            ResourceError::NotFound(_) => CommandError::UnknownCommand(name.to_string()),
            other => CommandError::Resource(other),
        })?;
        let handler = factory.create(args)?;
        let description = handler.description();

        match handler.execute(state)? {
            Execution::Complete(output) => {
                log::debug!("{}: {:?}", description, output);
                Ok(Deferred::resolved(output))
            }
            Execution::Recorded(output, operation) => {
                log::debug!("{}: {:?}", description, output);
                state.history.record(operation);
                Ok(Deferred::resolved(output))
            }
            Execution::Deferred(deferred) => {
                log::debug!("{}: in flight", description);
                Ok(deferred)
            }
        }
    }
}
