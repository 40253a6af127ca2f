// Save / SaveAs / Load command handlers
//
// Not undoable. Storage I/O runs on a worker thread and the result comes
// back through a Deferred; installing a loaded composition and adopting a
// saved id happen on the control thread (see `EditorState::complete`).

use crate::command::deferred::Deferred;
use crate::command::state::EditorState;
use crate::command::trait_def::{CommandHandler, CommandOutput, CommandResult, Execution};
use crate::persistence::{PersistenceTransport, Serializer};
use std::sync::Arc;
use uuid::Uuid;

fn new_composition_id() -> String {
    Uuid::new_v4().to_string()
}

fn spawn_save(
    transport: Arc<dyn PersistenceTransport>,
    composition_id: String,
    data: String,
) -> Deferred<CommandOutput> {
    Deferred::spawn("composition-save", move || {
        if let Err(e) = transport.save(&composition_id, &data) {
            log::error!("Failed to save composition {}: {}", composition_id, e);
            return Err(e.into());
        }
        log::info!("Saved composition {} ({} bytes)", composition_id, data.len());
        Ok(CommandOutput::Saved { composition_id })
    })
}

/// Save under the current composition id, or a fresh one if never saved
pub struct SaveCommand;

impl CommandHandler for SaveCommand {
    fn execute(self: Box<Self>, state: &mut EditorState) -> CommandResult<Execution> {
        let composition_id = state
            .composition_id
            .clone()
            .unwrap_or_else(new_composition_id);
        let data = Serializer::serialize(&state.graph, state.view)?;
        Ok(Execution::Deferred(spawn_save(
            state.transport(),
            composition_id,
            data,
        )))
    }

    fn description(&self) -> String {
        "Save composition".to_string()
    }
}

/// Save under a new id; the editor adopts it only once the save succeeded
pub struct SaveAsCommand {
    composition_id: Option<String>,
}

impl SaveAsCommand {
    pub fn new(composition_id: Option<String>) -> Self {
        Self { composition_id }
    }
}

impl CommandHandler for SaveAsCommand {
    fn execute(self: Box<Self>, state: &mut EditorState) -> CommandResult<Execution> {
        let composition_id = self.composition_id.unwrap_or_else(new_composition_id);
        let data = Serializer::serialize(&state.graph, state.view)?;
        Ok(Execution::Deferred(spawn_save(
            state.transport(),
            composition_id,
            data,
        )))
    }

    fn description(&self) -> String {
        "Save composition as".to_string()
    }
}

/// Fetch and rebuild a composition
///
/// The rebuilt save file is all-or-nothing: a malformed payload rejects the
/// deferred and the live composition is left untouched.
pub struct LoadCommand {
    composition_id: String,
}

impl LoadCommand {
    pub fn new(composition_id: impl Into<String>) -> Self {
        Self {
            composition_id: composition_id.into(),
        }
    }
}

impl CommandHandler for LoadCommand {
    fn execute(self: Box<Self>, state: &mut EditorState) -> CommandResult<Execution> {
        let transport = state.transport();
        let composition_id = self.composition_id;

        Ok(Execution::Deferred(Deferred::spawn(
            "composition-load",
            move || {
                let loaded = transport
                    .load(&composition_id)
                    .and_then(|data| Serializer::deserialize(&data));
                match loaded {
                    Ok(save_file) => {
                        log::info!(
                            "Loaded composition {} ({} blocks)",
                            composition_id,
                            save_file.composition.len()
                        );
                        Ok(CommandOutput::Loaded {
                            composition_id,
                            save_file: Box::new(save_file),
                        })
                    }
                    Err(e) => {
                        log::error!("Failed to load composition {}: {}", composition_id, e);
                        Err(e.into())
                    }
                }
            },
        )))
    }

    fn description(&self) -> String {
        format!("Load composition {}", self.composition_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::types::{Block, BlockKind, Point};
    use crate::command::trait_def::CommandError;
    use crate::config::EditorConfig;
    use crate::persistence::{MemoryTransport, PersistenceError};

    fn create_test_state(transport: Arc<MemoryTransport>) -> EditorState {
        EditorState::new(&EditorConfig::default(), transport)
    }

    fn wait(execution: Execution) -> CommandResult<CommandOutput> {
        match execution {
            Execution::Deferred(deferred) => deferred.wait(),
            _ => panic!("persistence commands are deferred"),
        }
    }

    #[test]
    fn test_save_then_load() {
        let transport = Arc::new(MemoryTransport::new());
        let mut state = create_test_state(Arc::clone(&transport));
        state
            .graph
            .insert(Block::new(BlockKind::ToneSource, Point::new(1.0, 2.0)))
            .unwrap();
        state.view.zoom_level = 1.5;

        let saved = wait(Box::new(SaveAsCommand::new(Some("song".into()))).execute(&mut state).unwrap());
        let saved = state.complete(saved.unwrap());
        assert!(matches!(saved, CommandOutput::Saved { ref composition_id } if composition_id == "song"));
        assert!(transport.contains("song"));

        let mut other = create_test_state(Arc::clone(&transport));
        let loaded = wait(Box::new(LoadCommand::new("song")).execute(&mut other).unwrap()).unwrap();
        other.complete(loaded);

        assert!(other.graph.same_topology(&state.graph));
        assert_eq!(other.view.zoom_level, 1.5);
        assert_eq!(other.composition_id.as_deref(), Some("song"));
    }

    #[test]
    fn test_save_without_id_generates_one() {
        let transport = Arc::new(MemoryTransport::new());
        let mut state = create_test_state(Arc::clone(&transport));

        let output = wait(Box::new(SaveCommand).execute(&mut state).unwrap()).unwrap();
        state.complete(output);

        let id = state.composition_id.clone().unwrap();
        assert!(transport.contains(&id));
    }

    #[test]
    fn test_load_failures_are_persistence_errors() {
        let transport = Arc::new(MemoryTransport::new());
        transport.save("broken", "{ not json").unwrap();
        let mut state = create_test_state(Arc::clone(&transport));

        let missing = wait(Box::new(LoadCommand::new("missing")).execute(&mut state).unwrap());
        assert!(matches!(
            missing,
            Err(CommandError::Persistence(PersistenceError::CompositionNotFound(_)))
        ));

        let broken = wait(Box::new(LoadCommand::new("broken")).execute(&mut state).unwrap());
        match broken {
            Err(CommandError::Persistence(e)) => assert!(e.is_deserialization()),
            other => panic!("unexpected result {:?}", other.map(|_| ())),
        }
    }
}
