// EditorState - everything commands can touch
//
// Owned by the control thread. The block graph, the history and the pools
// are only mutated through command handlers; changes are announced to
// observers through the event channel.

use crate::blocks::graph::BlockGraph;
use crate::command::operation::OperationManager;
use crate::command::trait_def::CommandOutput;
use crate::config::EditorConfig;
use crate::messaging::channels::EventProducer;
use crate::messaging::event::GraphEvent;
use crate::persistence::{PersistenceTransport, SaveFile, ViewState};
use crate::pooled::{Particle, PooledOscillator};
use crate::resource::PooledFactoryResource;
use ringbuf::traits::Producer;
use std::sync::Arc;

pub struct EditorState {
    pub graph: BlockGraph,

    pub history: OperationManager,

    /// Transient visual effects
    pub particles: PooledFactoryResource<Particle>,

    /// Preview voices
    pub oscillators: PooledFactoryResource<PooledOscillator>,

    /// Id of the composition being edited, once saved or loaded
    pub composition_id: Option<String>,

    /// Zoom level and position, saved with the composition
    pub view: ViewState,

    transport: Arc<dyn PersistenceTransport>,

    /// Change notifications to observers outside the core
    events: Option<EventProducer>,

    dropped_events: usize,
}

impl EditorState {
    pub fn new(config: &EditorConfig, transport: Arc<dyn PersistenceTransport>) -> Self {
        Self {
            graph: BlockGraph::new(),
            history: OperationManager::with_capacity(config.max_operations),
            particles: PooledFactoryResource::new(
                config.particle_pool.min,
                config.particle_pool.max,
                Particle::new,
            ),
            oscillators: PooledFactoryResource::new(
                config.oscillator_pool.min,
                config.oscillator_pool.max,
                PooledOscillator::new,
            ),
            composition_id: None,
            view: ViewState::default(),
            transport,
            events: None,
            dropped_events: 0,
        }
    }

    pub fn with_events(mut self, producer: EventProducer) -> Self {
        self.events = Some(producer);
        self
    }

    pub fn transport(&self) -> Arc<dyn PersistenceTransport> {
        Arc::clone(&self.transport)
    }

    /// Forward pending graph events to the event channel
    ///
    /// Events that do not fit are dropped; returns how many were delivered.
    pub fn flush_events(&mut self) -> usize {
        let events = self.graph.take_events();
        let Some(producer) = self.events.as_mut() else {
            return 0;
        };

        let mut delivered = 0;
        for event in events {
            if producer.try_push(event).is_ok() {
                delivered += 1;
            } else {
                self.dropped_events += 1;
                log::warn!("Event channel full, dropping {:?}", event);
            }
        }
        delivered
    }

    pub fn dropped_events(&self) -> usize {
        self.dropped_events
    }

    /// Replace the composition with a loaded one
    ///
    /// History is cleared: operations recorded against the previous
    /// composition do not apply to this one.
    pub fn install(&mut self, composition_id: String, save_file: SaveFile) {
        self.graph = save_file.composition;
        self.view = save_file.view;
        self.history.clear();
        log::info!(
            "Installed composition {} ({} blocks)",
            composition_id,
            self.graph.len()
        );
        self.composition_id = Some(composition_id);
        self.graph.push_event(GraphEvent::CompositionReplaced);
    }

    /// Start over with an empty composition
    pub fn reset_composition(&mut self) {
        self.graph = BlockGraph::new();
        self.view = ViewState::default();
        self.history.clear();
        self.composition_id = None;
        self.graph.push_event(GraphEvent::CompositionReplaced);
    }

    /// Apply a resolved persistence result on the control thread
    pub fn complete(&mut self, output: CommandOutput) -> CommandOutput {
        match output {
            CommandOutput::Loaded {
                composition_id,
                save_file,
            } => {
                self.install(composition_id.clone(), *save_file);
                CommandOutput::Installed { composition_id }
            }
            CommandOutput::Saved { composition_id } => {
                self.composition_id = Some(composition_id.clone());
                CommandOutput::Saved { composition_id }
            }
            other => other,
        }
    }
}

impl std::fmt::Debug for EditorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditorState")
            .field("blocks", &self.graph.len())
            .field("history", &self.history)
            .field("composition_id", &self.composition_id)
            .field("view", &self.view)
            .finish()
    }
}
