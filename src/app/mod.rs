// App - editor shell around the command core
//
// Owns the command manager, the editor state and the channels. The host
// calls `update` and `draw` once per animation tick; persistence results are
// picked up in `update`, on the same thread that owns the graph. At most one
// Save/Load is in flight; later ones wait in issuance order.

pub mod trait_def;

pub use trait_def::{Renderer, SignalRouter};

use crate::blocks::graph::BlockGraph;
use crate::blocks::types::{Block, BlockId, Point};
use crate::blocks::GraphResult;
use crate::command::{
    CommandArgs, CommandManager, CommandOutput, CommandResult, Commands, Deferred, EditorState,
};
use crate::config::{ConfigError, EditorConfig};
use crate::messaging::channels::{
    create_event_channel, create_notification_channel, EventConsumer, NotificationConsumer,
    NotificationProducer,
};
use crate::messaging::notification::{Notification, NotificationCategory, NotificationLevel};
use crate::persistence::{
    FileTransport, PersistenceResult, PersistenceTransport, SaveFile, Serializer,
};
use crate::pooled::WaveformType;
use crate::resource::{PoolHandle, ResourceError};
use ringbuf::traits::{Consumer, Producer};
use std::collections::{HashSet, VecDeque};
use std::path::PathBuf;
use std::sync::Arc;

const MAX_NOTIFICATIONS: usize = 10;

/// A Save/Load whose result has not been applied yet
struct PendingCommand {
    command: Commands,
    deferred: Deferred<CommandOutput>,
}

pub struct App {
    config: EditorConfig,
    commands: CommandManager,
    state: EditorState,
    pending: Option<PendingCommand>,
    queued: VecDeque<(Commands, CommandArgs)>,
    // Notification system
    notification_tx: NotificationProducer,
    notification_rx: NotificationConsumer,
    notification_queue: VecDeque<Notification>,
    event_rx: Option<EventConsumer>,
    /// Blocks the renderer has already initialised
    initialized: HashSet<BlockId>,
}

impl App {
    pub fn new(
        config: EditorConfig,
        transport: Arc<dyn PersistenceTransport>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let (event_tx, event_rx) = create_event_channel(config.event_channel_capacity);
        let (notification_tx, notification_rx) =
            create_notification_channel(config.notification_channel_capacity);
        let state = EditorState::new(&config, transport).with_events(event_tx);

        Ok(Self {
            config,
            commands: CommandManager::with_default_handlers(),
            state,
            pending: None,
            queued: VecDeque::new(),
            notification_tx,
            notification_rx,
            notification_queue: VecDeque::with_capacity(MAX_NOTIFICATIONS),
            event_rx: Some(event_rx),
            initialized: HashSet::new(),
        })
    }

    /// App storing compositions as files under the configured directory
    pub fn with_file_storage(config: EditorConfig) -> Result<Self, ConfigError> {
        let root = config
            .storage_dir
            .clone()
            .or_else(FileTransport::default_root)
            .unwrap_or_else(|| PathBuf::from("compositions"));
        Self::new(config, Arc::new(FileTransport::new(root)))
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn graph(&self) -> &BlockGraph {
        &self.state.graph
    }

    /// Hand the change-notification stream to an observer (once)
    pub fn take_event_consumer(&mut self) -> Option<EventConsumer> {
        self.event_rx.take()
    }

    // ---- Commands ----

    /// Execute a command; the sole mutation entry point
    pub fn execute(&mut self, name: &str, args: CommandArgs) -> Deferred<CommandOutput> {
        self.commands.execute_command(name, args, &mut self.state)
    }

    /// Execute a graph command and report failures to the message panel
    pub fn run(&mut self, name: &str, args: CommandArgs) -> Option<CommandOutput> {
        match self.execute(name, args).wait() {
            Ok(output) => Some(output),
            Err(e) => {
                self.notify(Notification::command_failed(name, &e));
                None
            }
        }
    }

    fn submit(&mut self, command: Commands, args: CommandArgs) {
        if self.pending.is_some() {
            log::debug!("{} queued behind a running save/load", command);
            self.queued.push_back((command, args));
        } else {
            self.start(command, args);
        }
    }

    fn start(&mut self, command: Commands, args: CommandArgs) {
        let deferred = self.execute(command.as_str(), args);
        self.pending = Some(PendingCommand { command, deferred });
    }

    fn start_next(&mut self) {
        if self.pending.is_none()
            && let Some((command, args)) = self.queued.pop_front()
        {
            self.start(command, args);
        }
    }

    /// Start loading a composition, or start empty when no id is given
    ///
    /// An unreadable composition leaves an empty one behind; a storage
    /// failure keeps the current composition. Both post an error message.
    pub fn load_composition(&mut self, composition_id: Option<&str>) {
        match composition_id {
            Some(id) => self.submit(Commands::Load, CommandArgs::new().with_text(id)),
            None => {
                self.state.reset_composition();
                self.state.flush_events();
            }
        }
    }

    pub fn save(&mut self) {
        self.submit(Commands::Save, CommandArgs::new());
    }

    /// Save under a new id, adopted once the save succeeded
    pub fn save_as(&mut self, composition_id: Option<&str>) {
        let args = match composition_id {
            Some(id) => CommandArgs::new().with_text(id),
            None => CommandArgs::new(),
        };
        self.submit(Commands::SaveAs, args);
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some() || !self.queued.is_empty()
    }

    /// Block until every running and queued Save/Load has been applied
    pub fn wait_pending(&mut self) {
        while let Some(pending) = self.pending.take() {
            let result = pending.deferred.wait();
            self.apply(pending.command, result);
            self.start_next();
        }
    }

    /// Per-tick work: apply finished persistence results, advance particles
    pub fn update(&mut self, dt: f32) {
        while let Some(pending) = self.pending.as_mut() {
            let command = pending.command;
            let Some(result) = pending.deferred.try_take() else {
                break;
            };
            self.pending = None;
            self.apply(command, result);
            self.start_next();
        }

        for handle in self.state.particles.in_use_handles() {
            let alive = self
                .state
                .particles
                .get_mut(handle)
                .map(|p| p.update(dt))
                .unwrap_or(false);
            if !alive {
                let _ = self.state.particles.release(handle);
            }
        }
    }

    fn apply(&mut self, command: Commands, result: CommandResult<CommandOutput>) {
        match result {
            Ok(output) => match self.state.complete(output) {
                CommandOutput::Installed { composition_id } => {
                    self.initialized.clear();
                    self.notify(Notification::info(
                        NotificationCategory::Persistence,
                        format!("Loaded composition {}", composition_id),
                    ));
                }
                CommandOutput::Saved { composition_id } => {
                    self.notify(Notification::info(
                        NotificationCategory::Persistence,
                        format!("Saved composition {}", composition_id),
                    ));
                }
                _ => {}
            },
            Err(e) => {
                if command == Commands::Load && e.is_deserialization() {
                    self.state.reset_composition();
                    self.initialized.clear();
                }
                let mut notification = Notification::command_failed(command.as_str(), &e);
                notification.level = NotificationLevel::Error;
                self.notify(notification);
            }
        }
        self.state.flush_events();
    }

    // ---- Rendering and signal path ----

    /// Draw every block, initialising blocks seen for the first time
    pub fn draw(&mut self, renderer: &mut dyn Renderer) {
        let graph = &self.state.graph;
        self.initialized.retain(|id| graph.contains(*id));

        for block in graph.blocks() {
            if self.initialized.insert(block.id()) {
                renderer.init(block, &self.state.view);
            }
            renderer.draw(block, &self.state.view);
        }
    }

    /// Re-establish the live connections of every source
    pub fn refresh_blocks(&self, router: &mut dyn SignalRouter) -> GraphResult<()> {
        let sources: Vec<BlockId> = self.state.graph.sources().map(|b| b.id()).collect();
        for source in sources {
            self.state.graph.refresh(source, router)?;
        }
        Ok(())
    }

    pub fn sources(&self) -> Vec<&Block> {
        self.state.graph.sources().collect()
    }

    pub fn effects(&self) -> Vec<&Block> {
        self.state.graph.effects().collect()
    }

    pub fn block_at(&self, point: Point) -> Option<&Block> {
        self.state.graph.block_at(point)
    }

    // ---- Persistence helpers ----

    pub fn serialize(&self) -> PersistenceResult<String> {
        Serializer::serialize(&self.state.graph, self.state.view)
    }

    pub fn deserialize(&self, json: &str) -> PersistenceResult<SaveFile> {
        Serializer::deserialize(json)
    }

    // ---- Messages ----

    /// Post a message to the message panel
    pub fn message(&mut self, text: impl Into<String>) {
        self.notify(Notification::info(NotificationCategory::Generic, text.into()));
    }

    fn notify(&mut self, notification: Notification) {
        if let Err(dropped) = self.notification_tx.try_push(notification) {
            log::warn!("Notification channel full, dropping: {}", dropped.message);
        }
    }

    /// Drain new notifications into the queue and return the latest ones
    pub fn notifications(&mut self) -> &VecDeque<Notification> {
        while let Some(notification) = self.notification_rx.try_pop() {
            if self.notification_queue.len() >= MAX_NOTIFICATIONS {
                self.notification_queue.pop_front();
            }
            self.notification_queue.push_back(notification);
        }
        &self.notification_queue
    }

    // ---- Pooled objects ----

    /// Spawn a particle; skipped (None) when the pool is exhausted
    pub fn emit_particle(&mut self, position: Point, velocity: Point, life: f32) -> Option<PoolHandle> {
        let handle = pool_or_skip(self.state.particles.acquire(), "particle")?;
        if let Some(particle) = self.state.particles.get_mut(handle) {
            particle.spawn(position, velocity, life);
        }
        Some(handle)
    }

    pub fn live_particles(&self) -> usize {
        self.state.particles.in_use()
    }

    /// Start a preview voice; skipped (None) when the pool is exhausted
    pub fn start_voice(&mut self, frequency: f32, waveform: WaveformType) -> Option<PoolHandle> {
        let handle = pool_or_skip(self.state.oscillators.acquire(), "oscillator")?;
        if let Some(oscillator) = self.state.oscillators.get_mut(handle) {
            oscillator.start(frequency, waveform);
        }
        Some(handle)
    }

    /// Stop a voice and return it to the pool; false for an unknown handle
    pub fn stop_voice(&mut self, handle: PoolHandle) -> bool {
        match self.state.oscillators.release(handle) {
            Ok(()) => true,
            Err(e) => {
                log::debug!("Ignoring stop for voice {:?}: {}", handle, e);
                false
            }
        }
    }

    /// Mix one sample of every playing voice
    pub fn next_voice_sample(&mut self) -> f32 {
        let mut sum = 0.0;
        for handle in self.state.oscillators.in_use_handles() {
            if let Some(oscillator) = self.state.oscillators.get_mut(handle) {
                sum += oscillator.next_sample();
            }
        }
        sum
    }
}

fn pool_or_skip(acquired: Result<PoolHandle, ResourceError>, what: &str) -> Option<PoolHandle> {
    match acquired {
        Ok(handle) => Some(handle),
        Err(e @ ResourceError::PoolExhausted { .. }) => {
            log::warn!("Skipping {} this tick: {}", what, e);
            None
        }
        Err(e) => {
            log::warn!("Unexpected {} pool error: {}", what, e);
            None
        }
    }
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("state", &self.state)
            .field("pending", &self.pending.is_some())
            .field("queued", &self.queued.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::types::BlockKind;
    use crate::config::PoolConfig;
    use crate::messaging::event::GraphEvent;
    use crate::persistence::MemoryTransport;

    #[derive(Default)]
    struct RecordingRenderer {
        inits: Vec<BlockId>,
        draws: usize,
    }

    impl Renderer for RecordingRenderer {
        fn init(&mut self, block: &Block, _view: &crate::persistence::ViewState) {
            self.inits.push(block.id());
        }

        fn draw(&mut self, _block: &Block, _view: &crate::persistence::ViewState) {
            self.draws += 1;
        }
    }

    #[derive(Default)]
    struct RecordingRouter {
        calls: Vec<String>,
    }

    impl SignalRouter for RecordingRouter {
        fn disconnect_all(&mut self, source: &Block) {
            self.calls.push(format!("disconnect {}", source.kind()));
        }

        fn connect(&mut self, source: &Block, effect: &Block) {
            self.calls
                .push(format!("connect {} -> {}", source.kind(), effect.kind()));
        }
    }

    fn create_test_app() -> App {
        App::new(EditorConfig::default(), Arc::new(MemoryTransport::new())).unwrap()
    }

    fn create(app: &mut App, kind: BlockKind, x: f64) -> BlockId {
        let args = CommandArgs::new()
            .with_kind(kind)
            .with_point(Point::new(x, 0.0));
        match app.run("CREATE_BLOCK", args) {
            Some(CommandOutput::Created(id)) => id,
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[test]
    fn test_draw_inits_new_blocks_once() {
        let mut app = create_test_app();
        let mut renderer = RecordingRenderer::default();
        let first = create(&mut app, BlockKind::ToneSource, 0.0);

        app.draw(&mut renderer);
        let second = create(&mut app, BlockKind::Delay, 100.0);
        app.draw(&mut renderer);

        assert_eq!(renderer.inits, vec![first, second]);
        assert_eq!(renderer.draws, 3);
    }

    #[test]
    fn test_refresh_follows_effect_order() {
        let mut app = create_test_app();
        let source = create(&mut app, BlockKind::ToneSource, 0.0);
        let delay = create(&mut app, BlockKind::Delay, 100.0);
        let reverb = create(&mut app, BlockKind::Reverb, 200.0);
        app.run("CONNECT_BLOCKS", CommandArgs::new().with_block(source).with_block(delay));
        app.run("CONNECT_BLOCKS", CommandArgs::new().with_block(reverb).with_block(source));

        let mut router = RecordingRouter::default();
        app.refresh_blocks(&mut router).unwrap();

        assert_eq!(
            router.calls,
            vec![
                "disconnect tone",
                "connect tone -> delay",
                "connect tone -> reverb"
            ]
        );
    }

    #[test]
    fn test_events_reach_observer() {
        let mut app = create_test_app();
        let mut events = app.take_event_consumer().unwrap();
        let id = create(&mut app, BlockKind::Noise, 0.0);

        assert_eq!(events.try_pop(), Some(GraphEvent::BlockAdded(id)));
        assert!(app.take_event_consumer().is_none());
    }

    #[test]
    fn test_failed_command_posts_warning() {
        let mut app = create_test_app();
        assert!(app.run("MOVE_BLOCK", CommandArgs::new()).is_none());

        let notifications = app.notifications();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].level, NotificationLevel::Warning);
    }

    #[test]
    fn test_particles_degrade_and_expire() {
        let mut config = EditorConfig::default();
        config.particle_pool = PoolConfig { min: 1, max: 2 };
        let mut app = App::new(config, Arc::new(MemoryTransport::new())).unwrap();

        let velocity = Point::new(1.0, 0.0);
        assert!(app.emit_particle(Point::default(), velocity, 0.5).is_some());
        assert!(app.emit_particle(Point::default(), velocity, 2.0).is_some());
        assert!(app.emit_particle(Point::default(), velocity, 1.0).is_none());

        app.update(1.0);
        assert_eq!(app.live_particles(), 1);
        assert!(app.emit_particle(Point::default(), velocity, 1.0).is_some());
    }

    #[test]
    fn test_voices() {
        let mut config = EditorConfig::default();
        config.oscillator_pool = PoolConfig { min: 0, max: 1 };
        let mut app = App::new(config, Arc::new(MemoryTransport::new())).unwrap();

        let voice = app.start_voice(440.0, WaveformType::Square).unwrap();
        assert!(app.start_voice(220.0, WaveformType::Sine).is_none());
        assert_ne!(app.next_voice_sample(), 0.0);

        assert!(app.stop_voice(voice));
        assert!(!app.stop_voice(voice));
        assert_eq!(app.next_voice_sample(), 0.0);
    }

    #[test]
    fn test_message() {
        let mut app = create_test_app();
        app.message("Hello");
        assert_eq!(app.notifications()[0].message, "Hello");
    }
}
