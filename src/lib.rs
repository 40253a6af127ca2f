// Blocks Sketch - Library exports for the demo, tests and benchmarks

pub mod app;
pub mod blocks;
pub mod command;
pub mod config;
pub mod messaging;
pub mod persistence;
pub mod pooled;
pub mod resource;

// Re-export commonly used types for convenience
pub use app::{App, Renderer, SignalRouter};
pub use blocks::{Block, BlockGraph, BlockId, BlockKind, BlockRole, GraphError, Point};
pub use command::{
    CommandArgs, CommandError, CommandManager, CommandOutput, Commands, Deferred, EditorState,
    OperationManager,
};
pub use config::{EditorConfig, PoolConfig};
pub use messaging::channels::{create_event_channel, create_notification_channel};
pub use messaging::event::GraphEvent;
pub use persistence::{FileTransport, MemoryTransport, PersistenceTransport, SaveFile, Serializer};
pub use pooled::{Particle, PooledOscillator, WaveformType};
pub use resource::{PoolHandle, Poolable, PooledFactoryResource, ResourceError, ResourceManager};
