// Composition persistence - flattening the block graph into a save file,
// rebuilding it, and moving the payload through a storage transport

pub mod serialization;
pub mod transport;
pub mod types;

pub use serialization::Serializer;
pub use transport::{FileTransport, MemoryTransport, PersistenceTransport};
pub use types::{BlockRecord, CompositionDocument, FormatVersion, SaveFile, ViewState};

use thiserror::Error;

/// Persistence error types
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Deserialization error: {0}")]
    Deserialization(String),

    #[error("Unsupported composition format {found} (expected {expected})")]
    UnsupportedVersion {
        found: FormatVersion,
        expected: FormatVersion,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Composition not found: {0}")]
    CompositionNotFound(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PersistenceError {
    /// Malformed or incompatible input, as opposed to a storage failure
    pub fn is_deserialization(&self) -> bool {
        matches!(
            self,
            PersistenceError::Deserialization(_) | PersistenceError::UnsupportedVersion { .. }
        )
    }
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
