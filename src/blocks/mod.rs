// Block graph - the composition's nodes and their relations
//
// Sources feed Effects, Modifiers drive Effects, and Sources (the modifiable
// blocks) hold an observable collection of active Modifiers. All relations
// are identity lists kept mutual by `BlockGraph`.

pub mod graph;
pub mod modifiable;
pub mod observable;
pub mod types;

pub use graph::{BlockGraph, Journal, RemovedBlock};
pub use modifiable::Modifiable;
pub use observable::{CollectionAction, CollectionChanged, ObservableCollection};
pub use types::{Block, BlockId, BlockKind, BlockLinks, BlockRole, Params, Point, Size};

use thiserror::Error;

/// Block graph errors
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GraphError {
    #[error("Block not found: {0}")]
    BlockNotFound(BlockId),

    #[error("Block {id} is a {actual}, expected a {expected}")]
    RoleMismatch {
        id: BlockId,
        expected: BlockRole,
        actual: BlockRole,
    },

    #[error("Block already in the graph: {0}")]
    DuplicateBlock(BlockId),

    #[error("Index {index} out of range for {len} blocks")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Non-finite {field} for block {id}")]
    NonFinite { id: BlockId, field: String },

    #[error("Link from {from} to {to} is not mutual")]
    AsymmetricLink { from: BlockId, to: BlockId },
}

pub type GraphResult<T> = Result<T, GraphError>;
