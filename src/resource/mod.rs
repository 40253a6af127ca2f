// Resources - keyed registries and pooled factories

pub mod pool;
pub mod registry;

pub use pool::{PoolHandle, PoolStats, Poolable, PooledFactoryResource};
pub use registry::{Resource, ResourceManager};

use thiserror::Error;

/// Resource lookup and pooling errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("Resource already registered: {0}")]
    DuplicateKey(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Pool exhausted: all {max} instances are in use")]
    PoolExhausted { max: usize },

    #[error("Instance does not belong to this pool")]
    ForeignInstance,
}

pub type ResourceResult<T> = Result<T, ResourceError>;
