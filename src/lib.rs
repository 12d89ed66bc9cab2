pub mod adapters;
pub mod config;
pub mod domains;
pub mod macros;
pub mod observability;

pub use config::{ENV, Environment};

pub mod prelude {
    pub use crate::adapters::coordination::{FileCoordinator, MemoryCoordinator};
    pub use crate::domains::ring::{
        NodeIdentifier, NodeInfo, Operation, RING_KEY, RingConfig, RingDescriptor, RingEngine,
        RingError, RingReport, TCoordinationWatcher, Token, TokenState,
    };
    pub use anyhow;
    pub use bytes;
    pub use tokio;
}
