pub mod descriptor;
pub mod engine;
pub mod error;
pub mod interfaces;
pub mod replicas;
pub mod report;

pub use descriptor::{NodeIdentifier, NodeInfo, RingDescriptor, Token, TokenState};
pub use engine::{RING_KEY, RingConfig, RingEngine};
pub use error::RingError;
pub use interfaces::{QuitSignal, QuitTrigger, TCoordinationWatcher};
pub use replicas::Operation;
pub use report::RingReport;
