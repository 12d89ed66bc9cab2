pub mod file_based;
pub mod memory_based;

pub use file_based::FileCoordinator;
pub use memory_based::MemoryCoordinator;
