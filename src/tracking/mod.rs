pub mod chain_sync;
pub mod index_sync;
pub mod scheduler;

pub use chain_sync::ChainStateSync;
pub use index_sync::IndexSync;
pub use scheduler::DealTracker;
